/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::FtpCommandError;

/// Failure of a passive address negotiation.
///
/// Both variants carry the underlying error as it was reported.
#[derive(Debug, Error)]
pub enum FtpPassiveNegotiationError {
    #[error("passive command failed: {0}")]
    Command(#[from] FtpCommandError),
    #[error("unable to get control connection peer address: {0:?}")]
    PeerAddr(io::Error),
}
