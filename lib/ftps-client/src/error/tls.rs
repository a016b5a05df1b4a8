/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::FtpCommandError;

#[derive(Debug, Error)]
pub enum FtpTlsError {
    #[error("auth command failed: {0}")]
    AuthCommandFailed(FtpCommandError),
    #[error("tls is not supported by server")]
    NotSupportedByServer,
    #[error("protection command failed: {0}")]
    ProtectionCommandFailed(FtpCommandError),
    #[error("protection level {0} is not accepted by server")]
    ProtectionLevelRejected(char),
    #[error("tls handshake failed: {0:?}")]
    HandshakeFailed(io::Error),
    #[error("tls handshake timed out")]
    HandshakeTimedOut,
}
