/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::error::Error;

use thiserror::Error;

use super::{FtpCommandError, FtpTlsError};

#[derive(Debug, Error)]
pub enum FtpConnectError<E: Error> {
    #[error("connect io error: {0}")]
    ConnectIoError(E),
    #[error("connect timed out")]
    ConnectTimedOut,
    #[error("greeting timed out")]
    GreetingTimedOut,
    #[error("greeting failed: {0}")]
    GreetingFailed(FtpCommandError),
    #[error("tls negotiation failed: {0}")]
    TlsNegotiationFailed(#[from] FtpTlsError),
    #[error("service not available")]
    ServiceNotAvailable,
}
