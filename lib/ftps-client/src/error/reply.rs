/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

/// Failure to read one complete reply from the control connection.
#[derive(Debug, Error)]
pub enum FtpReplyReadError {
    #[error("control read failed: {0}")]
    ReadFailed(#[from] io::Error),
    #[error("control connection closed by server")]
    ConnectionClosed,
    #[error("reply line exceeds {0} bytes")]
    LineTooLong(usize),
    #[error("malformed reply line")]
    MalformedLine,
    #[error("reply code {0} out of range")]
    InvalidReplyCode(u16),
    #[error("reply text is not valid utf-8")]
    NotUtf8,
    #[error("multi-line reply exceeds {0} lines")]
    TooManyLines(usize),
    #[error("no reply to {0} in time")]
    TimedOut(&'static str),
}

impl FtpReplyReadError {
    /// The control connection is no longer usable after this error.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            FtpReplyReadError::ReadFailed(_)
                | FtpReplyReadError::ConnectionClosed
                | FtpReplyReadError::TimedOut(_)
        )
    }
}
