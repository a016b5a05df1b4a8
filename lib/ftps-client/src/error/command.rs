/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::FtpReplyReadError;
use crate::control::FtpCommand;

/// Failure of a single command / reply exchange on the control connection.
///
/// Reply codes with the same meaning for every command are folded into the
/// shared variants by [`FtpCommandError::from_reply`].
#[derive(Debug, Error)]
pub enum FtpCommandError {
    #[error("unable to send command: {0}")]
    SendFailed(io::Error),
    #[error("unable to recv reply: {0}")]
    RecvFailed(#[from] FtpReplyReadError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("command {0} refused by server ({1})")]
    Refused(FtpCommand, u16),
    #[error("requested action of {0} not taken ({1})")]
    ActionNotTaken(FtpCommand, u16),
    #[error("unexpected reply code ({0} -> {1})")]
    UnexpectedReplyCode(FtpCommand, u16),
    #[error("invalid reply {1} syntax to command {0}")]
    InvalidReplySyntax(FtpCommand, u16),
}

impl FtpCommandError {
    /// Map a reply code that the caller has no special handling for.
    pub(crate) fn from_reply(cmd: FtpCommand, code: u16) -> Self {
        match code {
            421 => FtpCommandError::ServiceNotAvailable,
            530 => FtpCommandError::NotLoggedIn,
            // syntax error, not implemented, bad sequence
            500..=504 => FtpCommandError::Refused(cmd, code),
            // file busy or missing, no space, need account, bad file name
            450 | 452 | 532 | 550 | 553 => FtpCommandError::ActionNotTaken(cmd, code),
            _ => FtpCommandError::UnexpectedReplyCode(cmd, code),
        }
    }

    /// The reply code which caused this error, if the server sent one.
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            FtpCommandError::SendFailed(_) | FtpCommandError::RecvFailed(_) => None,
            FtpCommandError::ServiceNotAvailable => Some(421),
            FtpCommandError::NotLoggedIn => Some(530),
            FtpCommandError::Refused(_, code)
            | FtpCommandError::ActionNotTaken(_, code)
            | FtpCommandError::UnexpectedReplyCode(_, code)
            | FtpCommandError::InvalidReplySyntax(_, code) => Some(*code),
        }
    }
}
