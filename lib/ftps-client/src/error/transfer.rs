/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::error::Error;
use std::io;

use thiserror::Error;

use super::{FtpCommandError, FtpPassiveNegotiationError, FtpReplyReadError, FtpTlsError};
use crate::control::FtpCommand;

/// Failure to prepare the data connection of a transfer.
#[derive(Debug, Error)]
pub enum FtpTransferSetupError<E: Error> {
    #[error("transfer type setup failed: {0}")]
    TransferTypeFailed(FtpCommandError),
    #[error("passive negotiation failed: {0}")]
    PassiveNegotiationFailed(#[from] FtpPassiveNegotiationError),
    #[error("data connection io error: {0}")]
    ConnectIoError(E),
    #[error("data connection timed out")]
    ConnectTimedOut,
    #[error("data tls setup failed: {0}")]
    TlsFailed(#[from] FtpTlsError),
}

/// Failure to start a `LIST`, `NLST`, `RETR` or `STOR` transfer.
#[derive(Debug, Error)]
pub enum FtpTransferStartError<E: Error> {
    #[error("data transfer setup failed: {0}")]
    Setup(FtpTransferSetupError<E>),
    #[error("transfer command failed: {0}")]
    Command(#[from] FtpCommandError),
}

impl<E: Error> From<FtpTransferSetupError<E>> for FtpTransferStartError<E> {
    fn from(e: FtpTransferSetupError<E>) -> Self {
        FtpTransferStartError::Setup(e)
    }
}

impl<E: Error> FtpTransferStartError<E> {
    /// The server refused the transfer itself, for example because the file
    /// does not exist or the name is not allowed.
    pub fn is_refused_by_server(&self) -> bool {
        matches!(
            self,
            FtpTransferStartError::Command(
                FtpCommandError::ActionNotTaken(..) | FtpCommandError::Refused(..)
            )
        )
    }
}

/// The server reported a failure in the end reply of a transfer.
#[derive(Debug, Error)]
pub enum FtpTransferServerError {
    #[error("recv end reply failed: {0}")]
    RecvFailed(#[from] FtpReplyReadError),
    #[error("{0} data connection failed on server side ({1})")]
    DataConnectionFailed(FtpCommand, u16),
    #[error("{0} aborted by server ({1})")]
    Aborted(FtpCommand, u16),
    #[error("unexpected end reply code ({0} -> {1})")]
    UnexpectedEndReplyCode(FtpCommand, u16),
}

impl FtpTransferServerError {
    pub(crate) fn from_end_reply(cmd: FtpCommand, code: u16) -> Self {
        match code {
            // can not open, closed while transferring
            425 | 426 => FtpTransferServerError::DataConnectionFailed(cmd, code),
            // restart marker, local error, page type unknown, storage exceeded
            110 | 451 | 551 | 552 => FtpTransferServerError::Aborted(cmd, code),
            _ => FtpTransferServerError::UnexpectedEndReplyCode(cmd, code),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpLineDataReadError {
    #[error("read failed: {0}")]
    ReadFailed(#[from] io::Error),
    #[error("line {0} is too long")]
    LineTooLong(usize),
    #[error("unsupported encoding")]
    UnsupportedEncoding,
    #[error("more than {0} lines")]
    TooManyLines(usize),
    #[error("aborted by callback")]
    AbortedByCallback,
}

/// Failure after a transfer has been started.
#[derive(Debug, Error)]
pub enum FtpTransferError {
    #[error("server reported error: {0}")]
    ServerReported(#[from] FtpTransferServerError),
    #[error("timed out waiting for the end reply")]
    EndReplyTimedOut,
    #[error("timed out waiting for all data")]
    DataTimedOut,
    #[error("listing read failed: {0}")]
    LineData(#[from] FtpLineDataReadError),
    #[error("data connection io failed: {0}")]
    DataIo(io::Error),
    #[error("local io failed: {0}")]
    LocalIo(io::Error),
}
