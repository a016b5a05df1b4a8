/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod reply;
pub use reply::FtpReplyReadError;

mod command;
pub use command::FtpCommandError;

mod connect;
pub use connect::FtpConnectError;

mod session;
pub use session::{FtpAuthStatus, FtpSessionOpenError};

mod tls;
pub use tls::FtpTlsError;

mod passive;
pub use passive::FtpPassiveNegotiationError;

mod transfer;
pub use transfer::{
    FtpLineDataReadError, FtpTransferError, FtpTransferServerError, FtpTransferSetupError,
    FtpTransferStartError,
};
