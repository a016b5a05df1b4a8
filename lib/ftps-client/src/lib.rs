/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod config;
pub use config::{FtpClientConfig, FtpControlConfig, FtpTransferConfig};

mod connection;
pub use connection::{FtpConnectionProvider, FtpControlPeer};

mod debug;
pub use debug::{FTP_DEBUG_LOG_LEVEL, FTP_DEBUG_LOG_TARGET};

mod error;
pub use error::*;

mod io;

mod control;
pub use control::FtpCommand;

mod passive;
pub use passive::{PassiveAddressResolver, PassiveModeNegotiator};

mod tls;
pub use tls::{FtpDataProtection, FtpsTlsConnector};

mod transfer;
pub use transfer::{FtpDataStream, FtpLineDataReceiver, FtpTransferType};

mod client;
pub use client::FtpsClient;
