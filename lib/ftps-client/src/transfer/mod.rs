/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod line;
pub(crate) use line::FtpLineDataTransfer;
pub use line::FtpLineDataReceiver;

mod stream;
pub use stream::FtpDataStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpTransferType {
    Ascii,
    Image,
}
