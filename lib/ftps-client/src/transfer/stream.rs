/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_rustls::client::TlsStream;

/// A data connection, wrapped in TLS if the protection level is private.
pub enum FtpDataStream<S> {
    Clear(S),
    Protected(Box<TlsStream<S>>),
}

impl<S> FtpDataStream<S> {
    pub fn is_protected(&self) -> bool {
        matches!(self, FtpDataStream::Protected(_))
    }
}

impl<S> AsyncRead for FtpDataStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            FtpDataStream::Clear(s) => Pin::new(s).poll_read(cx, buf),
            FtpDataStream::Protected(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl<S> AsyncWrite for FtpDataStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            FtpDataStream::Clear(s) => Pin::new(s).poll_write(cx, buf),
            FtpDataStream::Protected(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            FtpDataStream::Clear(s) => Pin::new(s).poll_flush(cx),
            FtpDataStream::Protected(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            FtpDataStream::Clear(s) => Pin::new(s).poll_shutdown(cx),
            FtpDataStream::Protected(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
