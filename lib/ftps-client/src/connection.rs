/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::error::Error;
use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

#[async_trait]
pub trait FtpConnectionProvider<T: AsyncRead + AsyncWrite, E: Error> {
    async fn new_control_connection(&mut self, host: &str, port: u16) -> Result<T, E>;

    /// Open a data connection to exactly `server_addr`.
    async fn new_data_connection(&mut self, server_addr: SocketAddr) -> Result<T, E>;
}

/// Transport level peer address of a control connection.
pub trait FtpControlPeer {
    fn peer_addr(&self) -> io::Result<SocketAddr>;
}

impl FtpControlPeer for TcpStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

impl<T: FtpControlPeer> FtpControlPeer for TlsStream<T> {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.get_ref().0.peer_addr()
    }
}
