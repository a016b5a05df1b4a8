/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::net::{TcpSocket, TcpStream};

use ftps_client::FtpConnectionProvider;

#[derive(Default)]
pub(crate) struct LocalConnectionProvider {
    bind_ip: Option<IpAddr>,
}

impl LocalConnectionProvider {
    pub(crate) fn set_bind_ip(&mut self, ip: IpAddr) {
        self.bind_ip = Some(ip);
    }

    fn new_socket_to(&self, peer_ip: IpAddr) -> io::Result<TcpSocket> {
        let socket = match peer_ip {
            IpAddr::V4(_) => TcpSocket::new_v4()?,
            IpAddr::V6(_) => TcpSocket::new_v6()?,
        };
        if let Some(ip) = self.bind_ip {
            socket.bind(SocketAddr::new(ip, 0))?;
        }
        Ok(socket)
    }
}

#[async_trait]
impl FtpConnectionProvider<TcpStream, io::Error> for LocalConnectionProvider {
    async fn new_control_connection(&mut self, host: &str, port: u16) -> io::Result<TcpStream> {
        let mut err = io::Error::new(io::ErrorKind::AddrNotAvailable, "no addr resolved");
        for addr in tokio::net::lookup_host((host, port)).await? {
            if let Some(ip) = self.bind_ip
                && ip.is_ipv4() != addr.is_ipv4()
            {
                continue;
            }
            let socket = self.new_socket_to(addr.ip())?;
            match socket.connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => err = e,
            }
        }

        Err(err)
    }

    async fn new_data_connection(&mut self, server_addr: SocketAddr) -> io::Result<TcpStream> {
        let socket = self.new_socket_to(server_addr.ip())?;
        socket.connect(server_addr).await
    }
}
