/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::FtpControlPeer;
use crate::control::FtpControlChannel;
use crate::error::FtpPassiveNegotiationError;
use crate::log_msg;

/// Negotiate the server address of a passive mode data connection.
#[async_trait]
pub trait PassiveModeNegotiator {
    /// Ask the server for a passive address, as reported in its reply.
    async fn negotiate_passive_address(&mut self)
    -> Result<SocketAddr, FtpPassiveNegotiationError>;

    /// IP address of the remote end of the control connection.
    fn control_peer_ip(&self) -> io::Result<IpAddr>;
}

#[async_trait]
impl<T> PassiveModeNegotiator for FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + FtpControlPeer + Unpin + Send,
{
    async fn negotiate_passive_address(
        &mut self,
    ) -> Result<SocketAddr, FtpPassiveNegotiationError> {
        let addr = self.request_pasv_port().await?;
        Ok(addr)
    }

    fn control_peer_ip(&self) -> io::Result<IpAddr> {
        self.get_ref().peer_addr().map(|addr| addr.ip())
    }
}

/// Wraps a [`PassiveModeNegotiator`], optionally replacing the host reported
/// by the server with the peer IP of the control connection.
///
/// This is needed for servers behind NAT that report their private address in
/// the PASV reply. The port reported by the server is always kept.
pub struct PassiveAddressResolver<N> {
    inner: N,
    force_host_address: bool,
}

impl<N> PassiveAddressResolver<N> {
    pub fn new(inner: N) -> Self {
        PassiveAddressResolver {
            inner,
            force_host_address: false,
        }
    }

    pub fn with_force_host_address(inner: N, enable: bool) -> Self {
        PassiveAddressResolver {
            inner,
            force_host_address: enable,
        }
    }

    pub fn set_force_host_address(&mut self, enable: bool) {
        self.force_host_address = enable;
    }

    /// Same as `set_force_host_address(true)`.
    pub fn use_host_address(&mut self) {
        self.set_force_host_address(true);
    }

    #[inline]
    pub fn force_host_address(&self) -> bool {
        self.force_host_address
    }

    #[inline]
    pub fn inner(&self) -> &N {
        &self.inner
    }

    #[inline]
    pub fn inner_mut(&mut self) -> &mut N {
        &mut self.inner
    }

    pub fn into_inner(self) -> N {
        self.inner
    }
}

#[async_trait]
impl<N> PassiveModeNegotiator for PassiveAddressResolver<N>
where
    N: PassiveModeNegotiator + Send,
{
    async fn negotiate_passive_address(
        &mut self,
    ) -> Result<SocketAddr, FtpPassiveNegotiationError> {
        let mut addr = self.inner.negotiate_passive_address().await?;
        if self.force_host_address {
            let ip = self
                .inner
                .control_peer_ip()
                .map_err(FtpPassiveNegotiationError::PeerAddr)?;
            if ip != addr.ip() {
                log_msg!("replace passive host {} with control peer {}", addr.ip(), ip);
                addr.set_ip(ip);
            }
        }
        Ok(addr)
    }

    #[inline]
    fn control_peer_ip(&self) -> io::Result<IpAddr> {
        self.inner.control_peer_ip()
    }
}
