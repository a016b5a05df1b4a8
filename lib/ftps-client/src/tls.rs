/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::error::FtpTlsError;

/// Data channel protection level, as set by the `PROT` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpDataProtection {
    Clear,
    Private,
}

impl FtpDataProtection {
    pub fn as_char(&self) -> char {
        match self {
            FtpDataProtection::Clear => 'C',
            FtpDataProtection::Private => 'P',
        }
    }
}

impl fmt::Display for FtpDataProtection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// TLS connector shared by the control connection and all protected data
/// connections of a session, so data connections may resume the control
/// connection's TLS session.
#[derive(Clone)]
pub struct FtpsTlsConnector {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl FtpsTlsConnector {
    pub fn new(config: Arc<ClientConfig>, server_name: ServerName<'static>) -> Self {
        FtpsTlsConnector {
            connector: TlsConnector::from(config),
            server_name,
        }
    }

    /// Build a client config with the ring crypto provider and the given trust anchors.
    pub fn build_client_config(roots: RootCertStore) -> Result<ClientConfig, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(config)
    }

    #[inline]
    pub fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }

    pub(crate) async fn handshake<S>(
        &self,
        stream: S,
        timeout: Duration,
    ) -> Result<TlsStream<S>, FtpTlsError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match tokio::time::timeout(
            timeout,
            self.connector.connect(self.server_name.clone(), stream),
        )
        .await
        {
            Ok(Ok(tls_stream)) => Ok(tls_stream),
            Ok(Err(e)) => Err(FtpTlsError::HandshakeFailed(e)),
            Err(_) => Err(FtpTlsError::HandshakeTimedOut),
        }
    }
}
