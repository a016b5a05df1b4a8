/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use rustls::RootCertStore;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, ServerName};

use ftps_client::FtpsTlsConnector;

fn load_ca_cert_file(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow!("failed to read ca cert file {}: {e}", path.display()))?;
    let mut certs = Vec::new();
    for (i, r) in CertificateDer::pem_slice_iter(&bytes).enumerate() {
        let cert = r.map_err(|e| anyhow!("invalid certificate #{i}: {e:?}"))?;
        certs.push(cert);
    }
    if certs.is_empty() {
        Err(anyhow!(
            "no valid certificate found in file {}",
            path.display()
        ))
    } else {
        Ok(certs)
    }
}

fn load_root_certs(ca_cert_files: &[PathBuf]) -> anyhow::Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    if ca_cert_files.is_empty() {
        let certs = rustls_native_certs::load_native_certs()
            .map_err(|e| anyhow!("failed to load native ca certs: {e}"))?;
        let (added, ignored) = roots.add_parsable_certificates(certs);
        log::debug!("loaded {added} native ca certs, {ignored} ignored");
        if added == 0 {
            return Err(anyhow!("no usable native ca cert found"));
        }
    } else {
        for path in ca_cert_files {
            for cert in load_ca_cert_file(path)? {
                roots
                    .add(cert)
                    .context(format!("unusable ca cert in file {}", path.display()))?;
            }
        }
    }
    Ok(roots)
}

pub(crate) fn build_connector(
    tls_name: &str,
    ca_cert_files: &[PathBuf],
) -> anyhow::Result<FtpsTlsConnector> {
    let roots = load_root_certs(ca_cert_files)?;
    let config = FtpsTlsConnector::build_client_config(roots)
        .map_err(|e| anyhow!("failed to build tls client config: {e}"))?;
    let server_name = ServerName::try_from(tls_name.to_string())
        .map_err(|e| anyhow!("invalid tls server name {tls_name}: {e}"))?;
    Ok(FtpsTlsConnector::new(Arc::new(config), server_name))
}
