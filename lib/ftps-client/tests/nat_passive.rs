/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rustls::{RootCertStore, ServerConfig};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufStream};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use ftps_client::{
    FtpClientConfig, FtpConnectionProvider, FtpDataProtection, FtpLineDataReceiver,
    FtpTransferSetupError, FtpTransferStartError, FtpsClient, FtpsTlsConnector,
};

const ADVERTISED_HOST: &str = "10,0,0,5";
const LISTING: &[&str] = &[
    "drwxr-xr-x 2 ftp ftp 4096 Jan  3  1994 pub",
    "-rw-r--r-- 1 ftp ftp   12 Jan  3  1994 readme.txt",
];

type TestClient = FtpsClient<RecordingProvider, TcpStream, io::Error>;

#[derive(Clone, Default)]
struct RecordingProvider {
    data_addrs: Arc<Mutex<Vec<SocketAddr>>>,
}

impl RecordingProvider {
    fn data_addrs(&self) -> Vec<SocketAddr> {
        self.data_addrs.lock().unwrap().clone()
    }
}

#[async_trait]
impl FtpConnectionProvider<TcpStream, io::Error> for RecordingProvider {
    async fn new_control_connection(&mut self, host: &str, port: u16) -> io::Result<TcpStream> {
        TcpStream::connect((host, port)).await
    }

    async fn new_data_connection(&mut self, server_addr: SocketAddr) -> io::Result<TcpStream> {
        self.data_addrs.lock().unwrap().push(server_addr);
        if !server_addr.ip().is_loopback() {
            // the advertised private address is not routable from here
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
        }
        TcpStream::connect(server_addr).await
    }
}

#[derive(Default)]
struct CollectReceiver {
    lines: Vec<String>,
}

#[async_trait]
impl FtpLineDataReceiver for CollectReceiver {
    async fn recv_line(&mut self, line: &str) {
        self.lines.push(line.trim_end().to_string());
    }

    fn should_return_early(&self) -> bool {
        false
    }
}

fn generate_cert() -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let cert = rcgen::CertificateParams::new(vec!["localhost".to_string()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    (cert.der().clone(), key)
}

fn build_tls(
    cert: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
) -> (TlsAcceptor, FtpsTlsConnector) {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let server_config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert.clone()], key)
        .unwrap();

    let mut roots = RootCertStore::empty();
    roots.add(cert).unwrap();
    let client_config = FtpsTlsConnector::build_client_config(roots).unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();

    (
        TlsAcceptor::from(Arc::new(server_config)),
        FtpsTlsConnector::new(Arc::new(client_config), server_name),
    )
}

/// A minimal FTPS server which advertises a private address in its PASV reply.
async fn run_server(
    listener: TcpListener,
    data_listener: TcpListener,
    acceptor: TlsAcceptor,
) -> io::Result<()> {
    let (mut stream, _) = listener.accept().await?;
    stream.write_all(b"220 test server ready\r\n").await?;

    let mut line = String::new();
    BufReader::new(&mut stream).read_line(&mut line).await?;
    assert_eq!(line, "AUTH TLS\r\n");
    stream.write_all(b"234 proceed with negotiation\r\n").await?;

    let tls_stream = acceptor.accept(stream).await?;
    let mut control = BufStream::new(tls_stream);
    let data_port = data_listener.local_addr()?.port();
    let mut protected = false;

    loop {
        line.clear();
        if control.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let cmd = line.trim_end();
        let verb = cmd.split_once(' ').map(|(v, _)| v).unwrap_or(cmd);
        let reply = match verb {
            "USER" => "331 password required".to_string(),
            "PASS" => "230 logged in".to_string(),
            "PBSZ" => "200 PBSZ=0".to_string(),
            "PROT" => {
                protected = cmd == "PROT P";
                "200 protection level set".to_string()
            }
            "TYPE" => "200 type set".to_string(),
            "PASV" => format!(
                "227 Entering Passive Mode ({ADVERTISED_HOST},{},{})",
                data_port >> 8,
                data_port & 0xFF
            ),
            "LIST" => {
                control
                    .write_all(b"150 here comes the directory listing\r\n")
                    .await?;
                control.flush().await?;

                let (data, _) = data_listener.accept().await?;
                let mut content = String::new();
                for entry in LISTING {
                    content.push_str(entry);
                    content.push_str("\r\n");
                }
                if protected {
                    let mut data = acceptor.accept(data).await?;
                    data.write_all(content.as_bytes()).await?;
                    data.shutdown().await?;
                } else {
                    let mut data = data;
                    data.write_all(content.as_bytes()).await?;
                    data.shutdown().await?;
                }
                "226 directory send ok".to_string()
            }
            "QUIT" => {
                control.write_all(b"221 goodbye\r\n").await?;
                control.flush().await?;
                return Ok(());
            }
            _ => "502 command not implemented".to_string(),
        };
        control.write_all(reply.as_bytes()).await?;
        control.write_all(b"\r\n").await?;
        control.flush().await?;
    }
}

async fn start_server() -> (u16, JoinHandle<io::Result<()>>, FtpsTlsConnector) {
    let (cert, key) = generate_cert();
    let (acceptor, connector) = build_tls(cert, key);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(run_server(listener, data_listener, acceptor));
    (port, handle, connector)
}

#[tokio::test]
async fn list_with_host_address() {
    let (port, server, connector) = start_server().await;

    let mut config = FtpClientConfig::default();
    config.set_force_host_address(true);
    let provider = RecordingProvider::default();
    let mut client: TestClient =
        FtpsClient::connect_to("127.0.0.1", port, provider.clone(), connector, &config)
            .await
            .unwrap();
    assert!(client.force_host_address());

    client.login(None, None).await.unwrap();
    client.prot_p().await.unwrap();
    assert_eq!(client.data_protection(), FtpDataProtection::Private);

    let data_stream = client.list_directory_detailed_start("").await.unwrap();
    assert!(data_stream.is_protected());
    let mut receiver = CollectReceiver::default();
    client
        .list_directory_detailed_receive(data_stream, &mut receiver)
        .await
        .unwrap();
    assert_eq!(receiver.lines, LISTING);

    let data_addrs = provider.data_addrs();
    assert_eq!(data_addrs.len(), 1);
    assert_eq!(data_addrs[0].ip(), client.control_peer_addr().unwrap().ip());
    assert!(data_addrs[0].ip().is_loopback());

    client.quit_and_close().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn list_with_advertised_address() {
    let (port, server, connector) = start_server().await;

    let config = FtpClientConfig::default();
    let provider = RecordingProvider::default();
    let mut client: TestClient =
        FtpsClient::connect_to("127.0.0.1", port, provider.clone(), connector, &config)
            .await
            .unwrap();
    assert!(!client.force_host_address());
    client.login(None, None).await.unwrap();

    match client.list_directory_detailed_start("").await {
        Err(FtpTransferStartError::Setup(FtpTransferSetupError::ConnectIoError(e))) => {
            assert_eq!(e.kind(), io::ErrorKind::ConnectionRefused)
        }
        Err(e) => panic!("unexpected error: {e:?}"),
        Ok(_) => panic!("the advertised address should not be reachable"),
    }
    assert_eq!(
        provider.data_addrs()[0].ip().to_string(),
        ADVERTISED_HOST.replace(',', ".")
    );

    // switch to the control peer address and retry on the same session
    client.use_host_address();
    let data_stream = client.list_directory_detailed_start("").await.unwrap();
    assert!(!data_stream.is_protected());
    let mut receiver = CollectReceiver::default();
    client
        .list_directory_detailed_receive(data_stream, &mut receiver)
        .await
        .unwrap();
    assert_eq!(receiver.lines, LISTING);

    let data_addrs = provider.data_addrs();
    assert_eq!(data_addrs.len(), 2);
    assert_eq!(data_addrs[0].port(), data_addrs[1].port());
    assert!(data_addrs[1].ip().is_loopback());

    client.quit_and_close().await.unwrap();
    server.await.unwrap().unwrap();
}
