/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::error::Error;
use std::io;
use std::marker::PhantomData;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_rustls::client::TlsStream;

use crate::control::{FtpCommand, FtpControlChannel};
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpConnectError, FtpPassiveNegotiationError,
    FtpSessionOpenError, FtpTlsError, FtpTransferError, FtpTransferSetupError,
    FtpTransferStartError,
};
use crate::log_msg;
use crate::transfer::{FtpDataStream, FtpLineDataTransfer};
use crate::{
    FtpClientConfig, FtpConnectionProvider, FtpControlPeer, FtpDataProtection, FtpLineDataReceiver,
    FtpTransferType, FtpsTlsConnector, PassiveAddressResolver, PassiveModeNegotiator,
};

const DATA_COPY_BUFFER_SIZE: usize = 16 * 1024;

/// An explicit FTPS client session.
///
/// The control connection is secured by `AUTH TLS` right after the greeting.
/// All data connections are opened in passive mode, to the address resolved by
/// the session's [`PassiveAddressResolver`].
pub struct FtpsClient<CP, S, E>
where
    CP: FtpConnectionProvider<S, E>,
    S: AsyncRead + AsyncWrite + Unpin,
    E: Error,
{
    config: FtpClientConfig,
    conn_provider: CP,
    tls_connector: FtpsTlsConnector,
    control: PassiveAddressResolver<FtpControlChannel<TlsStream<S>>>,
    protection: FtpDataProtection,
    transfer_type: Option<FtpTransferType>,
    _phantom: PhantomData<E>,
}

impl<CP, S, E> FtpsClient<CP, S, E>
where
    CP: FtpConnectionProvider<S, E>,
    S: AsyncRead + AsyncWrite + FtpControlPeer + Unpin + Send,
    E: Error,
{
    pub async fn connect_to(
        host: &str,
        port: u16,
        mut conn_provider: CP,
        tls_connector: FtpsTlsConnector,
        config: &FtpClientConfig,
    ) -> Result<Self, FtpConnectError<E>> {
        let stream = match tokio::time::timeout(
            config.connect_timeout,
            conn_provider.new_control_connection(host, port),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(FtpConnectError::ConnectIoError(e)),
            Err(_) => return Err(FtpConnectError::ConnectTimedOut),
        };

        let mut channel = FtpControlChannel::new(stream, config.control.clone());
        match tokio::time::timeout(config.greeting_timeout, channel.wait_greetings()).await {
            Ok(Ok(_)) => {}
            Ok(Err(FtpCommandError::ServiceNotAvailable)) => {
                return Err(FtpConnectError::ServiceNotAvailable);
            }
            Ok(Err(e)) => return Err(FtpConnectError::GreetingFailed(e)),
            Err(_) => return Err(FtpConnectError::GreetingTimedOut),
        }

        match channel.request_auth_tls().await {
            Ok(true) => {}
            Ok(false) => return Err(FtpTlsError::NotSupportedByServer.into()),
            Err(FtpCommandError::ServiceNotAvailable) => {
                return Err(FtpConnectError::ServiceNotAvailable);
            }
            Err(e) => return Err(FtpTlsError::AuthCommandFailed(e).into()),
        }

        let tls_stream = tls_connector
            .handshake(channel.into_inner(), config.tls_handshake_timeout)
            .await?;
        log_msg!("control connection to {host}:{port} secured");

        let control = FtpControlChannel::new(tls_stream, config.control.clone());
        Ok(FtpsClient {
            config: config.clone(),
            conn_provider,
            tls_connector,
            control: PassiveAddressResolver::with_force_host_address(
                control,
                config.force_host_address,
            ),
            protection: FtpDataProtection::Clear,
            transfer_type: None,
            _phantom: PhantomData,
        })
    }

    /// Login as `username`, or as anonymous if no username is given.
    pub async fn login(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), FtpSessionOpenError> {
        let control = self.control.inner_mut();
        match control.send_username(username).await? {
            FtpAuthStatus::LoggedIn => return Ok(()),
            FtpAuthStatus::NotLoggedIn => return Err(FtpSessionOpenError::NotLoggedIn),
            FtpAuthStatus::NeedAccount => return Err(FtpSessionOpenError::AccountIsNeeded),
            FtpAuthStatus::NeedPassword => {}
        }

        match control.send_password(password).await? {
            FtpAuthStatus::LoggedIn => Ok(()),
            FtpAuthStatus::NeedAccount => Err(FtpSessionOpenError::AccountIsNeeded),
            FtpAuthStatus::NotLoggedIn | FtpAuthStatus::NeedPassword => {
                Err(FtpSessionOpenError::NotLoggedIn)
            }
        }
    }

    async fn set_protection(
        &mut self,
        level: FtpDataProtection,
    ) -> Result<(), FtpSessionOpenError> {
        let control = self.control.inner_mut();
        if level == FtpDataProtection::Private {
            control.request_pbsz().await.map_err(|e| {
                FtpSessionOpenError::DataProtectionFailed(FtpTlsError::ProtectionCommandFailed(e))
            })?;
        }
        match control.request_protection(level).await {
            Ok(true) => {
                self.protection = level;
                Ok(())
            }
            Ok(false) => Err(FtpSessionOpenError::DataProtectionFailed(
                FtpTlsError::ProtectionLevelRejected(level.as_char()),
            )),
            Err(FtpCommandError::ServiceNotAvailable) => {
                Err(FtpSessionOpenError::ServiceNotAvailable)
            }
            Err(e) => Err(FtpSessionOpenError::DataProtectionFailed(
                FtpTlsError::ProtectionCommandFailed(e),
            )),
        }
    }

    /// Set up a secure data connection (`PBSZ 0` + `PROT P`).
    pub async fn prot_p(&mut self) -> Result<(), FtpSessionOpenError> {
        self.set_protection(FtpDataProtection::Private).await
    }

    /// Set up a clear text data connection (`PROT C`).
    pub async fn prot_c(&mut self) -> Result<(), FtpSessionOpenError> {
        self.set_protection(FtpDataProtection::Clear).await
    }

    #[inline]
    pub fn data_protection(&self) -> FtpDataProtection {
        self.protection
    }

    /// Use the control connection's peer IP instead of the IP in PASV replies.
    pub fn set_force_host_address(&mut self, enable: bool) {
        self.control.set_force_host_address(enable);
    }

    /// Same as `set_force_host_address(true)`.
    pub fn use_host_address(&mut self) {
        self.control.use_host_address();
    }

    #[inline]
    pub fn force_host_address(&self) -> bool {
        self.control.force_host_address()
    }

    pub fn control_peer_addr(&self) -> io::Result<SocketAddr> {
        self.control.inner().get_ref().peer_addr()
    }

    /// Negotiate the passive address to use for the next data connection.
    pub async fn negotiate_passive_address(
        &mut self,
    ) -> Result<SocketAddr, FtpPassiveNegotiationError> {
        self.control.negotiate_passive_address().await
    }

    async fn open_data_connection(
        &mut self,
        transfer_type: FtpTransferType,
    ) -> Result<S, FtpTransferSetupError<E>> {
        if self.transfer_type != Some(transfer_type) {
            self.control
                .inner_mut()
                .request_transfer_type(transfer_type)
                .await
                .map_err(FtpTransferSetupError::TransferTypeFailed)?;
            self.transfer_type = Some(transfer_type);
        }

        let addr = self.control.negotiate_passive_address().await?;
        log_msg!("open data connection to {addr}");
        match tokio::time::timeout(
            self.config.connect_timeout,
            self.conn_provider.new_data_connection(addr),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(FtpTransferSetupError::ConnectIoError(e)),
            Err(_) => Err(FtpTransferSetupError::ConnectTimedOut),
        }
    }

    async fn protect_data_connection(
        &self,
        stream: S,
    ) -> Result<FtpDataStream<S>, FtpTransferSetupError<E>> {
        match self.protection {
            FtpDataProtection::Clear => Ok(FtpDataStream::Clear(stream)),
            FtpDataProtection::Private => {
                let tls_stream = self
                    .tls_connector
                    .handshake(stream, self.config.tls_handshake_timeout)
                    .await?;
                Ok(FtpDataStream::Protected(Box::new(tls_stream)))
            }
        }
    }

    /// Open the data connection, send `cmd` and secure the data connection
    /// once the server has accepted the transfer.
    async fn transfer_start(
        &mut self,
        transfer_type: FtpTransferType,
        cmd: FtpCommand,
        path: &str,
    ) -> Result<FtpDataStream<S>, FtpTransferStartError<E>> {
        let data_stream = self.open_data_connection(transfer_type).await?;
        self.control.inner_mut().start_transfer(cmd, path).await?;
        let data_stream = self.protect_data_connection(data_stream).await?;
        Ok(data_stream)
    }

    async fn transfer_end(&mut self, cmd: FtpCommand) -> Result<(), FtpTransferError> {
        match tokio::time::timeout(
            self.config.transfer.end_wait_timeout,
            self.control.inner_mut().wait_transfer_end(cmd),
        )
        .await
        {
            Ok(r) => r.map_err(FtpTransferError::from),
            Err(_) => Err(FtpTransferError::EndReplyTimedOut),
        }
    }

    async fn list_receive<R>(
        &mut self,
        cmd: FtpCommand,
        data_stream: FtpDataStream<S>,
        receiver: &mut R,
    ) -> Result<(), FtpTransferError>
    where
        R: FtpLineDataReceiver + Send,
    {
        let transfer = FtpLineDataTransfer::new(data_stream, &self.config.transfer);
        match tokio::time::timeout(
            self.config.transfer.list_all_timeout,
            transfer.read_to_end(receiver),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(FtpTransferError::DataTimedOut),
        }

        self.transfer_end(cmd).await
    }

    /// Start a `LIST` transfer, the returned stream should be passed to
    /// [`Self::list_directory_detailed_receive`].
    pub async fn list_directory_detailed_start(
        &mut self,
        path: &str,
    ) -> Result<FtpDataStream<S>, FtpTransferStartError<E>> {
        self.transfer_start(FtpTransferType::Ascii, FtpCommand::LIST, path)
            .await
    }

    pub async fn list_directory_detailed_receive<R>(
        &mut self,
        data_stream: FtpDataStream<S>,
        receiver: &mut R,
    ) -> Result<(), FtpTransferError>
    where
        R: FtpLineDataReceiver + Send,
    {
        self.list_receive(FtpCommand::LIST, data_stream, receiver)
            .await
    }

    /// Start a `NLST` transfer, the returned stream should be passed to
    /// [`Self::list_names_receive`].
    pub async fn list_names_start(
        &mut self,
        path: &str,
    ) -> Result<FtpDataStream<S>, FtpTransferStartError<E>> {
        self.transfer_start(FtpTransferType::Ascii, FtpCommand::NLST, path)
            .await
    }

    pub async fn list_names_receive<R>(
        &mut self,
        data_stream: FtpDataStream<S>,
        receiver: &mut R,
    ) -> Result<(), FtpTransferError>
    where
        R: FtpLineDataReceiver + Send,
    {
        self.list_receive(FtpCommand::NLST, data_stream, receiver)
            .await
    }

    pub async fn retrieve_file_start(
        &mut self,
        path: &str,
    ) -> Result<FtpDataStream<S>, FtpTransferStartError<E>> {
        self.transfer_start(FtpTransferType::Image, FtpCommand::RETR, path)
            .await
    }

    /// Copy all data to `writer`, and wait for the end reply.
    ///
    /// Returns the number of bytes received.
    pub async fn retrieve_file_receive<W>(
        &mut self,
        mut data_stream: FtpDataStream<S>,
        writer: &mut W,
    ) -> Result<u64, FtpTransferError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; DATA_COPY_BUFFER_SIZE];
        let mut total: u64 = 0;
        loop {
            let nr = data_stream
                .read(&mut buf)
                .await
                .map_err(FtpTransferError::DataIo)?;
            if nr == 0 {
                break;
            }
            writer
                .write_all(&buf[..nr])
                .await
                .map_err(FtpTransferError::LocalIo)?;
            total += nr as u64;
        }
        writer
            .flush()
            .await
            .map_err(FtpTransferError::LocalIo)?;
        drop(data_stream);

        self.transfer_end(FtpCommand::RETR).await?;
        Ok(total)
    }

    pub async fn store_file_start(
        &mut self,
        path: &str,
    ) -> Result<FtpDataStream<S>, FtpTransferStartError<E>> {
        self.transfer_start(FtpTransferType::Image, FtpCommand::STOR, path)
            .await
    }

    /// Copy all data from `reader`, close the data connection and wait for the end reply.
    ///
    /// Returns the number of bytes sent.
    pub async fn store_file_send<R>(
        &mut self,
        mut data_stream: FtpDataStream<S>,
        reader: &mut R,
    ) -> Result<u64, FtpTransferError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; DATA_COPY_BUFFER_SIZE];
        let mut total: u64 = 0;
        loop {
            let nr = reader
                .read(&mut buf)
                .await
                .map_err(FtpTransferError::LocalIo)?;
            if nr == 0 {
                break;
            }
            data_stream
                .write_all(&buf[..nr])
                .await
                .map_err(FtpTransferError::DataIo)?;
            total += nr as u64;
        }
        data_stream
            .shutdown()
            .await
            .map_err(FtpTransferError::DataIo)?;
        drop(data_stream);

        self.transfer_end(FtpCommand::STOR).await?;
        Ok(total)
    }

    pub async fn change_directory(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.inner_mut().change_dir(path).await
    }

    pub async fn print_working_directory(&mut self) -> Result<String, FtpCommandError> {
        self.control.inner_mut().print_working_dir().await
    }

    /// Returns the path of the created directory, as reported by the server.
    pub async fn make_directory(&mut self, path: &str) -> Result<String, FtpCommandError> {
        self.control.inner_mut().make_dir(path).await
    }

    pub async fn remove_directory(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.inner_mut().remove_dir(path).await
    }

    pub async fn delete_file(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.inner_mut().delete_file(path).await
    }

    /// Returns `None` if the file does not exist or its size is not available.
    pub async fn fetch_file_size(&mut self, path: &str) -> Result<Option<u64>, FtpCommandError> {
        self.control.inner_mut().request_size(path).await
    }

    pub async fn noop(&mut self) -> Result<(), FtpCommandError> {
        self.control.inner_mut().send_noop().await
    }

    pub async fn quit_and_close(self) -> Result<(), FtpCommandError> {
        let mut control = self.control.into_inner();
        control.send_quit().await?;
        let mut stream = control.into_inner();
        // the server may have closed the connection already
        let _ = stream.shutdown().await;
        Ok(())
    }
}
