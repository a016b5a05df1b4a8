/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite, BufStream};

use crate::FtpControlConfig;
use crate::error::{FtpAuthStatus, FtpCommandError, FtpTransferServerError};
use crate::tls::FtpDataProtection;
use crate::transfer::FtpTransferType;

mod response;
use response::FtpRawResponse;

mod command;
pub use command::FtpCommand;

pub(crate) struct FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite,
{
    config: FtpControlConfig,
    stream: BufStream<T>,
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: FtpControlConfig) -> Self {
        FtpControlChannel {
            config,
            stream: BufStream::new(stream),
        }
    }

    #[inline]
    pub(crate) fn get_ref(&self) -> &T {
        self.stream.get_ref()
    }

    /// Take back the underlying stream, no reply data should be pending at this point.
    pub(crate) fn into_inner(self) -> T {
        self.stream.into_inner()
    }

    /// Send `cmd`, with `param` if it is not empty, and read the reply.
    async fn exchange(
        &mut self,
        cmd: FtpCommand,
        param: &str,
        stage: &'static str,
    ) -> Result<FtpRawResponse, FtpCommandError> {
        self.send_cmd_opt(cmd, param)
            .await
            .map_err(FtpCommandError::SendFailed)?;
        let reply = self.timed_read_raw_response(stage).await?;
        Ok(reply)
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let reply = self.read_raw_response().await?;
            return match reply.code() {
                120 => continue,
                220 => Ok(()),
                n => Err(FtpCommandError::from_reply(FtpCommand::GREETING, n)),
            };
        }
    }

    /// Returns false if the server does not support TLS on the control connection.
    pub(crate) async fn request_auth_tls(&mut self) -> Result<bool, FtpCommandError> {
        let cmd = FtpCommand::AUTH_TLS;
        let reply = self.exchange(cmd, "", "request auth tls").await?;
        match reply.code() {
            234 => Ok(true),
            502 | 504 | 534 | 431 => Ok(false),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn send_username(
        &mut self,
        name: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::USER;
        let username = name.unwrap_or("anonymous");
        let reply = self.exchange(cmd, username, "send username").await?;
        match reply.code() {
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            332 => Ok(FtpAuthStatus::NeedAccount),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn send_password(
        &mut self,
        pass: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::PASS;
        let password = pass.unwrap_or("anonymous@");
        let reply = self.exchange(cmd, password, "send password").await?;
        match reply.code() {
            230 => Ok(FtpAuthStatus::LoggedIn),
            332 => Ok(FtpAuthStatus::NeedAccount),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn request_pbsz(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::PBSZ_0;
        let reply = self.exchange(cmd, "", "request pbsz").await?;
        match reply.code() {
            200 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    /// Returns false if the protection level is not accepted by the server.
    pub(crate) async fn request_protection(
        &mut self,
        level: FtpDataProtection,
    ) -> Result<bool, FtpCommandError> {
        let cmd = match level {
            FtpDataProtection::Clear => FtpCommand::PROT_C,
            FtpDataProtection::Private => FtpCommand::PROT_P,
        };
        let reply = self.exchange(cmd, "", "request protection").await?;
        match reply.code() {
            200 => Ok(true),
            504 | 534 | 536 => Ok(false),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::QUIT;
        let reply = self.exchange(cmd, "", "send quit").await?;
        match reply.code() {
            221 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn send_noop(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::NOOP;
        let reply = self.exchange(cmd, "", "send noop").await?;
        match reply.code() {
            200 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn change_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::CWD;
        let reply = self.exchange(cmd, path, "change dir").await?;
        match reply.code() {
            200 | 250 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn print_working_dir(&mut self) -> Result<String, FtpCommandError> {
        let cmd = FtpCommand::PWD;
        let reply = self.exchange(cmd, "", "print working dir").await?;
        match reply.code() {
            257 => reply
                .parse_257_path()
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 257)),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn make_dir(&mut self, path: &str) -> Result<String, FtpCommandError> {
        let cmd = FtpCommand::MKD;
        let reply = self.exchange(cmd, path, "make dir").await?;
        match reply.code() {
            // some servers do not quote the created path
            257 => Ok(reply.parse_257_path().unwrap_or_else(|| path.to_string())),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn delete_file(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::DELE;
        let reply = self.exchange(cmd, path, "delete file").await?;
        match reply.code() {
            250 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn remove_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::RMD;
        let reply = self.exchange(cmd, path, "remove dir").await?;
        match reply.code() {
            250 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn request_size(&mut self, path: &str) -> Result<Option<u64>, FtpCommandError> {
        if path.is_empty() {
            return Ok(None);
        }

        let cmd = FtpCommand::SIZE;
        let reply = self.exchange(cmd, path, "request size").await?;
        match reply.code() {
            213 => reply
                .line_trimmed()
                .and_then(|s| u64::from_str(s).ok())
                .map(Some)
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 213)),
            550 => Ok(None),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn request_pasv_port(&mut self) -> Result<SocketAddr, FtpCommandError> {
        let cmd = FtpCommand::PASV;
        let reply = self.exchange(cmd, "", "request pasv port").await?;
        match reply.code() {
            227 => reply
                .parse_pasv_227_reply()
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 227)),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    pub(crate) async fn request_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        let cmd = match t {
            FtpTransferType::Ascii => FtpCommand::TYPE_A,
            FtpTransferType::Image => FtpCommand::TYPE_I,
        };
        let reply = self.exchange(cmd, "", "request transfer type").await?;
        match reply.code() {
            200 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    /// Send a transfer command and wait for the preliminary reply.
    ///
    /// `path` is optional for `LIST` and `NLST` and may be empty.
    pub(crate) async fn start_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
    ) -> Result<(), FtpCommandError> {
        let reply = self.exchange(cmd, path, "start transfer").await?;
        match reply.code() {
            125 | 150 => Ok(()),
            n => Err(FtpCommandError::from_reply(cmd, n)),
        }
    }

    /// Wait for the end reply of a transfer, without a timeout.
    pub(crate) async fn wait_transfer_end(
        &mut self,
        cmd: FtpCommand,
    ) -> Result<(), FtpTransferServerError> {
        let reply = self.read_raw_response().await?;
        match reply.code() {
            226 | 250 => Ok(()),
            n => Err(FtpTransferServerError::from_end_reply(cmd, n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    use crate::error::FtpReplyReadError;

    #[tokio::test]
    async fn greeting_with_delay() {
        let stream = Builder::new()
            .read(b"120 wait a moment\r\n")
            .read(b"220 ready\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        channel.wait_greetings().await.unwrap();
    }

    #[tokio::test]
    async fn greeting_not_available() {
        let stream = Builder::new().read(b"421 too many users\r\n").build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert!(matches!(
            channel.wait_greetings().await,
            Err(FtpCommandError::ServiceNotAvailable)
        ));
    }

    #[tokio::test]
    async fn auth_tls() {
        let stream = Builder::new()
            .write(b"AUTH TLS\r\n")
            .read(b"234 proceed with negotiation\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert!(channel.request_auth_tls().await.unwrap());

        let stream = Builder::new()
            .write(b"AUTH TLS\r\n")
            .read(b"502 not implemented\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert!(!channel.request_auth_tls().await.unwrap());
    }

    #[tokio::test]
    async fn login_anonymous() {
        let stream = Builder::new()
            .write(b"USER anonymous\r\n")
            .read(b"331 need password\r\n")
            .write(b"PASS anonymous@\r\n")
            .read(b"230 logged in\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert_eq!(
            channel.send_username(None).await.unwrap(),
            FtpAuthStatus::NeedPassword
        );
        assert_eq!(
            channel.send_password(None).await.unwrap(),
            FtpAuthStatus::LoggedIn
        );
    }

    #[tokio::test]
    async fn protection() {
        let stream = Builder::new()
            .write(b"PBSZ 0\r\n")
            .read(b"200 PBSZ=0\r\n")
            .write(b"PROT P\r\n")
            .read(b"200 Protection level set to P\r\n")
            .write(b"PROT C\r\n")
            .read(b"536 not allowed\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        channel.request_pbsz().await.unwrap();
        assert!(
            channel
                .request_protection(FtpDataProtection::Private)
                .await
                .unwrap()
        );
        assert!(
            !channel
                .request_protection(FtpDataProtection::Clear)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn pasv_port() {
        let stream = Builder::new()
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (192,168,1,10,82,8).\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        let addr = channel.request_pasv_port().await.unwrap();
        assert_eq!(addr, SocketAddr::from(([192, 168, 1, 10], 21000)));
    }

    #[tokio::test]
    async fn pasv_invalid_reply() {
        let stream = Builder::new()
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert!(matches!(
            channel.request_pasv_port().await,
            Err(FtpCommandError::InvalidReplySyntax(FtpCommand::PASV, 227))
        ));

        let stream = Builder::new().write(b"PASV\r\n").build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert!(matches!(
            channel.request_pasv_port().await,
            Err(FtpCommandError::RecvFailed(
                FtpReplyReadError::ConnectionClosed
            ))
        ));
    }

    #[tokio::test]
    async fn directory_commands() {
        let stream = Builder::new()
            .write(b"PWD\r\n")
            .read(b"257 \"/pub\" is the current directory\r\n")
            .write(b"CWD incoming\r\n")
            .read(b"250 okay\r\n")
            .write(b"MKD new\r\n")
            .read(b"257 \"/pub/incoming/new\" created\r\n")
            .write(b"RMD old\r\n")
            .read(b"550 no such directory\r\n")
            .write(b"SIZE a.txt\r\n")
            .read(b"213 1024\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert_eq!(channel.print_working_dir().await.unwrap(), "/pub");
        channel.change_dir("incoming").await.unwrap();
        assert_eq!(channel.make_dir("new").await.unwrap(), "/pub/incoming/new");
        assert!(matches!(
            channel.remove_dir("old").await,
            Err(FtpCommandError::ActionNotTaken(FtpCommand::RMD, 550))
        ));
        assert_eq!(channel.request_size("a.txt").await.unwrap(), Some(1024));
    }

    #[tokio::test]
    async fn list_without_path() {
        let stream = Builder::new()
            .write(b"NLST\r\n")
            .read(b"150 here it comes\r\n")
            .read(b"226 done\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        channel.start_transfer(FtpCommand::NLST, "").await.unwrap();
        channel.wait_transfer_end(FtpCommand::NLST).await.unwrap();
    }

    #[tokio::test]
    async fn store_refused() {
        let stream = Builder::new()
            .write(b"STOR a b.txt\r\n")
            .read(b"553 file name not allowed\r\n")
            .write(b"STOR a.txt\r\n")
            .read(b"150 ok to send\r\n")
            .read(b"552 exceeded storage allocation\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert!(matches!(
            channel.start_transfer(FtpCommand::STOR, "a b.txt").await,
            Err(FtpCommandError::ActionNotTaken(FtpCommand::STOR, 553))
        ));
        channel
            .start_transfer(FtpCommand::STOR, "a.txt")
            .await
            .unwrap();
        assert!(matches!(
            channel.wait_transfer_end(FtpCommand::STOR).await,
            Err(FtpTransferServerError::Aborted(FtpCommand::STOR, 552))
        ));
    }

    #[tokio::test]
    async fn retrieve_lost() {
        let stream = Builder::new()
            .write(b"RETR a.txt\r\n")
            .read(b"125 transfer starting\r\n")
            .read(b"426 connection closed, transfer aborted\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        channel
            .start_transfer(FtpCommand::RETR, "a.txt")
            .await
            .unwrap();
        assert!(matches!(
            channel.wait_transfer_end(FtpCommand::RETR).await,
            Err(FtpTransferServerError::DataConnectionFailed(
                FtpCommand::RETR,
                426
            ))
        ));
    }

    #[tokio::test]
    async fn command_not_implemented() {
        let stream = Builder::new()
            .write(b"SIZE a.txt\r\n")
            .read(b"502 SIZE not implemented\r\n")
            .write(b"SIZE b.txt\r\n")
            .read(b"550 no such file\r\n")
            .build();
        let mut channel = FtpControlChannel::new(stream, Default::default());
        assert!(matches!(
            channel.request_size("a.txt").await,
            Err(FtpCommandError::Refused(FtpCommand::SIZE, 502))
        ));
        assert_eq!(channel.request_size("b.txt").await.unwrap(), None);
    }
}
