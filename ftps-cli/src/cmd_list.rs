/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use anyhow::anyhow;
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use ftps_client::{FtpConnectionProvider, FtpControlPeer, FtpLineDataReceiver, FtpsClient};

const COMMAND_LIST: &str = "list";
const COMMAND_NLST: &str = "nlst";

const COMMAND_ARG_PATH: &str = "path";

/// `LIST` output is server formatted, `NLST` only has the names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ListMode {
    Detailed,
    Names,
}

impl ListMode {
    pub(super) fn from_command(cmd: &str) -> Option<Self> {
        match cmd {
            COMMAND_LIST => Some(ListMode::Detailed),
            COMMAND_NLST => Some(ListMode::Names),
            _ => None,
        }
    }

    fn command_name(&self) -> &'static str {
        match self {
            ListMode::Detailed => COMMAND_LIST,
            ListMode::Names => COMMAND_NLST,
        }
    }

    pub(super) fn command(self) -> Command {
        let about = match self {
            ListMode::Detailed => "List path in server format",
            ListMode::Names => "List names in path",
        };
        Command::new(self.command_name()).about(about).arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("PATH")
                .num_args(1),
        )
    }
}

pub(super) async fn run<CP, S, E>(
    client: &mut FtpsClient<CP, S, E>,
    args: &ArgMatches,
    mode: ListMode,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S, E>,
    S: AsyncRead + AsyncWrite + FtpControlPeer + Unpin + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();

    let mut writer = LineWriter::new(tokio::io::stdout());
    let received = match mode {
        ListMode::Detailed => {
            let data_stream = client.list_directory_detailed_start(path).await?;
            client
                .list_directory_detailed_receive(data_stream, &mut writer)
                .await
        }
        ListMode::Names => {
            let data_stream = client.list_names_start(path).await?;
            client.list_names_receive(data_stream, &mut writer).await
        }
    };
    if let Err(e) = received {
        // a write error aborts the transfer, report the cause
        return match writer.take_error() {
            Some(io_err) => Err(anyhow!("failed to write listing: {io_err}")),
            None => Err(e.into()),
        };
    }

    let lines = writer
        .finish()
        .await
        .map_err(|e| anyhow!("failed to write listing: {e}"))?;
    log::debug!("{lines} entries received by {}", mode.command_name());
    Ok(())
}

/// Copy listing lines to `io`, stopping the transfer at the first write error.
pub(super) struct LineWriter<W> {
    io: W,
    lines: usize,
    error: Option<io::Error>,
}

impl<W> LineWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub(super) fn new(io: W) -> Self {
        LineWriter {
            io,
            lines: 0,
            error: None,
        }
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Flush the output, returns the number of lines written.
    pub(super) async fn finish(mut self) -> io::Result<usize> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.io.flush().await?;
        Ok(self.lines)
    }
}

#[async_trait]
impl<W> FtpLineDataReceiver for LineWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn recv_line(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        match self.io.write_all(line.as_bytes()).await {
            Ok(_) => self.lines += 1,
            Err(e) => self.error = Some(e),
        }
    }

    #[inline]
    fn should_return_early(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_commands() {
        assert_eq!(ListMode::from_command("list"), Some(ListMode::Detailed));
        assert_eq!(ListMode::from_command("nlst"), Some(ListMode::Names));
        assert_eq!(ListMode::from_command("get"), None);

        let args = ListMode::Names
            .command()
            .try_get_matches_from(["nlst", "/pub"])
            .unwrap();
        assert_eq!(
            args.get_one::<String>(COMMAND_ARG_PATH).map(|s| s.as_str()),
            Some("/pub")
        );
    }

    #[tokio::test]
    async fn write_lines() {
        let mut writer = LineWriter::new(Vec::new());
        writer.recv_line("a.txt\r\n").await;
        writer.recv_line("b.txt\r\n").await;
        assert!(!writer.should_return_early());
        assert_eq!(writer.io, b"a.txt\r\nb.txt\r\n");
        assert_eq!(writer.finish().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn write_error() {
        let io = tokio_test::io::Builder::new()
            .write(b"a.txt\r\n")
            .write_error(io::Error::from(io::ErrorKind::BrokenPipe))
            .build();
        let mut writer = LineWriter::new(io);
        writer.recv_line("a.txt\r\n").await;
        writer.recv_line("b.txt\r\n").await;
        assert!(writer.should_return_early());
        // later lines are dropped once the output is broken
        writer.recv_line("c.txt\r\n").await;

        let e = writer.finish().await.unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
    }
}
