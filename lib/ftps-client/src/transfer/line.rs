/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use async_trait::async_trait;
use tokio::io::{AsyncRead, BufReader};

use crate::config::FtpTransferConfig;
use crate::error::FtpLineDataReadError;
use crate::io::LimitedBufReadExt;

#[async_trait]
pub trait FtpLineDataReceiver {
    async fn recv_line(&mut self, line: &str);
    fn should_return_early(&self) -> bool;
}

pub(crate) struct FtpLineDataTransfer<T: AsyncRead> {
    io: BufReader<T>,
    max_lines: usize,
    max_line_len: usize,
    line_buf: Vec<u8>,
}

impl<T> FtpLineDataTransfer<T>
where
    T: AsyncRead + Unpin,
{
    pub(crate) fn new(io: T, config: &FtpTransferConfig) -> Self {
        FtpLineDataTransfer {
            io: BufReader::new(io),
            max_lines: config.list_max_entries,
            max_line_len: config.list_max_line_len,
            line_buf: Vec::with_capacity(config.list_max_line_len),
        }
    }

    async fn send_buf_to_receiver<R>(
        &mut self,
        receiver: &mut R,
    ) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver + Send,
    {
        let s = std::str::from_utf8(&self.line_buf)
            .map_err(|_| FtpLineDataReadError::UnsupportedEncoding)?;
        receiver.recv_line(s).await;
        if receiver.should_return_early() {
            return Err(FtpLineDataReadError::AbortedByCallback);
        }
        self.line_buf.clear();
        Ok(())
    }

    /// Hand every line to `receiver` until the end of the data stream.
    ///
    /// Up to `max_lines` lines are accepted, more data after that is an error.
    pub(crate) async fn read_to_end<R>(mut self, receiver: &mut R) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver + Send,
    {
        let mut line_count = 0usize;
        loop {
            let (found, nr) = self
                .io
                .limited_read_until(b'\n', self.max_line_len, &mut self.line_buf)
                .await?;
            if nr == 0 {
                return Ok(());
            }
            if line_count >= self.max_lines {
                return Err(FtpLineDataReadError::TooManyLines(self.max_lines));
            }
            line_count += 1;

            if !found {
                if nr < self.max_line_len {
                    // the last line without a line ending
                    return self.send_buf_to_receiver(receiver).await;
                }
                return Err(FtpLineDataReadError::LineTooLong(line_count));
            }

            self.send_buf_to_receiver(receiver).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CollectReceiver {
        lines: Vec<String>,
        max: usize,
    }

    #[async_trait]
    impl FtpLineDataReceiver for CollectReceiver {
        async fn recv_line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }

        fn should_return_early(&self) -> bool {
            self.max > 0 && self.lines.len() >= self.max
        }
    }

    #[tokio::test]
    async fn read_lines() {
        let stream = tokio_test::io::Builder::new()
            .read(b"drwxr-xr-x 2 ftp ftp 4096 Jan  3  1994 pub\r\n")
            .read(b"-rw-r--r-- 1 ftp ftp   12 Jan  3  1994 a.txt\r\nb.txt")
            .build();
        let transfer = FtpLineDataTransfer::new(stream, &Default::default());
        let mut receiver = CollectReceiver::default();
        transfer.read_to_end(&mut receiver).await.unwrap();
        assert_eq!(receiver.lines.len(), 3);
        assert_eq!(
            receiver.lines[0],
            "drwxr-xr-x 2 ftp ftp 4096 Jan  3  1994 pub\r\n"
        );
        assert_eq!(receiver.lines[2], "b.txt");
    }

    #[tokio::test]
    async fn abort_early() {
        let stream = tokio_test::io::Builder::new()
            .read(b"a\r\nb\r\nc\r\n")
            .build();
        let transfer = FtpLineDataTransfer::new(stream, &Default::default());
        let mut receiver = CollectReceiver {
            lines: Vec::new(),
            max: 2,
        };
        assert!(matches!(
            transfer.read_to_end(&mut receiver).await,
            Err(FtpLineDataReadError::AbortedByCallback)
        ));
        assert_eq!(receiver.lines, vec!["a\r\n", "b\r\n"]);
    }

    #[tokio::test]
    async fn too_many_lines() {
        let stream = tokio_test::io::Builder::new()
            .read(b"a\r\nb\r\nc\r\n")
            .build();
        let mut config = FtpTransferConfig::default();
        config.set_list_max_entries(2);
        let transfer = FtpLineDataTransfer::new(stream, &config);
        let mut receiver = CollectReceiver::default();
        assert!(matches!(
            transfer.read_to_end(&mut receiver).await,
            Err(FtpLineDataReadError::TooManyLines(2))
        ));
        assert_eq!(receiver.lines, vec!["a\r\n", "b\r\n"]);
    }

    #[tokio::test]
    async fn exact_max_lines() {
        let stream = tokio_test::io::Builder::new()
            .read(b"a\r\nb\r\n")
            .build();
        let mut config = FtpTransferConfig::default();
        config.set_list_max_entries(2);
        let transfer = FtpLineDataTransfer::new(stream, &config);
        let mut receiver = CollectReceiver::default();
        transfer.read_to_end(&mut receiver).await.unwrap();
        assert_eq!(receiver.lines, vec!["a\r\n", "b\r\n"]);

        let stream = tokio_test::io::Builder::new().read(b"a\r\nb").build();
        let transfer = FtpLineDataTransfer::new(stream, &config);
        let mut receiver = CollectReceiver::default();
        transfer.read_to_end(&mut receiver).await.unwrap();
        assert_eq!(receiver.lines, vec!["a\r\n", "b"]);
    }

    #[tokio::test]
    async fn empty_listing() {
        let mut config = FtpTransferConfig::default();
        config.set_list_max_entries(0);

        let stream = tokio_test::io::Builder::new().build();
        let transfer = FtpLineDataTransfer::new(stream, &config);
        let mut receiver = CollectReceiver::default();
        transfer.read_to_end(&mut receiver).await.unwrap();
        assert!(receiver.lines.is_empty());

        let stream = tokio_test::io::Builder::new().read(b"a\r\n").build();
        let transfer = FtpLineDataTransfer::new(stream, &config);
        let mut receiver = CollectReceiver::default();
        assert!(matches!(
            transfer.read_to_end(&mut receiver).await,
            Err(FtpLineDataReadError::TooManyLines(0))
        ));
    }
}
