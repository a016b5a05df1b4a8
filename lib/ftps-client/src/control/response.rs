/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpControlChannel;
use crate::error::FtpReplyReadError;
use crate::io::LimitedBufReadExt;

#[derive(Debug)]
pub(crate) enum FtpRawResponse {
    SingleLine(u16, String),
    MultiLine(u16, Vec<String>),
}

macro_rules! char_to_u16 {
    ($c:expr) => {
        ($c.wrapping_sub(b'0')) as u16
    };
}

fn parse_reply_code(line: &[u8]) -> Result<u16, FtpReplyReadError> {
    if !line[0..3].iter().all(|c| c.is_ascii_digit()) {
        return Err(FtpReplyReadError::MalformedLine);
    }
    let code = char_to_u16!(line[0]) * 100 + char_to_u16!(line[1]) * 10 + char_to_u16!(line[2]);
    if !(100..600).contains(&code) {
        return Err(FtpReplyReadError::InvalidReplyCode(code));
    }
    Ok(code)
}

impl FtpRawResponse {
    pub(super) fn parse_single_line(line: &[u8]) -> Result<Self, FtpReplyReadError> {
        let code = parse_reply_code(line)?;
        let msg =
            std::str::from_utf8(&line[4..]).map_err(|_| FtpReplyReadError::NotUtf8)?;
        Ok(FtpRawResponse::SingleLine(code, msg.trim_end().to_string()))
    }

    pub(super) fn get_multi_line_parser(
        line: &[u8],
        max_lines: usize,
    ) -> Result<FtpMultiLineReplyParser, FtpReplyReadError> {
        let code = parse_reply_code(line)?;
        let end_prefix = [line[0], line[1], line[2], b' '];
        let mut lines = Vec::<String>::with_capacity(max_lines.min(16));
        let msg =
            std::str::from_utf8(&line[4..]).map_err(|_| FtpReplyReadError::NotUtf8)?;
        lines.push(msg.trim_end().to_string());
        Ok(FtpMultiLineReplyParser {
            code,
            end_prefix,
            lines,
        })
    }

    pub(crate) fn code(&self) -> u16 {
        match self {
            FtpRawResponse::SingleLine(code, _) => *code,
            FtpRawResponse::MultiLine(code, _) => *code,
        }
    }

    pub(super) fn line_trimmed(&self) -> Option<&str> {
        match self {
            FtpRawResponse::SingleLine(_, line) => Some(line.as_str().trim()),
            FtpRawResponse::MultiLine(_, _) => None,
        }
    }

    /// The message text of a single line reply, or the last line of a multi-line reply.
    pub(super) fn last_line(&self) -> Option<&str> {
        match self {
            FtpRawResponse::SingleLine(_, line) => Some(line.as_str()),
            FtpRawResponse::MultiLine(_, lines) => lines.last().map(|s| s.as_str()),
        }
    }

    /// Parse `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`.
    pub(super) fn parse_pasv_227_reply(&self) -> Option<SocketAddr> {
        let line = self.last_line()?;

        let p_start = memchr::memchr(b'(', line.as_bytes())?;
        let p_end = memchr::memchr(b')', &line.as_bytes()[p_start..])? + p_start;

        let a: Vec<&str> = line[p_start + 1..p_end].split(',').collect();
        if a.len() != 6 {
            return None;
        }

        let h1 = u8::from_str(a[0].trim()).ok()?;
        let h2 = u8::from_str(a[1].trim()).ok()?;
        let h3 = u8::from_str(a[2].trim()).ok()?;
        let h4 = u8::from_str(a[3].trim()).ok()?;
        let p1 = u8::from_str(a[4].trim()).ok()?;
        let p2 = u8::from_str(a[5].trim()).ok()?;

        let ip = IpAddr::V4(Ipv4Addr::new(h1, h2, h3, h4));
        let port = ((p1 as u16) << 8) + (p2 as u16);
        Some(SocketAddr::new(ip, port))
    }

    /// Parse `257 "<path>" ...`, where embedded quotes are doubled.
    pub(super) fn parse_257_path(&self) -> Option<String> {
        let line = self.last_line()?;

        let start = memchr::memchr(b'"', line.as_bytes())?;
        let mut path = String::with_capacity(line.len() - start);
        let mut chars = line[start + 1..].chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    path.push('"');
                } else {
                    return Some(path);
                }
            } else {
                path.push(c);
            }
        }

        None
    }
}

pub(super) struct FtpMultiLineReplyParser {
    code: u16,
    end_prefix: [u8; 4],
    lines: Vec<String>,
}

impl FtpMultiLineReplyParser {
    pub(super) fn feed_line(&mut self, line: &[u8]) -> Result<bool, FtpReplyReadError> {
        if line.starts_with(&self.end_prefix) {
            let msg =
                std::str::from_utf8(&line[4..]).map_err(|_| FtpReplyReadError::NotUtf8)?;
            self.lines.push(msg.trim_end().to_string());
            Ok(true)
        } else {
            let msg = std::str::from_utf8(line).map_err(|_| FtpReplyReadError::NotUtf8)?;
            // do not trim whitespace at beginning
            self.lines.push(msg.trim_end().to_string());
            Ok(false)
        }
    }

    pub(super) fn finish(self) -> FtpRawResponse {
        FtpRawResponse::MultiLine(self.code, self.lines)
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_line(
        &mut self,
        buf: &mut Vec<u8>,
        min_len: usize,
    ) -> Result<(), FtpReplyReadError> {
        buf.clear();

        let (found, len) = self
            .stream
            .limited_read_until(b'\n', self.config.max_line_len, buf)
            .await?;

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(String::from_utf8_lossy(buf).trim_end());

        if len == 0 {
            Err(FtpReplyReadError::ConnectionClosed)
        } else if !found {
            Err(FtpReplyReadError::LineTooLong(self.config.max_line_len))
        } else if len < min_len {
            Err(FtpReplyReadError::MalformedLine)
        } else {
            Ok(())
        }
    }

    pub(crate) async fn read_raw_response(
        &mut self,
    ) -> Result<FtpRawResponse, FtpReplyReadError> {
        let mut buf = Vec::<u8>::with_capacity(self.config.max_line_len);
        // at least "<code> \n"
        self.read_line(&mut buf, 5).await?;

        match buf[3] {
            b' ' => FtpRawResponse::parse_single_line(&buf),
            b'-' => {
                let mut ml_parser =
                    FtpRawResponse::get_multi_line_parser(&buf, self.config.max_multi_lines)?;
                for _i in 0..self.config.max_multi_lines {
                    self.read_line(&mut buf, 1).await?;
                    let end = ml_parser.feed_line(&buf)?;
                    if end {
                        return Ok(ml_parser.finish());
                    }
                }
                Err(FtpReplyReadError::TooManyLines(self.config.max_multi_lines))
            }
            _ => Err(FtpReplyReadError::MalformedLine),
        }
    }

    pub(crate) async fn timed_read_raw_response(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpRawResponse, FtpReplyReadError> {
        match tokio::time::timeout(self.config.command_timeout, self.read_raw_response()).await {
            Ok(r) => r,
            Err(_) => Err(FtpReplyReadError::TimedOut(stage)),
        }
    }
}
