/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

#[cfg(feature = "yaml")]
mod yaml;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpControlConfig {
    pub(crate) max_line_len: usize,
    pub(crate) max_multi_lines: usize,
    pub(crate) command_timeout: Duration,
}

impl Default for FtpControlConfig {
    fn default() -> Self {
        FtpControlConfig {
            max_line_len: 2048,
            max_multi_lines: 128,
            command_timeout: Duration::from_secs(10),
        }
    }
}

impl FtpControlConfig {
    pub fn set_max_line_len(&mut self, len: usize) {
        self.max_line_len = len.max(8);
    }

    pub fn set_max_multi_lines(&mut self, lines: usize) {
        self.max_multi_lines = lines;
    }

    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.command_timeout = timeout;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpTransferConfig {
    pub(crate) list_max_line_len: usize,
    pub(crate) list_max_entries: usize,
    pub(crate) list_all_timeout: Duration,
    pub(crate) end_wait_timeout: Duration,
}

impl Default for FtpTransferConfig {
    fn default() -> Self {
        FtpTransferConfig {
            list_max_line_len: 2048,
            list_max_entries: 1024 * 1024,
            list_all_timeout: Duration::from_secs(120),
            end_wait_timeout: Duration::from_secs(2),
        }
    }
}

impl FtpTransferConfig {
    pub fn set_list_max_line_len(&mut self, len: usize) {
        self.list_max_line_len = len.max(8);
    }

    pub fn set_list_max_entries(&mut self, max: usize) {
        self.list_max_entries = max;
    }

    pub fn set_list_all_timeout(&mut self, timeout: Duration) {
        self.list_all_timeout = timeout;
    }

    pub fn set_end_wait_timeout(&mut self, timeout: Duration) {
        self.end_wait_timeout = timeout;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpClientConfig {
    pub(crate) control: FtpControlConfig,
    pub(crate) transfer: FtpTransferConfig,
    pub(crate) connect_timeout: Duration,
    pub(crate) greeting_timeout: Duration,
    pub(crate) tls_handshake_timeout: Duration,
    pub(crate) force_host_address: bool,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            control: Default::default(),
            transfer: Default::default(),
            connect_timeout: Duration::from_secs(30),
            greeting_timeout: Duration::from_secs(10),
            tls_handshake_timeout: Duration::from_secs(10),
            force_host_address: false,
        }
    }
}

impl FtpClientConfig {
    pub fn control_mut(&mut self) -> &mut FtpControlConfig {
        &mut self.control
    }

    pub fn transfer_mut(&mut self) -> &mut FtpTransferConfig {
        &mut self.transfer
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_greeting_timeout(&mut self, timeout: Duration) {
        self.greeting_timeout = timeout;
    }

    pub fn set_tls_handshake_timeout(&mut self, timeout: Duration) {
        self.tls_handshake_timeout = timeout;
    }

    /// Initial value of the force host address flag for new sessions.
    pub fn set_force_host_address(&mut self, enable: bool) {
        self.force_host_address = enable;
    }

    #[inline]
    pub fn force_host_address(&self) -> bool {
        self.force_host_address
    }
}
