/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command, value_parser};
use tokio::io::{AsyncRead, AsyncWrite};

use ftps_client::{FtpConnectionProvider, FtpControlPeer, FtpsClient};

pub(super) const COMMAND: &str = "put";

const COMMAND_ARG_LOCAL_PATH: &str = "local";
const COMMAND_ARG_REMOTE_PATH: &str = "remote";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Upload file, the remote path default to the local file name")
        .arg(
            Arg::new(COMMAND_ARG_LOCAL_PATH)
                .value_name("LOCAL FILE PATH")
                .value_parser(value_parser!(PathBuf))
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_REMOTE_PATH)
                .value_name("REMOTE FILE PATH")
                .num_args(1),
        )
}

pub(super) async fn run<CP, S, E>(
    client: &mut FtpsClient<CP, S, E>,
    args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S, E>,
    S: AsyncRead + AsyncWrite + FtpControlPeer + Unpin + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    let Some(local_path) = args.get_one::<PathBuf>(COMMAND_ARG_LOCAL_PATH) else {
        return Err(anyhow!("no local file path set"));
    };
    let remote_path = match args.get_one::<String>(COMMAND_ARG_REMOTE_PATH) {
        Some(path) => path.to_string(),
        None => local_path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("no valid file name in {}", local_path.display()))?,
    };

    let mut file = tokio::fs::File::open(local_path)
        .await
        .map_err(|e| anyhow!("failed to open file {}: {e}", local_path.display()))?;
    let data_stream = client.store_file_start(&remote_path).await?;
    let size = client.store_file_send(data_stream, &mut file).await?;
    log::info!("sent {size} bytes to {remote_path}");
    Ok(())
}
