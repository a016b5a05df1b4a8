/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command, value_parser};
use tokio::io::{AsyncRead, AsyncWrite};

use ftps_client::{FtpConnectionProvider, FtpControlPeer, FtpsClient};

pub(super) const COMMAND: &str = "get";

const COMMAND_ARG_REMOTE_PATH: &str = "remote";
const COMMAND_ARG_LOCAL_PATH: &str = "local";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Download file, write to stdout if no local path is given")
        .arg(
            Arg::new(COMMAND_ARG_REMOTE_PATH)
                .value_name("REMOTE FILE PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_LOCAL_PATH)
                .value_name("LOCAL FILE PATH")
                .value_parser(value_parser!(PathBuf))
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
    let Some(remote_path) = args.get_one::<String>(COMMAND_ARG_REMOTE_PATH) else {
        return Err(anyhow!("no remote file path set"));
    };

    match args.get_one::<PathBuf>(COMMAND_ARG_LOCAL_PATH) {
        Some(local_path) => {
            let mut file = tokio::fs::File::create(local_path)
                .await
                .map_err(|e| anyhow!("failed to create file {}: {e}", local_path.display()))?;
            let data_stream = client.retrieve_file_start(remote_path).await?;
            let size = client
                .retrieve_file_receive(data_stream, &mut file)
                .await?;
            log::info!("received {size} bytes to {}", local_path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            let data_stream = client.retrieve_file_start(remote_path).await?;
            let size = client
                .retrieve_file_receive(data_stream, &mut stdout)
                .await?;
            log::info!("received {size} bytes");
        }
    }
    Ok(())
}
