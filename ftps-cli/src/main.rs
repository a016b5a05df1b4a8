/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use clap_complete::Shell;
use tokio::net::TcpStream;
use yaml_rust::YamlLoader;

use ftps_client::{FtpClientConfig, FtpCommandError, FtpsClient};

mod connection;
mod logger;
mod tls;

mod cmd_del;
mod cmd_get;
mod cmd_list;
mod cmd_mkd;
mod cmd_put;
mod cmd_pwd;
mod cmd_rmd;
mod cmd_size;

use cmd_list::ListMode;

const GLOBAL_ARG_COMPLETION: &str = "completion";
const GLOBAL_ARG_SERVER: &str = "server";
const GLOBAL_ARG_USERNAME: &str = "username";
const GLOBAL_ARG_PASSWORD: &str = "password";
const GLOBAL_ARG_SOURCE_IP: &str = "source-ip";
const GLOBAL_ARG_TLS_NAME: &str = "tls-name";
const GLOBAL_ARG_CA_CERT: &str = "ca-cert";
const GLOBAL_ARG_CONFIG: &str = "config";
const GLOBAL_ARG_USE_HOST_ADDRESS: &str = "use-host-address";
const GLOBAL_ARG_CLEAR_DATA: &str = "clear-data";
const GLOBAL_ARG_VERBOSE: &str = "verbose";

const DEFAULT_FTP_PORT: u16 = 21;

fn build_cli_args() -> Command {
    Command::new("ftps")
        .arg(
            Arg::new(GLOBAL_ARG_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("FTPS server address, in form <host>[:<port>]")
                .num_args(1)
                .value_name("SERVER ADDRESS")
                .required_unless_present(GLOBAL_ARG_COMPLETION),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USERNAME)
                .help("FTP username")
                .num_args(1)
                .value_name("USERNAME")
                .short('u')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_PASSWORD)
                .help("FTP password")
                .num_args(1)
                .value_name("PASSWORD")
                .short('p')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SOURCE_IP)
                .help("source ip address")
                .num_args(1)
                .value_name("IP ADDRESS")
                .value_parser(value_parser!(IpAddr))
                .long("source")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_TLS_NAME)
                .help("TLS server name, default to the server host")
                .num_args(1)
                .value_name("SERVER NAME")
                .long(GLOBAL_ARG_TLS_NAME)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_CA_CERT)
                .help("PEM encoded CA certificate file, the system store is used if not set")
                .num_args(1)
                .value_name("CA CERT FILE")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Append)
                .long(GLOBAL_ARG_CA_CERT)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_CONFIG)
                .help("YAML client config file")
                .num_args(1)
                .value_name("CONFIG FILE")
                .value_parser(value_parser!(PathBuf))
                .long(GLOBAL_ARG_CONFIG)
                .short('c')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USE_HOST_ADDRESS)
                .help("Connect data channels to the control connection peer instead of the PASV address")
                .action(ArgAction::SetTrue)
                .long(GLOBAL_ARG_USE_HOST_ADDRESS)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_CLEAR_DATA)
                .help("Do not protect data channels (PROT C)")
                .action(ArgAction::SetTrue)
                .long(GLOBAL_ARG_CLEAR_DATA)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand(ListMode::Detailed.command())
        .subcommand(ListMode::Names.command())
        .subcommand(cmd_get::command())
        .subcommand(cmd_put::command())
        .subcommand(cmd_del::command())
        .subcommand(cmd_mkd::command())
        .subcommand(cmd_rmd::command())
        .subcommand(cmd_pwd::command())
        .subcommand(cmd_size::command())
}

/// Split `<host>[:<port>]`, IPv6 addresses with a port should be bracketed.
fn parse_server_addr(s: &str) -> anyhow::Result<(String, u16)> {
    if let Some(left) = s.strip_prefix('[') {
        let Some((host, right)) = left.split_once(']') else {
            return Err(anyhow!("unclosed bracket in server address {s}"));
        };
        let port = match right.strip_prefix(':') {
            Some(port) => {
                u16::from_str(port).map_err(|e| anyhow!("invalid port {port}: {e}"))?
            }
            None if right.is_empty() => DEFAULT_FTP_PORT,
            None => return Err(anyhow!("invalid server address {s}")),
        };
        return Ok((host.to_string(), port));
    }

    match s.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            if host.is_empty() {
                return Err(anyhow!("no host found in server address {s}"));
            }
            let port = u16::from_str(port).map_err(|e| anyhow!("invalid port {port}: {e}"))?;
            Ok((host.to_string(), port))
        }
        // bare IPv6 address
        Some(_) => Ok((s.to_string(), DEFAULT_FTP_PORT)),
        None if s.is_empty() => Err(anyhow!("empty server address")),
        None => Ok((s.to_string(), DEFAULT_FTP_PORT)),
    }
}

fn load_config(args: &ArgMatches) -> anyhow::Result<FtpClientConfig> {
    let mut config = match args.get_one::<PathBuf>(GLOBAL_ARG_CONFIG) {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow!("failed to read config file {}: {e}", path.display()))?;
            let docs = YamlLoader::load_from_str(&content)
                .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
            match docs.first() {
                Some(doc) => FtpClientConfig::parse_yaml(doc)
                    .context(format!("invalid client config in file {}", path.display()))?,
                None => FtpClientConfig::default(),
            }
        }
        None => FtpClientConfig::default(),
    };
    if args.get_flag(GLOBAL_ARG_USE_HOST_ADDRESS) {
        config.set_force_host_address(true);
    }
    Ok(config)
}

/// A failed QUIT is only logged, the subcommand result is returned as is.
fn finish_session(
    ret: anyhow::Result<()>,
    quit: Result<(), FtpCommandError>,
) -> anyhow::Result<()> {
    if let Err(e) = quit {
        log::warn!("failed to quit the session: {e}");
    }
    ret
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    if let Some(target) = args.get_one::<Shell>(GLOBAL_ARG_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(());
    }

    let verbose_level = args
        .get_one::<u8>(GLOBAL_ARG_VERBOSE)
        .copied()
        .unwrap_or_default();
    let logger = logger::SyncLogger::new(verbose_level);
    logger
        .into_global_logger()
        .map_err(|e| anyhow!("failed to setup logger: {e}"))?;

    let Some(server) = args.get_one::<String>(GLOBAL_ARG_SERVER) else {
        return Err(anyhow!("no server address set"));
    };
    let (host, port) = parse_server_addr(server)?;

    let username = args.get_one::<String>(GLOBAL_ARG_USERNAME);
    let password = args.get_one::<String>(GLOBAL_ARG_PASSWORD);

    let mut conn_provider = connection::LocalConnectionProvider::default();
    if let Some(ip) = args.get_one::<IpAddr>(GLOBAL_ARG_SOURCE_IP) {
        conn_provider.set_bind_ip(*ip);
    }

    let config = load_config(&args)?;

    let tls_name = args
        .get_one::<String>(GLOBAL_ARG_TLS_NAME)
        .unwrap_or(&host);
    let ca_cert_files: Vec<PathBuf> = args
        .get_many::<PathBuf>(GLOBAL_ARG_CA_CERT)
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    let tls_connector = tls::build_connector(tls_name, &ca_cert_files)?;

    let Some((subcommand, args)) = args.subcommand() else {
        return Err(anyhow!("no subcommand found"));
    };

    let mut client: FtpsClient<_, TcpStream, io::Error> =
        FtpsClient::connect_to(&host, port, conn_provider, tls_connector, &config).await?;
    client
        .login(username.map(|s| s.as_str()), password.map(|s| s.as_str()))
        .await?;
    if !args.get_flag(GLOBAL_ARG_CLEAR_DATA) {
        client.prot_p().await?;
    }

    let ret = if let Some(mode) = ListMode::from_command(subcommand) {
        cmd_list::run(&mut client, args, mode).await
    } else {
        match subcommand {
            cmd_get::COMMAND => cmd_get::run(&mut client, args).await,
            cmd_put::COMMAND => cmd_put::run(&mut client, args).await,
            cmd_del::COMMAND => cmd_del::run(&mut client, args).await,
            cmd_mkd::COMMAND => cmd_mkd::run(&mut client, args).await,
            cmd_rmd::COMMAND => cmd_rmd::run(&mut client, args).await,
            cmd_pwd::COMMAND => cmd_pwd::run(&mut client, args).await,
            cmd_size::COMMAND => cmd_size::run(&mut client, args).await,
            cmd => Err(anyhow!("invalid subcommand {cmd}")),
        }
    };

    let quit = client.quit_and_close().await;
    finish_session(ret, quit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_addr() {
        assert_eq!(
            parse_server_addr("ftp.example.net").unwrap(),
            ("ftp.example.net".to_string(), 21)
        );
        assert_eq!(
            parse_server_addr("ftp.example.net:990").unwrap(),
            ("ftp.example.net".to_string(), 990)
        );
        assert_eq!(
            parse_server_addr("192.0.2.1:2121").unwrap(),
            ("192.0.2.1".to_string(), 2121)
        );
        assert_eq!(
            parse_server_addr("2001:db8::1").unwrap(),
            ("2001:db8::1".to_string(), 21)
        );
        assert_eq!(
            parse_server_addr("[2001:db8::1]:2121").unwrap(),
            ("2001:db8::1".to_string(), 2121)
        );
        assert_eq!(
            parse_server_addr("[2001:db8::1]").unwrap(),
            ("2001:db8::1".to_string(), 21)
        );
        assert!(parse_server_addr("ftp.example.net:ftp").is_err());
        assert!(parse_server_addr("[2001:db8::1").is_err());
        assert!(parse_server_addr(":21").is_err());
        assert!(parse_server_addr("").is_err());
    }

    #[test]
    fn global_flags() {
        let args = build_cli_args()
            .try_get_matches_from([
                "ftps",
                "ftp.example.net",
                "--use-host-address",
                "--clear-data",
                "--ca-cert",
                "a.pem",
                "--ca-cert",
                "b.pem",
                "list",
                "/pub",
            ])
            .unwrap();
        assert!(args.get_flag(GLOBAL_ARG_USE_HOST_ADDRESS));
        assert!(args.get_flag(GLOBAL_ARG_CLEAR_DATA));
        assert_eq!(args.get_many::<PathBuf>(GLOBAL_ARG_CA_CERT).unwrap().count(), 2);

        let config = load_config(&args).unwrap();
        assert!(config.force_host_address());

        let (subcommand, _) = args.subcommand().unwrap();
        assert_eq!(ListMode::from_command(subcommand), Some(ListMode::Detailed));
    }

    #[test]
    fn quit_failure_after_subcommand() {
        let quit_err = || Err(FtpCommandError::ServiceNotAvailable);

        let e = finish_session(Err(anyhow!("no such file")), quit_err()).unwrap_err();
        assert_eq!(e.to_string(), "no such file");

        assert!(finish_session(Ok(()), quit_err()).is_ok());

        let e = finish_session(Err(anyhow!("no such file")), Ok(())).unwrap_err();
        assert_eq!(e.to_string(), "no such file");
    }
}
