#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use arcade_directory::central::server::serve;
use arcade_directory::central::CentralState;
use arcade_directory::config;
use arcade_directory::logging;
use arcade_directory::metadata::MetadataStore;

/// Central directory server: accepts player/developer sessions and owns the
/// lobby-process table.
#[derive(Parser, Debug)]
#[command(name = "central-server")]
#[command(about = "Central directory server for the arcade platform")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 9000)]
    port: u16,

    #[arg(long, default_value_t = 11000)]
    lobby_base_port: u16,

    #[arg(long, default_value_t = 12000)]
    room_base_port: u16,

    /// Base directory for the metadata store and package storage.
    #[arg(long, default_value = "./arcade-data")]
    base_dir: PathBuf,

    /// Path to the `lobby-server` binary to spawn on `launch_game_server`.
    /// Defaults to the binary built alongside this one.
    #[arg(long)]
    lobby_binary: Option<PathBuf>,

    /// Optional JSON file with ambient `RuntimeConfig` overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the resolved configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref());

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    logging::init_with_config(&cfg.logging, "arcade_directory");

    let lobby_binary = cli
        .lobby_binary
        .unwrap_or_else(|| sibling_binary("lobby-server"));

    let state = Arc::new(CentralState::new(
        cli.base_dir,
        cli.host.clone(),
        cli.lobby_base_port,
        cli.room_base_port,
        lobby_binary,
        cfg,
    ));
    state.metadata.initialize_storage().await?;

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "central server listening");

    serve(listener, state).await?;
    Ok(())
}

fn sibling_binary(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|dir| dir.join(name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn defaults_match_spec_ports() {
        let cli = Cli::try_parse_from(["central-server"]).unwrap();
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.lobby_base_port, 11000);
        assert_eq!(cli.room_base_port, 12000);
    }

    #[test]
    fn accepts_explicit_flags() {
        let cli = Cli::try_parse_from([
            "central-server",
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--lobby-base-port",
            "20000",
        ])
        .unwrap();
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 9100);
        assert_eq!(cli.lobby_base_port, 20000);
    }

    #[test]
    fn print_config_parses() {
        let cli = Cli::try_parse_from(["central-server", "--print-config"]).unwrap();
        assert!(cli.print_config);
    }
}
