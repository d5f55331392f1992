#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use arcade_directory::lobby::server::serve;
use arcade_directory::lobby::LobbyState;
use arcade_directory::logging;

/// Game lobby server: one process per game title, owning that title's room
/// table (§4.3 of the coordination protocol).
#[derive(Parser, Debug)]
#[command(name = "lobby-server")]
#[command(about = "Per-game lobby server for the arcade platform")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long)]
    port: u16,

    #[arg(long)]
    room_port_start: u16,

    /// Directory the game package was extracted into.
    #[arg(long)]
    game_dir: PathBuf,

    #[arg(long)]
    game_name: String,

    /// Path to the reference `room-server` binary, used when the package
    /// does not provide its own entry.
    #[arg(long)]
    room_server_binary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_with_config(&Default::default(), "arcade_directory");

    let room_server_binary = cli
        .room_server_binary
        .unwrap_or_else(|| sibling_binary("room-server"));

    let state = Arc::new(LobbyState::new(
        cli.host.clone(),
        cli.game_dir,
        cli.game_name.clone(),
        room_server_binary,
        cli.room_port_start,
    ));

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, game_name = %cli.game_name, "lobby server listening");

    serve(listener, state).await?;
    Ok(())
}

fn sibling_binary(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|dir| dir.join(name)))
        .unwrap_or_else(|| PathBuf::from(name))
}
