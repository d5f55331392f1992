#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::{oneshot, Mutex};

use arcade_directory::logging;
use arcade_directory::room::server::{serve, watch_stdin_for_shutdown};
use arcade_directory::room::state::GameState;

/// Reference room server: authoritative state for one match of the 3x3
/// grid game (§4.4). Every game package's room-server entry must honor this
/// CLI contract (§6) even when it isn't this binary.
#[derive(Parser, Debug)]
#[command(name = "room-server")]
#[command(about = "Reference grid-game room server")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long)]
    port: u16,

    #[arg(long)]
    max_players: u32,

    #[arg(long)]
    game_name: String,

    #[arg(long)]
    room_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_with_config(&Default::default(), "arcade_directory");

    let game = Arc::new(Mutex::new(GameState::new()));
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, room_id = %cli.room_id, game_name = %cli.game_name, "room server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(watch_stdin_for_shutdown(shutdown_tx));

    serve(listener, game, shutdown_rx).await?;
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn parses_full_invocation() {
        let cli = Cli::try_parse_from([
            "room-server",
            "--port",
            "12000",
            "--max-players",
            "2",
            "--game-name",
            "tictactoe",
            "--room-id",
            "R1",
        ])
        .unwrap();
        assert_eq!(cli.port, 12000);
        assert_eq!(cli.max_players, 2);
        assert_eq!(cli.room_id, "R1");
    }
}
