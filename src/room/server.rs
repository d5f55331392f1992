//! Room server networking (§4.4): accepts per-player connections, each
//! driven by a read loop that mutates the shared [`GameState`] under its
//! lock and a writer task fed by an unbounded channel so broadcasts never
//! block on a slow peer.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, instrument, warn, Instrument};

use crate::protocol::framing::{read_line_raw, write_json_line};
use crate::protocol::messages::{RoomJoinRequest, RoomJoinResponse, RoomMoveRequest, RoomPlayAgainRequest};
use crate::protocol::{ErrorCode, RawRequest, RawResponse};

use super::state::{GameState, JoinOutcome};

const KIND: &str = "room";

pub type SharedGame = Arc<Mutex<GameState>>;

/// Runs the room server's accept loop. `shutdown` resolves when the
/// supervising lobby closes our stdin, signalling a polite stop (§4.5).
pub async fn serve(
    listener: TcpListener,
    game: SharedGame,
    mut shutdown: tokio::sync::oneshot::Receiver<()>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                let game = game.clone();
                tokio::spawn(
                    async move {
                        info!(%peer, "player connection accepted");
                        if let Err(err) = handle_connection(socket, game).await {
                            warn!(%peer, error = %err, "room connection ended with an error");
                        }
                    }
                    .instrument(tracing::info_span!("room_connection", %peer)),
                );
            }
            _ = &mut shutdown => {
                info!("stdin closed, shutting down room server");
                return Ok(());
            }
        }
    }
}

/// Watches stdin for EOF and resolves `tx` when it closes — the supervisor's
/// polite-stop contract (`supervisor::ChildHandle::request_stop`).
pub async fn watch_stdin_for_shutdown(tx: tokio::sync::oneshot::Sender<()>) {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut buf = String::new();
    loop {
        match stdin.read_line(&mut buf).await {
            Ok(0) => {
                let _ = tx.send(());
                return;
            }
            Ok(_) => buf.clear(),
            Err(_) => {
                let _ = tx.send(());
                return;
            }
        }
    }
}

#[instrument(skip(socket, game))]
async fn handle_connection(socket: TcpStream, game: SharedGame) -> std::io::Result<()> {
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);

    let line = match read_line_raw(&mut reader).await? {
        Some(line) => line,
        None => return Ok(()),
    };
    let request: RawRequest = match serde_json::from_str(&line) {
        Ok(req) => req,
        Err(_) => return Ok(()),
    };
    if request.kind != "room" || request.action != "join" {
        return Ok(());
    }
    let join_req: RoomJoinRequest = match serde_json::from_value(request.data) {
        Ok(r) => r,
        Err(_) => return Ok(()),
    };
    let username = join_req.username;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let outcome = {
        let mut state = game.lock().await;
        state.join(&username, tx)
    };

    let symbol = match outcome {
        JoinOutcome::Seated { symbol } => symbol,
        JoinOutcome::Full => {
            let mut write_half = write_half;
            let resp = RawResponse::err(KIND, "join", ErrorCode::RoomFull);
            write_json_line(&mut write_half, &resp).await?;
            return Ok(());
        }
    };

    let writer_task = {
        let mut write_half = write_half;
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if write_half.flush().await.is_err() {
                    break;
                }
            }
        })
    };

    {
        let mut state = game.lock().await;
        let resp = RawResponse::ok(
            KIND,
            "join",
            RoomJoinResponse {
                symbol,
                username: username.clone(),
            },
        );
        let line = serde_json::to_string(&resp).unwrap_or_default() + "\n";
        let _ = state.connections.get(&username).map(|tx| tx.send(line));
        state.broadcast(KIND);
    }

    loop {
        let line = match read_line_raw(&mut reader).await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let request: RawRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(_) => continue,
        };
        if request.kind != "room" {
            continue;
        }
        match request.action.as_str() {
            "move" => {
                if let Ok(req) = serde_json::from_value::<RoomMoveRequest>(request.data) {
                    if req.username == username {
                        let mut state = game.lock().await;
                        state.apply_move(&username, req.cell);
                        state.broadcast(KIND);
                    }
                }
            }
            "play_again" => {
                if let Ok(req) = serde_json::from_value::<RoomPlayAgainRequest>(request.data) {
                    if req.username == username {
                        let terminate = {
                            let mut state = game.lock().await;
                            let outcome = state.vote_play_again(&username, req.vote);
                            state.broadcast(KIND);
                            outcome == Some(false)
                        };
                        if terminate {
                            std::process::exit(0);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    {
        let mut state = game.lock().await;
        state.disconnect(&username);
        state.broadcast(KIND);
    }
    writer_task.abort();
    Ok(())
}
