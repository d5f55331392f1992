//! The `lobbies` table (§3 "Running Lobby"): one entry per game with a
//! live lobby process, mutated only by the central server (§5).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;

use crate::metadata::Game;
use crate::portalloc::PortAllocator;
use crate::protocol::ErrorCode;
use crate::supervisor::{self, ChildHandle};

pub struct LobbyEntry {
    pub host: String,
    pub port: u16,
    pub child: ChildHandle,
}

/// Owns the per-game lobby-process table. Launch/stop of a given game's
/// lobby serializes on this table's lock (§5).
pub struct LobbiesTable {
    entries: Arc<Mutex<HashMap<String, LobbyEntry>>>,
    port_alloc: PortAllocator,
    lobby_binary: std::path::PathBuf,
}

impl LobbiesTable {
    pub fn new(host: &str, lobby_binary: std::path::PathBuf) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            port_alloc: PortAllocator::new(host),
            lobby_binary,
        }
    }

    /// Returns `(host, port)` for `game_name`'s lobby if one is currently
    /// alive, without starting anything.
    pub async fn running_address(&self, game_name: &str) -> Option<(String, u16)> {
        let guard = self.entries.lock().await;
        guard
            .get(game_name)
            .filter(|e| e.child.is_alive())
            .map(|e| (e.host.clone(), e.port))
    }

    /// Ensures a lobby process is running for `game`, spawning one if
    /// necessary. Returns its `(host, port)`.
    pub async fn launch(
        &self,
        game: &Game,
        host: &str,
        lobby_base_port: u16,
        room_base_port: u16,
    ) -> Result<(String, u16), ErrorCode> {
        let mut guard = self.entries.lock().await;
        if let Some(entry) = guard.get(&game.game_name) {
            if entry.child.is_alive() {
                return Ok((entry.host.clone(), entry.port));
            }
        }

        let port = self
            .port_alloc
            .allocate(lobby_base_port)
            .await
            .map_err(|_| ErrorCode::LaunchFailed)?;

        let mut cmd = Command::new(&self.lobby_binary);
        cmd.arg("--host")
            .arg(host)
            .arg("--port")
            .arg(port.to_string())
            .arg("--room-port-start")
            .arg(room_base_port.to_string())
            .arg("--game-dir")
            .arg(&game.extracted_path)
            .arg("--game-name")
            .arg(&game.game_name)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let game_name = game.game_name.clone();
        let entries_for_exit = self.entries.clone();

        let child = supervisor::spawn_supervised(cmd, move |pid| async move {
            let mut guard = entries_for_exit.lock().await;
            if guard.get(&game_name).map(|e| e.child.pid) == Some(pid) {
                guard.remove(&game_name);
            }
        })
        .map_err(|_| ErrorCode::LaunchFailed)?;

        guard.insert(
            game.game_name.clone(),
            LobbyEntry {
                host: host.to_string(),
                port,
                child,
            },
        );

        Ok((host.to_string(), port))
    }

    /// Stops `game_name`'s lobby if running. Per the open question in §9,
    /// this does not reach into the lobby's own rooms.
    pub async fn stop(&self, game_name: &str, stop_timeout: Duration) -> Result<(), ErrorCode> {
        let entry = {
            let mut guard = self.entries.lock().await;
            guard.remove(game_name)
        };
        match entry {
            Some(entry) => {
                supervisor::graceful_stop(&entry.child, stop_timeout).await;
                self.port_alloc.release(entry.port).await;
                Ok(())
            }
            None => Err(ErrorCode::StopFailed),
        }
    }
}
