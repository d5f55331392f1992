//! Game Lobby Server (component D): one process per game, owning that
//! game's room table.

pub mod rooms;
pub mod server;

use std::path::PathBuf;
use std::sync::Arc;

use rooms::RoomsTable;

pub struct LobbyState {
    pub rooms: RoomsTable,
}

impl LobbyState {
    pub fn new(
        host: String,
        game_dir: PathBuf,
        game_name: String,
        room_server_binary: PathBuf,
        room_port_start: u16,
    ) -> Self {
        Self {
            rooms: RoomsTable::new(host, game_dir, game_name, room_server_binary, room_port_start),
        }
    }
}

pub type SharedLobbyState = Arc<LobbyState>;
