//! Central Directory Server (component C): accepts client sessions, routes
//! `auth`/`store`/`dev` messages, and owns the lobby-process table.

pub mod handlers;
pub mod lobbies;
pub mod server;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::metadata::JsonMetadataStore;

use lobbies::LobbiesTable;
use session::ActiveSessions;

/// Shared state handed to every connection handler. Each table guards its own
/// data with its own lock (§5); nothing here is mutated without going through
/// one of those tables.
pub struct CentralState {
    pub metadata: JsonMetadataStore,
    pub sessions: ActiveSessions,
    pub lobbies: LobbiesTable,
    pub host: String,
    pub lobby_base_port: u16,
    pub room_base_port: u16,
    pub config: RuntimeConfig,
}

impl CentralState {
    pub fn new(
        base_dir: PathBuf,
        host: String,
        lobby_base_port: u16,
        room_base_port: u16,
        lobby_binary: PathBuf,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            metadata: JsonMetadataStore::new(&base_dir),
            sessions: ActiveSessions::new(),
            lobbies: LobbiesTable::new(&host, lobby_binary),
            host,
            lobby_base_port,
            room_base_port,
            config,
        }
    }
}

pub type SharedState = Arc<CentralState>;
