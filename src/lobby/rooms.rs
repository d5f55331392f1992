//! The per-lobby `rooms` table (§4.3): owned exclusively by one lobby
//! process, mutated only through this table's lock.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::Mutex;

use crate::portalloc::PortAllocator;
use crate::protocol::messages::{RoomAddress, RoomSummary, RoomsListResponse};
use crate::protocol::ErrorCode;
use crate::storage;
use crate::supervisor::{self, ChildHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    Closed,
}

impl RoomStatus {
    fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Closed => "closed",
        }
    }
}

pub struct Room {
    pub room_id: String,
    pub game_name: String,
    pub version: String,
    pub host_username: String,
    pub max_players: u32,
    pub players: Vec<String>,
    pub room_server_host: String,
    pub room_server_port: u16,
    pub child: Option<ChildHandle>,
    pub status: RoomStatus,
}

pub struct RoomsTable {
    rooms: Arc<Mutex<HashMap<String, Room>>>,
    counter: AtomicU32,
    host: String,
    game_dir: PathBuf,
    game_name: String,
    room_server_binary: PathBuf,
    port_alloc: PortAllocator,
    room_port_start: u16,
}

impl RoomsTable {
    pub fn new(
        host: String,
        game_dir: PathBuf,
        game_name: String,
        room_server_binary: PathBuf,
        room_port_start: u16,
    ) -> Self {
        let port_alloc = PortAllocator::new(host.clone());
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            counter: AtomicU32::new(0),
            host,
            game_dir,
            game_name,
            room_server_binary,
            port_alloc,
            room_port_start,
        }
    }

    fn next_room_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("R{n}")
    }

    /// §4.3 "a given username appears in at most one `waiting` room".
    /// `excluding` lets a caller check for membership in some *other*
    /// waiting room without rejecting a rejoin of the room itself.
    async fn username_in_other_waiting_room(&self, username: &str, excluding: &str) -> bool {
        let guard = self.rooms.lock().await;
        guard.values().any(|r| {
            r.room_id != excluding
                && r.status == RoomStatus::Waiting
                && r.players.iter().any(|p| p == username)
        })
    }

    pub async fn create_room(
        &self,
        username: String,
        max_players: u32,
        version: String,
    ) -> Result<RoomAddress, ErrorCode> {
        if self.username_in_other_waiting_room(&username, "").await {
            return Err(ErrorCode::AlreadyInRoom);
        }

        let room_id = self.next_room_id();
        let port = self
            .port_alloc
            .allocate(self.room_port_start)
            .await
            .map_err(|_| ErrorCode::RoomServerFailed)?;

        let entry = storage::resolve_room_server_entry(&self.game_dir);
        let mut cmd = match entry {
            Some(path) => Command::new(path),
            None => Command::new(&self.room_server_binary),
        };
        cmd.arg("--host")
            .arg(&self.host)
            .arg("--port")
            .arg(port.to_string())
            .arg("--max-players")
            .arg(max_players.to_string())
            .arg("--game-name")
            .arg(&self.game_name)
            .arg("--room-id")
            .arg(&room_id)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let rooms_for_exit = self.rooms.clone();
        let room_id_for_exit = room_id.clone();
        let child = supervisor::spawn_supervised(cmd, move |pid| async move {
            let mut guard = rooms_for_exit.lock().await;
            if let Some(room) = guard.get_mut(&room_id_for_exit) {
                if room.child.as_ref().and_then(|c| c.pid) == pid {
                    room.status = RoomStatus::Closed;
                }
            }
        })
        .map_err(|_| ErrorCode::RoomServerFailed)?;

        let room = Room {
            room_id: room_id.clone(),
            game_name: self.game_name.clone(),
            version: version.clone(),
            host_username: username.clone(),
            max_players,
            players: vec![username],
            room_server_host: self.host.clone(),
            room_server_port: port,
            child: Some(child),
            status: RoomStatus::Waiting,
        };

        let address = RoomAddress {
            room_id: room.room_id.clone(),
            game_name: room.game_name.clone(),
            version: room.version.clone(),
            room_server_host: room.room_server_host.clone(),
            room_server_port: room.room_server_port,
        };

        self.rooms.lock().await.insert(room_id, room);
        Ok(address)
    }

    pub async fn join_room(&self, room_id: &str, username: String) -> Result<RoomAddress, ErrorCode> {
        if self.username_in_other_waiting_room(&username, room_id).await {
            return Err(ErrorCode::AlreadyInRoom);
        }

        let mut guard = self.rooms.lock().await;
        let room = guard.get_mut(room_id).ok_or(ErrorCode::RoomNotFound)?;
        if room.status != RoomStatus::Waiting {
            return Err(ErrorCode::RoomNotJoinable);
        }
        if !room.players.iter().any(|p| p == &username) {
            if room.players.len() as u32 >= room.max_players {
                return Err(ErrorCode::RoomFull);
            }
            room.players.push(username);
        }

        Ok(RoomAddress {
            room_id: room.room_id.clone(),
            game_name: room.game_name.clone(),
            version: room.version.clone(),
            room_server_host: room.room_server_host.clone(),
            room_server_port: room.room_server_port,
        })
    }

    /// Removes `username` from `room_id` if given, else from any room in
    /// this lobby. Does not touch the room's child process (§4.3).
    pub async fn leave_room(&self, room_id: Option<&str>, username: &str) {
        let mut guard = self.rooms.lock().await;
        match room_id {
            Some(id) => {
                if let Some(room) = guard.get_mut(id) {
                    room.players.retain(|p| p != username);
                }
            }
            None => {
                for room in guard.values_mut() {
                    room.players.retain(|p| p != username);
                }
            }
        }
    }

    pub async fn list_rooms(&self) -> RoomsListResponse {
        let guard = self.rooms.lock().await;
        let rooms = guard
            .values()
            .map(|r| RoomSummary {
                room_id: r.room_id.clone(),
                game_name: r.game_name.clone(),
                version: r.version.clone(),
                host_username: r.host_username.clone(),
                max_players: r.max_players,
                players: r.players.clone(),
                status: r.status.as_str().to_string(),
            })
            .collect();
        RoomsListResponse { rooms }
    }
}
