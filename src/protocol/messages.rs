//! Per-`(type, action)` request/response payload shapes.
//!
//! Per the design notes ("heterogeneous `data` field"), the envelope's `data`
//! is decoded into one of these typed structs rather than passed around as a
//! free-form map.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------
// auth
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsernamePayload {
    pub username: String,
}

// ---------------------------------------------------------------------
// store
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub game_name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub min_players: u32,
    pub max_players: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lobby_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lobby_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GamesListResponse {
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameNameRequest {
    pub game_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPayload {
    pub username: String,
    pub score: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameDetailResponse {
    #[serde(flatten)]
    pub summary: GameSummary,
    pub comments: Vec<CommentPayload>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentRequest {
    pub game_name: String,
    pub score: i64,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadHeader {
    pub game_name: String,
    pub filename: String,
    pub filesize: u64,
    pub version: String,
}

// ---------------------------------------------------------------------
// dev
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UploadHeader {
    pub game_name: String,
    pub version: String,
    pub filename: String,
    pub filesize: u64,
    pub min_players: i64,
    pub max_players: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LobbyAddress {
    pub lobby_host: String,
    pub lobby_port: u16,
}

// ---------------------------------------------------------------------
// lobby
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub username: String,
    pub max_players: u32,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomRequest {
    pub room_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRoomRequest {
    pub username: String,
    #[serde(default)]
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomAddress {
    pub room_id: String,
    pub game_name: String,
    pub version: String,
    pub room_server_host: String,
    pub room_server_port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub game_name: String,
    pub version: String,
    pub host_username: String,
    pub max_players: u32,
    pub players: Vec<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomsListResponse {
    pub rooms: Vec<RoomSummary>,
}

// ---------------------------------------------------------------------
// game_config.json (read from an extracted package)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GameConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub entry_room_server: Option<String>,
    #[serde(default)]
    pub entry_client: Option<String>,
}

// ---------------------------------------------------------------------
// room server
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RoomJoinRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomJoinResponse {
    pub symbol: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomMoveRequest {
    pub username: String,
    pub cell: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomPlayAgainRequest {
    pub username: String,
    pub vote: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomStateSnapshot {
    pub board: [String; 9],
    pub players: std::collections::BTreeMap<String, String>,
    pub turn: Option<String>,
    pub winner: Option<String>,
}
