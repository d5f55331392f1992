use serde::{Deserialize, Serialize};

/// Wire-level error codes returned in `{"error": {"code": ..., "message": ...}}`.
///
/// Every variant here is produced by at least one handler in [`crate::central`],
/// [`crate::lobby`], or the framing layer itself; see each module for call sites.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client-format errors
    InvalidRequest,
    InvalidJson,
    UnknownType,
    Unsupported,

    // Auth / session precondition errors
    InvalidUsername,
    UsernameExists,
    InvalidCredentials,
    UserAlreadyLoggedIn,
    NotLoggedIn,
    NotAuthenticated,

    // Store precondition/resource errors
    GameNotFound,
    GameOrVersionNotFound,
    GameExistsOtherAuthor,
    InvalidPlayers,
    UploadFailed,
    UnzipFailed,
    NotOwner,
    InvalidScore,

    // Dev / lobby-control errors
    LaunchFailed,
    StopFailed,

    // Lobby errors
    AlreadyInRoom,
    RoomNotFound,
    RoomNotJoinable,
    RoomFull,
    RoomServerMissing,
    RoomServerFailed,
}

impl ErrorCode {
    /// Human-readable default message, used when a handler doesn't supply its own.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "the request could not be parsed",
            Self::InvalidJson => "the request line was not valid JSON",
            Self::UnknownType => "unknown request type",
            Self::Unsupported => "unsupported action for this type",
            Self::InvalidUsername => "username contains characters that are not allowed",
            Self::UsernameExists => "a user with this username already exists",
            Self::InvalidCredentials => "username or password is incorrect",
            Self::UserAlreadyLoggedIn => "this user is already logged in from another session",
            Self::NotLoggedIn => "you are not logged in",
            Self::NotAuthenticated => "this action requires an authenticated session",
            Self::GameNotFound => "no game with that name exists",
            Self::GameOrVersionNotFound => "the game file is not available on disk",
            Self::GameExistsOtherAuthor => "a game with this name already exists under another author",
            Self::InvalidPlayers => "min_players/max_players are out of range",
            Self::UploadFailed => "the upload did not complete",
            Self::UnzipFailed => "the uploaded archive could not be extracted",
            Self::NotOwner => "you are not the author of this game",
            Self::InvalidScore => "score must be between 1 and 5",
            Self::LaunchFailed => "the lobby process could not be started",
            Self::StopFailed => "the lobby process could not be stopped",
            Self::AlreadyInRoom => "you are already in a waiting room on this lobby",
            Self::RoomNotFound => "no room with that id exists",
            Self::RoomNotJoinable => "this room is not accepting new players",
            Self::RoomFull => "this room has reached its player limit",
            Self::RoomServerMissing => "the game package does not provide a room server entry",
            Self::RoomServerFailed => "the room server process could not be started",
        }
    }
}
