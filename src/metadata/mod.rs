//! Metadata Store (component A): durable records for users, games, and
//! comments, behind a single process-wide exclusive critical section.
//!
//! The trait boundary mirrors the teacher's `GameDatabase` trait: a thin
//! `async_trait` interface in front of one in-process implementation
//! ([`store::JsonMetadataStore`]) so record shapes and call sites don't need
//! to change if a different backend is substituted later.

pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use store::JsonMetadataStore;

/// §3 User record. `username` is the primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password: String,
    /// Games this user has downloaded.
    pub games: Vec<String>,
    /// Games this user has authored (uploaded at least one version of).
    pub games_own: Vec<String>,
}

/// §3 Game record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub game_name: String,
    pub version: String,
    pub filename: String,
    pub storage_path: String,
    pub extracted_path: String,
    pub description: String,
    pub author: String,
    pub min_players: u32,
    pub max_players: u32,
}

/// §3 Comment record. At most one per `(game_name, username)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub game_name: String,
    pub username: String,
    pub score: u8,
    pub comment: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("user '{0}' already exists")]
    UserExists(String),
    #[error("no such user '{0}'")]
    NoSuchUser(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no such game '{0}'")]
    NoSuchGame(String),
    #[error("failed to persist metadata: {0}")]
    Io(#[from] std::io::Error),
}

/// Operations offered by the metadata store, per §4.2.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Loads any persisted snapshot from disk and ensures the storage root exists.
    async fn initialize_storage(&self) -> Result<(), MetadataError>;

    async fn get_user(&self, username: &str) -> Option<User>;

    async fn register_user(&self, username: &str, password: &str) -> Result<(), MetadataError>;

    async fn authenticate_user(&self, username: &str, password: &str) -> Result<(), MetadataError>;

    async fn list_games(&self) -> Vec<Game>;

    async fn get_game(&self, game_name: &str) -> Option<Game>;

    /// Insert a new game record, or update it in place if `game_name` already
    /// exists and `author` matches. Callers are responsible for the
    /// `GAME_EXISTS_OTHER_AUTHOR` precondition check before calling this.
    async fn upsert_game(&self, game: Game) -> Result<(), MetadataError>;

    async fn remove_game(&self, game_name: &str) -> Result<(), MetadataError>;

    /// Upsert-by-`(game_name, username)`: replaces any prior comment by the
    /// same user on the same game.
    async fn add_comment(&self, comment: Comment) -> Result<(), MetadataError>;

    async fn list_comments(&self, game_name: &str) -> Vec<Comment>;

    /// Records that `username` owns/downloaded `game_name` (idempotent),
    /// used both by the implicit download flow and the explicit
    /// `mark_owned` action.
    async fn record_download(&self, username: &str, game_name: &str) -> Result<(), MetadataError>;

    /// Records that `username` authored `game_name` (idempotent).
    async fn record_authorship(&self, username: &str, game_name: &str) -> Result<(), MetadataError>;

    /// Removes `game_name` from every user's `games`/`games_own` lists and
    /// deletes all of its comments. Called as part of `delete_game`.
    async fn prune_game_references(&self, game_name: &str);

    /// Ensures `<storage>/<game_name>/` exists on disk and returns its path.
    fn ensure_game_storage_dir(&self, game_name: &str) -> std::path::PathBuf;

    /// Root directory under which per-game storage subdirectories live.
    fn storage_root(&self) -> &std::path::Path;
}

/// Arithmetic mean of `scores`, rounded to one decimal place, or `None` when
/// `scores` is empty.
pub fn aggregate_rating(scores: &[u8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: u32 = scores.iter().map(|&s| s as u32).sum();
    let mean = sum as f64 / scores.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_is_none_for_no_comments() {
        assert_eq!(aggregate_rating(&[]), None);
    }

    #[test]
    fn rating_rounds_to_one_decimal() {
        assert_eq!(aggregate_rating(&[5, 4, 4]), Some(4.3));
        assert_eq!(aggregate_rating(&[1, 1, 1, 1]), Some(1.0));
        assert_eq!(aggregate_rating(&[5]), Some(5.0));
    }
}
