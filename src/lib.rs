#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Arcade Directory
//!
//! A three-tier game-hosting platform: a central directory server where
//! developers upload game packages and players browse/install them,
//! per-game lobby processes that maintain room lists for one title, and
//! per-room game-server processes that run the authoritative gameplay loop
//! for a single match.

/// Central Directory Server: sessions, `auth`/`store`/`dev` routing, and the
/// running-lobby table.
pub mod central;

/// Ambient runtime configuration shared by all three binaries.
pub mod config;

/// Game Lobby Server: per-game room table and room-server spawning.
pub mod lobby;

/// Structured logging configuration.
pub mod logging;

/// Metadata Store: durable records for users, games, and comments.
pub mod metadata;

/// Port Allocator: serialized free-port allocation from a base range.
pub mod portalloc;

/// Wire protocol: envelopes, framing, error codes, and per-action payloads.
pub mod protocol;

/// Room Server: authoritative grid-game state and broadcast.
pub mod room;

/// Package Store: archive storage and extraction.
pub mod storage;

/// Subprocess Supervisor: spawn, track, and reap child processes.
pub mod supervisor;
