//! Room Server (component E): authoritative per-match state and broadcast,
//! reference implementation of a 3x3 grid game (§4.4).

pub mod server;
pub mod state;
