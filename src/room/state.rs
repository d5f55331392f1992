//! Authoritative 3x3 grid-game state (§4.4), the reference room-server
//! pattern: a 9-cell board, two seated players, turn order, and a
//! play-again vote. Networking (`server.rs`) only ever mutates state
//! through these methods and broadcasts the resulting snapshot.

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::messages::RoomStateSnapshot;

const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub struct GameState {
    pub board: [String; 9],
    /// username -> symbol ("X" or "O")
    pub players: HashMap<String, String>,
    pub connections: HashMap<String, UnboundedSender<String>>,
    pub turn: Option<String>,
    pub winner: Option<String>,
    pub play_again_votes: HashMap<String, bool>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            board: Default::default(),
            players: HashMap::new(),
            connections: HashMap::new(),
            turn: None,
            winner: None,
            play_again_votes: HashMap::new(),
        }
    }
}

pub enum JoinOutcome {
    Seated { symbol: String },
    Full,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// First player gets `"X"`, second `"O"`. `turn` only starts once the
    /// second player joins.
    pub fn join(&mut self, username: &str, sender: UnboundedSender<String>) -> JoinOutcome {
        if let Some(symbol) = self.players.get(username) {
            self.connections.insert(username.to_string(), sender);
            return JoinOutcome::Seated {
                symbol: symbol.clone(),
            };
        }
        if self.players.len() >= 2 {
            return JoinOutcome::Full;
        }
        let symbol = if self.players.values().any(|s| s == "X") {
            "O"
        } else {
            "X"
        };
        self.players.insert(username.to_string(), symbol.to_string());
        self.connections.insert(username.to_string(), sender);

        if self.players.len() == 2 {
            let first = self
                .players
                .iter()
                .find(|(_, s)| *s == "X")
                .map(|(u, _)| u.clone());
            self.turn = first;
        }

        JoinOutcome::Seated {
            symbol: symbol.to_string(),
        }
    }

    /// Applies `username`'s move on `cell` if legal; returns whether it was
    /// applied. Silently ignored otherwise (§4.4).
    pub fn apply_move(&mut self, username: &str, cell: usize) -> bool {
        if self.winner.is_some() || cell >= 9 {
            return false;
        }
        if self.players.len() < 2 {
            return false;
        }
        if self.turn.as_deref() != Some(username) {
            return false;
        }
        if !self.board[cell].is_empty() {
            return false;
        }
        let symbol = match self.players.get(username) {
            Some(s) => s.clone(),
            None => return false,
        };
        self.board[cell] = symbol;

        let other = self
            .players
            .keys()
            .find(|u| u.as_str() != username)
            .cloned();
        self.turn = other.filter(|u| self.connections.contains_key(u));

        self.winner = self.compute_winner();
        true
    }

    fn compute_winner(&self) -> Option<String> {
        for line in WIN_LINES {
            let [a, b, c] = line;
            if !self.board[a].is_empty() && self.board[a] == self.board[b] && self.board[b] == self.board[c] {
                let symbol = &self.board[a];
                return self
                    .players
                    .iter()
                    .find(|(_, s)| *s == symbol)
                    .map(|(u, _)| u.clone());
            }
        }
        if self.board.iter().all(|c| !c.is_empty()) {
            return Some(String::new());
        }
        None
    }

    /// Records `username`'s play-again vote. Returns `Some(true)` once every
    /// seated player has voted `true` (board is reset), `Some(false)` once
    /// any player has voted `false` (room should terminate), or `None` while
    /// votes are still pending.
    pub fn vote_play_again(&mut self, username: &str, vote: bool) -> Option<bool> {
        self.play_again_votes.insert(username.to_string(), vote);

        if !self.players.keys().all(|u| self.play_again_votes.contains_key(u)) {
            return None;
        }
        if self.players.keys().any(|u| self.play_again_votes.get(u) == Some(&false)) {
            return Some(false);
        }
        self.reset_board();
        Some(true)
    }

    fn reset_board(&mut self) {
        self.board = Default::default();
        self.winner = None;
        self.play_again_votes.clear();
        self.turn = self
            .players
            .iter()
            .find(|(_, s)| *s == "X")
            .map(|(u, _)| u.clone())
            .or_else(|| self.players.keys().next().cloned());
    }

    /// Removes `username` from play. If fewer than two players remain, the
    /// round resets to the waiting-for-opponent state (§4.4).
    pub fn disconnect(&mut self, username: &str) {
        self.players.remove(username);
        self.connections.remove(username);
        self.play_again_votes.remove(username);

        if self.players.len() < 2 {
            self.board = Default::default();
            self.winner = None;
            self.play_again_votes.clear();
            self.turn = None;
        } else if self.turn.as_deref() == Some(username) {
            self.turn = self.players.keys().next().cloned();
        }
    }

    pub fn snapshot(&self) -> RoomStateSnapshot {
        RoomStateSnapshot {
            board: self.board.clone(),
            players: self.players.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            turn: self.turn.clone(),
            winner: self.winner.clone(),
        }
    }

    /// Serializes the current state once and sends it to every connection.
    /// Connections whose send fails are dropped (treated as a disconnect)
    /// after the broadcast, matching §4.4's "broadcast" contract.
    pub fn broadcast(&mut self, kind: &str) {
        let snapshot = self.snapshot();
        let envelope = crate::protocol::RawResponse::ok(kind, "state", snapshot);
        let line = match serde_json::to_string(&envelope) {
            Ok(mut s) => {
                s.push('\n');
                s
            }
            Err(_) => return,
        };

        let dead: Vec<String> = self
            .connections
            .iter()
            .filter(|(_, tx)| tx.send(line.clone()).is_err())
            .map(|(u, _)| u.clone())
            .collect();
        for username in dead {
            self.disconnect(&username);
        }
    }
}
