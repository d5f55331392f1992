//! Request-field validation shared by the central server and the lobby.
//!
//! Mirrors the teacher's `protocol::validation` module: one function per
//! field, returning a plain `Err(String)` reason that handlers attach to the
//! appropriate [`ErrorCode`](super::error_codes::ErrorCode).

/// Characters rejected in a username, per §3 ("rejects any of `<>:."/\\|?*`").
const FORBIDDEN_USERNAME_CHARS: &[char] = &['<', '>', ':', '"', '.', '/', '\\', '|', '?', '*'];

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("username cannot be empty".to_string());
    }
    if let Some(bad) = username.chars().find(|c| FORBIDDEN_USERNAME_CHARS.contains(c)) {
        return Err(format!("username cannot contain '{bad}'"));
    }
    Ok(())
}

pub fn validate_players(min_players: i64, max_players: i64) -> Result<(), String> {
    if min_players < 1 {
        return Err("min_players must be at least 1".to_string());
    }
    if max_players < min_players {
        return Err("max_players must be >= min_players".to_string());
    }
    Ok(())
}

pub fn validate_score(score: i64) -> Result<(), String> {
    if !(1..=5).contains(&score) {
        return Err("score must be between 1 and 5".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_forbidden_username_characters() {
        for c in FORBIDDEN_USERNAME_CHARS {
            let name = format!("alice{c}");
            assert!(validate_username(&name).is_err(), "expected {name:?} to be rejected");
        }
    }

    #[test]
    fn accepts_plain_username() {
        assert!(validate_username("alice_01").is_ok());
    }

    #[test]
    fn players_range() {
        assert!(validate_players(1, 1).is_ok());
        assert!(validate_players(2, 4).is_ok());
        assert!(validate_players(0, 4).is_err());
        assert!(validate_players(4, 2).is_err());
    }

    #[test]
    fn score_range() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(5).is_ok());
        assert!(validate_score(0).is_err());
        assert!(validate_score(6).is_err());
    }
}
