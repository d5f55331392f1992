//! `type: "store"` handlers: `list_games`, `get_game_detail`,
//! `download_game_file`, `add_comment`, `mark_owned` (§4.1). All require an
//! authenticated session.

use crate::central::session::Session;
use crate::central::CentralState;
use crate::metadata::{aggregate_rating, Comment, MetadataStore};
use crate::protocol::messages::{
    AddCommentRequest, CommentPayload, DownloadHeader, GameDetailResponse, GameNameRequest,
    GameSummary, GamesListResponse,
};
use crate::protocol::validation::validate_score;
use crate::protocol::{ErrorCode, RpcError};

async fn summarize(state: &CentralState, game: &crate::metadata::Game) -> GameSummary {
    let (lobby_host, lobby_port) = match state.lobbies.running_address(&game.game_name).await {
        Some((h, p)) => (Some(h), Some(p)),
        None => (None, None),
    };
    let description = if game.description.is_empty() {
        crate::storage::read_game_config(std::path::Path::new(&game.extracted_path))
            .and_then(|c| c.description)
            .unwrap_or_default()
    } else {
        game.description.clone()
    };
    GameSummary {
        game_name: game.game_name.clone(),
        version: game.version.clone(),
        author: game.author.clone(),
        description,
        min_players: game.min_players,
        max_players: game.max_players,
        lobby_host,
        lobby_port,
    }
}

pub async fn list_games(
    state: &CentralState,
    session: &Session,
) -> Result<GamesListResponse, RpcError> {
    session.require_auth().map_err(RpcError::new)?;
    let games = state.metadata.list_games().await;
    let mut summaries = Vec::with_capacity(games.len());
    for game in &games {
        summaries.push(summarize(state, game).await);
    }
    Ok(GamesListResponse { games: summaries })
}

pub async fn get_game_detail(
    state: &CentralState,
    session: &Session,
    req: GameNameRequest,
) -> Result<GameDetailResponse, RpcError> {
    session.require_auth().map_err(RpcError::new)?;
    let game = state
        .metadata
        .get_game(&req.game_name)
        .await
        .ok_or(RpcError::new(ErrorCode::GameNotFound))?;
    let summary = summarize(state, &game).await;
    let comments = state.metadata.list_comments(&req.game_name).await;
    let rating = aggregate_rating(&comments.iter().map(|c| c.score).collect::<Vec<_>>());
    let comments = comments
        .into_iter()
        .map(|c| CommentPayload {
            username: c.username,
            score: c.score,
            comment: c.comment,
        })
        .collect();
    Ok(GameDetailResponse {
        summary,
        comments,
        rating,
    })
}

/// On success, returns the header plus the exact bytes to stream afterward;
/// the dispatcher writes the header as a normal `ok` response then the raw
/// payload with no further delimiter (§6).
pub async fn download_game_file(
    state: &CentralState,
    session: &Session,
    req: GameNameRequest,
) -> Result<(DownloadHeader, Vec<u8>), RpcError> {
    let username = session
        .require_auth()
        .map_err(RpcError::new)?
        .to_string();
    let game = state
        .metadata
        .get_game(&req.game_name)
        .await
        .ok_or(RpcError::new(ErrorCode::GameNotFound))?;

    let path = std::path::Path::new(&game.storage_path);
    let bytes = std::fs::read(path).map_err(|_| RpcError::new(ErrorCode::GameOrVersionNotFound))?;

    state
        .metadata
        .record_download(&username, &game.game_name)
        .await
        .map_err(|_| RpcError::new(ErrorCode::GameNotFound))?;

    Ok((
        DownloadHeader {
            game_name: game.game_name,
            filename: game.filename,
            filesize: bytes.len() as u64,
            version: game.version,
        },
        bytes,
    ))
}

pub async fn add_comment(
    state: &CentralState,
    session: &Session,
    req: AddCommentRequest,
) -> Result<(), RpcError> {
    let username = session
        .require_auth()
        .map_err(RpcError::new)?
        .to_string();
    validate_score(req.score).map_err(|_| RpcError::new(ErrorCode::InvalidScore))?;
    state
        .metadata
        .get_game(&req.game_name)
        .await
        .ok_or(RpcError::new(ErrorCode::GameNotFound))?;

    state
        .metadata
        .add_comment(Comment {
            game_name: req.game_name,
            username,
            score: req.score as u8,
            comment: req.comment,
        })
        .await
        .map_err(|_| RpcError::new(ErrorCode::GameNotFound))?;
    Ok(())
}

pub async fn mark_owned(
    state: &CentralState,
    session: &Session,
    req: GameNameRequest,
) -> Result<(), RpcError> {
    let username = session
        .require_auth()
        .map_err(RpcError::new)?
        .to_string();
    state
        .metadata
        .get_game(&req.game_name)
        .await
        .ok_or(RpcError::new(ErrorCode::GameNotFound))?;
    state
        .metadata
        .record_download(&username, &req.game_name)
        .await
        .map_err(|_| RpcError::new(ErrorCode::GameNotFound))?;
    Ok(())
}
