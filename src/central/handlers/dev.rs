//! `type: "dev"` handlers: `upload_game_file`, `launch_game_server`,
//! `stop_game_server`, `delete_game` (§4.1). All require an authenticated
//! session; ownership is enforced where applicable.

use std::time::Duration;

use crate::central::session::Session;
use crate::central::CentralState;
use crate::metadata::{Game, MetadataStore};
use crate::protocol::messages::{GameNameRequest, LobbyAddress, UploadHeader};
use crate::protocol::validation::validate_players;
use crate::protocol::{ErrorCode, RpcError};
use crate::storage;

pub async fn upload_game_file(
    state: &CentralState,
    session: &Session,
    header: UploadHeader,
    payload: Vec<u8>,
) -> Result<(), RpcError> {
    let username = session
        .require_auth()
        .map_err(RpcError::new)?
        .to_string();

    validate_players(header.min_players, header.max_players)
        .map_err(|_| RpcError::new(ErrorCode::InvalidPlayers))?;

    if payload.len() as u64 != header.filesize {
        return Err(RpcError::new(ErrorCode::UploadFailed));
    }

    if let Some(existing) = state.metadata.get_game(&header.game_name).await {
        if existing.author != username {
            return Err(RpcError::new(ErrorCode::GameExistsOtherAuthor));
        }
    }

    let game_dir = state.metadata.ensure_game_storage_dir(&header.game_name);
    let archive_path = storage::store_archive(&game_dir, &header.filename, &payload)
        .map_err(|_| RpcError::new(ErrorCode::UploadFailed))?;

    let extracted_path = storage::extract_archive(&game_dir, &payload)
        .map_err(|_| RpcError::new(ErrorCode::UnzipFailed))?;

    let description = storage::read_game_config(&extracted_path)
        .and_then(|c| c.description)
        .unwrap_or_default();

    state
        .metadata
        .upsert_game(Game {
            game_name: header.game_name.clone(),
            version: header.version,
            filename: header.filename,
            storage_path: archive_path.to_string_lossy().into_owned(),
            extracted_path: extracted_path.to_string_lossy().into_owned(),
            description,
            author: username.clone(),
            min_players: header.min_players as u32,
            max_players: header.max_players as u32,
        })
        .await
        .map_err(|_| RpcError::new(ErrorCode::UploadFailed))?;

    state
        .metadata
        .record_authorship(&username, &header.game_name)
        .await
        .map_err(|_| RpcError::new(ErrorCode::UploadFailed))?;

    Ok(())
}

pub async fn launch_game_server(
    state: &CentralState,
    session: &Session,
    req: GameNameRequest,
) -> Result<LobbyAddress, RpcError> {
    session.require_auth().map_err(RpcError::new)?;

    let mut game = state
        .metadata
        .get_game(&req.game_name)
        .await
        .ok_or(RpcError::new(ErrorCode::GameNotFound))?;

    let extracted = std::path::Path::new(&game.extracted_path);
    if !extracted.exists() {
        let game_dir = state.metadata.ensure_game_storage_dir(&game.game_name);
        let archive = std::fs::read(&game.storage_path)
            .map_err(|_| RpcError::new(ErrorCode::LaunchFailed))?;
        let extracted_path = storage::extract_archive(&game_dir, &archive)
            .map_err(|_| RpcError::new(ErrorCode::LaunchFailed))?;
        game.extracted_path = extracted_path.to_string_lossy().into_owned();
        let _ = state.metadata.upsert_game(game.clone()).await;
    }

    let (host, port) = state
        .lobbies
        .launch(&game, &state.host, state.lobby_base_port, state.room_base_port)
        .await?;

    Ok(LobbyAddress {
        lobby_host: host,
        lobby_port: port,
    })
}

pub async fn stop_game_server(
    state: &CentralState,
    session: &Session,
    req: GameNameRequest,
) -> Result<(), RpcError> {
    session.require_auth().map_err(RpcError::new)?;
    state
        .lobbies
        .stop(
            &req.game_name,
            Duration::from_secs(state.config.stop_timeout_secs),
        )
        .await?;
    Ok(())
}

pub async fn delete_game(
    state: &CentralState,
    session: &Session,
    req: GameNameRequest,
) -> Result<(), RpcError> {
    let username = session
        .require_auth()
        .map_err(RpcError::new)?
        .to_string();

    let game = state
        .metadata
        .get_game(&req.game_name)
        .await
        .ok_or(RpcError::new(ErrorCode::GameNotFound))?;
    if game.author != username {
        return Err(RpcError::new(ErrorCode::NotOwner));
    }

    let _ = state
        .lobbies
        .stop(
            &req.game_name,
            Duration::from_secs(state.config.stop_timeout_secs),
        )
        .await;

    let game_dir = state.metadata.ensure_game_storage_dir(&game.game_name);
    let _ = storage::remove_game_dir(&game_dir);

    state.metadata.prune_game_references(&req.game_name).await;
    state
        .metadata
        .remove_game(&req.game_name)
        .await
        .map_err(|_| RpcError::new(ErrorCode::GameNotFound))?;

    Ok(())
}
