//! `type: "auth"` handlers: `register`, `login`, `logout` (§4.1).

use crate::central::session::{Session, SessionState};
use crate::central::CentralState;
use crate::metadata::MetadataStore;
use crate::protocol::messages::{CredentialsRequest, UsernamePayload};
use crate::protocol::validation::validate_username;
use crate::protocol::{ErrorCode, RpcError};

/// Allowed in any session state; does not change it.
pub async fn register(
    state: &CentralState,
    req: CredentialsRequest,
) -> Result<UsernamePayload, RpcError> {
    validate_username(&req.username).map_err(|_| RpcError::new(ErrorCode::InvalidUsername))?;
    state
        .metadata
        .register_user(&req.username, &req.password)
        .await
        .map_err(|_| RpcError::new(ErrorCode::UsernameExists))?;
    Ok(UsernamePayload {
        username: req.username,
    })
}

/// Requires `UNAUTH`; fails `USER_ALREADY_LOGGED_IN` if another session holds
/// this username.
pub async fn login(
    state: &CentralState,
    session: &mut Session,
    req: CredentialsRequest,
) -> Result<UsernamePayload, RpcError> {
    if session.username().is_some() {
        return Err(RpcError::new(ErrorCode::InvalidRequest));
    }
    state
        .metadata
        .authenticate_user(&req.username, &req.password)
        .await
        .map_err(|_| RpcError::new(ErrorCode::InvalidCredentials))?;

    state.sessions.try_claim(&req.username).await?;
    session.state = SessionState::Auth(req.username.clone());

    Ok(UsernamePayload {
        username: req.username,
    })
}

/// Requires `AUTH`.
pub async fn logout(state: &CentralState, session: &mut Session) -> Result<(), RpcError> {
    let username = session
        .username()
        .ok_or(RpcError::new(ErrorCode::NotLoggedIn))?
        .to_string();
    state.sessions.release(&username).await;
    session.state = SessionState::Unauth;
    Ok(())
}
