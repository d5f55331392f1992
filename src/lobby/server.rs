//! Lobby TCP accept loop and dispatch for `type: "lobby"` requests (§4.3).

use serde_json::Value;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, instrument, warn, Instrument};

use crate::protocol::framing::{read_line_raw, write_json_line};
use crate::protocol::messages::{CreateRoomRequest, JoinRoomRequest, LeaveRoomRequest};
use crate::protocol::{ErrorCode, RawRequest, RawResponse, RpcError};

use super::SharedLobbyState;

const KIND: &str = "lobby";

pub async fn serve(listener: TcpListener, state: SharedLobbyState) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(
            async move {
                info!(%peer, "lobby connection accepted");
                if let Err(err) = handle_connection(socket, state).await {
                    warn!(%peer, error = %err, "lobby connection ended with an error");
                }
            }
            .instrument(tracing::info_span!("lobby_connection", %peer)),
        );
    }
}

#[instrument(skip(socket, state))]
async fn handle_connection(socket: TcpStream, state: SharedLobbyState) -> std::io::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let line = match read_line_raw(&mut reader).await? {
            Some(line) => line,
            None => break,
        };

        let request: RawRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(_) => {
                let resp = RawResponse::err(KIND, "unknown", ErrorCode::InvalidJson);
                write_json_line(&mut write_half, &resp).await?;
                continue;
            }
        };

        let action = request.action.clone();
        let result = dispatch(&state, &request.kind, &action, request.data).await;
        let response = match result {
            Ok(data) => RawResponse::ok(KIND, action.clone(), data),
            Err(err) => err.into_response(KIND, action.clone()),
        };
        write_json_line(&mut write_half, &response).await?;
    }
    Ok(())
}

async fn dispatch(
    state: &SharedLobbyState,
    kind: &str,
    action: &str,
    data: Value,
) -> Result<Value, RpcError> {
    if kind != "lobby" {
        return Err(RpcError::new(ErrorCode::UnknownType));
    }

    let value = match action {
        "create_room" => {
            let req: CreateRoomRequest = decode(data)?;
            let address = state
                .rooms
                .create_room(req.username, req.max_players, req.version)
                .await?;
            to_value(address)
        }
        "join_room" => {
            let req: JoinRoomRequest = decode(data)?;
            let address = state.rooms.join_room(&req.room_id, req.username).await?;
            to_value(address)
        }
        "leave_room" => {
            let req: LeaveRoomRequest = decode(data)?;
            state
                .rooms
                .leave_room(req.room_id.as_deref(), &req.username)
                .await;
            Value::Object(serde_json::Map::new())
        }
        "list_rooms" => to_value(state.rooms.list_rooms().await),
        _ => return Err(RpcError::new(ErrorCode::Unsupported)),
    };
    Ok(value)
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, RpcError> {
    serde_json::from_value(data).map_err(|_| RpcError::new(ErrorCode::InvalidRequest))
}

fn to_value<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
