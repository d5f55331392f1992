//! Central server TCP accept loop and per-connection dispatch (§4.1, §6).

use serde_json::Value;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::protocol::framing::{read_exact_payload, read_line_raw, write_json_line, write_payload};
use crate::protocol::messages::{
    AddCommentRequest, CredentialsRequest, GameNameRequest, UploadHeader,
};
use crate::protocol::{ErrorCode, RawRequest, RawResponse, RpcError};

use super::handlers::{auth, dev, store};
use super::session::Session;
use super::SharedState;

const KIND: &str = "auth_store_dev";

/// Runs the central server's TCP accept loop until the process is killed.
pub async fn serve(listener: TcpListener, state: SharedState) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        let state = state.clone();
        let session_id = Uuid::new_v4();
        tokio::spawn(
            async move {
                info!(%peer, "connection accepted");
                if let Err(err) = handle_connection(socket, state.clone()).await {
                    warn!(%peer, error = %err, "connection ended with an error");
                } else {
                    info!(%peer, "connection closed");
                }
            }
            .instrument(tracing::info_span!("central_connection", %session_id)),
        );
    }
}

#[instrument(skip(socket, state))]
async fn handle_connection(socket: TcpStream, state: SharedState) -> std::io::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new();

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

        let kind = request.kind.clone();
        let action = request.action.clone();

        if kind == "dev" && action == "upload_game_file" {
            handle_upload(&mut reader, &mut write_half, &state, &mut session, request.data).await?;
            continue;
        }

        if kind == "store" && action == "download_game_file" {
            handle_download(&mut write_half, &state, &session, request.data, action.as_str()).await?;
            continue;
        }

        let result = dispatch(&state, &mut session, &kind, &action, request.data).await;
        let response = match result {
            Ok(data) => RawResponse::ok(kind.clone(), action.clone(), data),
            Err(err) => err.into_response(kind.clone(), action.clone()),
        };
        write_json_line(&mut write_half, &response).await?;
    }

    if let Some(username) = session.username() {
        state.sessions.release(username).await;
    }
    Ok(())
}

async fn dispatch(
    state: &SharedState,
    session: &mut Session,
    kind: &str,
    action: &str,
    data: Value,
) -> Result<Value, RpcError> {
    let value = match (kind, action) {
        ("auth", "register") => {
            let req: CredentialsRequest = decode(data)?;
            to_value(auth::register(state, req).await?)
        }
        ("auth", "login") => {
            let req: CredentialsRequest = decode(data)?;
            to_value(auth::login(state, session, req).await?)
        }
        ("auth", "logout") => {
            auth::logout(state, session).await?;
            Value::Object(serde_json::Map::new())
        }
        ("store", "list_games") => to_value(store::list_games(state, session).await?),
        ("store", "get_game_detail") => {
            let req: GameNameRequest = decode(data)?;
            to_value(store::get_game_detail(state, session, req).await?)
        }
        ("store", "add_comment") => {
            let req: AddCommentRequest = decode(data)?;
            store::add_comment(state, session, req).await?;
            Value::Object(serde_json::Map::new())
        }
        ("store", "mark_owned") => {
            let req: GameNameRequest = decode(data)?;
            store::mark_owned(state, session, req).await?;
            Value::Object(serde_json::Map::new())
        }
        ("dev", "launch_game_server") => {
            let req: GameNameRequest = decode(data)?;
            to_value(dev::launch_game_server(state, session, req).await?)
        }
        ("dev", "stop_game_server") => {
            let req: GameNameRequest = decode(data)?;
            dev::stop_game_server(state, session, req).await?;
            Value::Object(serde_json::Map::new())
        }
        ("dev", "delete_game") => {
            let req: GameNameRequest = decode(data)?;
            dev::delete_game(state, session, req).await?;
            Value::Object(serde_json::Map::new())
        }
        ("auth", _) | ("store", _) | ("dev", _) => return Err(RpcError::new(ErrorCode::Unsupported)),
        _ => return Err(RpcError::new(ErrorCode::UnknownType)),
    };
    Ok(value)
}

async fn handle_upload(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    state: &SharedState,
    session: &mut Session,
    data: Value,
) -> std::io::Result<()> {
    let header: UploadHeader = match serde_json::from_value(data) {
        Ok(h) => h,
        Err(_) => {
            let resp = RawResponse::err("dev", "upload_game_file", ErrorCode::InvalidRequest);
            return write_json_line(writer, &resp).await;
        }
    };

    let payload = match read_exact_payload(reader, header.filesize).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let resp = RawResponse::err("dev", "upload_game_file", ErrorCode::UploadFailed);
            return write_json_line(writer, &resp).await;
        }
    };

    let response = match dev::upload_game_file(state, session, header, payload).await {
        Ok(()) => RawResponse::ok_empty("dev", "upload_game_file"),
        Err(err) => err.into_response("dev", "upload_game_file"),
    };
    write_json_line(writer, &response).await
}

async fn handle_download(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    state: &SharedState,
    session: &Session,
    data: Value,
    action: &str,
) -> std::io::Result<()> {
    let req: GameNameRequest = match serde_json::from_value(data) {
        Ok(r) => r,
        Err(_) => {
            let resp = RawResponse::err("store", action, ErrorCode::InvalidRequest);
            return write_json_line(writer, &resp).await;
        }
    };

    match store::download_game_file(state, session, req).await {
        Ok((header, bytes)) => {
            let resp = RawResponse::ok("store", action, &header);
            write_json_line(writer, &resp).await?;
            write_payload(writer, &bytes).await
        }
        Err(err) => {
            let resp = err.into_response("store", action);
            write_json_line(writer, &resp).await
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, RpcError> {
    serde_json::from_value(data).map_err(|_| RpcError::new(ErrorCode::InvalidRequest))
}

fn to_value<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
