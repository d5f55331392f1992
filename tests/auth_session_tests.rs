//! End-to-end auth scenarios (§8, scenario 1) against a real TCP listener.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use arcade_directory::central::server::serve;
use arcade_directory::central::CentralState;
use arcade_directory::config::RuntimeConfig;
use arcade_directory::metadata::MetadataStore;

async fn spawn_central() -> std::net::SocketAddr {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_path_buf();
    std::mem::forget(dir);

    let state = Arc::new(CentralState::new(
        base,
        "127.0.0.1".to_string(),
        0,
        0,
        "/bin/true".into(),
        RuntimeConfig::default(),
    ));
    state.metadata.initialize_storage().await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = serve(listener, state).await;
    });
    addr
}

async fn send(stream: &mut (impl tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin), req: Value) -> Value {
    let mut line = serde_json::to_string(&req).unwrap();
    line.push('\n');
    stream.write_all(line.as_bytes()).await.unwrap();
    stream.flush().await.unwrap();

    let mut reader = BufReader::new(stream);
    let mut out = String::new();
    reader.read_line(&mut out).await.unwrap();
    serde_json::from_str(&out).unwrap()
}

#[tokio::test]
async fn register_login_duplicate_login() {
    let addr = spawn_central().await;

    let mut a = TcpStream::connect(addr).await.unwrap();
    let resp = send(
        &mut a,
        json!({"type": "auth", "action": "register", "data": {"username": "alice", "password": "pw"}}),
    )
    .await;
    assert_eq!(resp["status"], "ok");

    let resp = send(
        &mut a,
        json!({"type": "auth", "action": "login", "data": {"username": "alice", "password": "pw"}}),
    )
    .await;
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["data"]["username"], "alice");

    let mut b = TcpStream::connect(addr).await.unwrap();
    let resp = send(
        &mut b,
        json!({"type": "auth", "action": "login", "data": {"username": "alice", "password": "pw"}}),
    )
    .await;
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["error"]["code"], "USER_ALREADY_LOGGED_IN");
}

#[tokio::test]
async fn logout_releases_username_for_reuse() {
    let addr = spawn_central().await;
    let mut a = TcpStream::connect(addr).await.unwrap();
    send(
        &mut a,
        json!({"type": "auth", "action": "register", "data": {"username": "bob", "password": "pw"}}),
    )
    .await;
    send(
        &mut a,
        json!({"type": "auth", "action": "login", "data": {"username": "bob", "password": "pw"}}),
    )
    .await;
    let resp = send(&mut a, json!({"type": "auth", "action": "logout", "data": {}})).await;
    assert_eq!(resp["status"], "ok");

    let mut b = TcpStream::connect(addr).await.unwrap();
    let resp = send(
        &mut b,
        json!({"type": "auth", "action": "login", "data": {"username": "bob", "password": "pw"}}),
    )
    .await;
    assert_eq!(resp["status"], "ok");
}

#[tokio::test]
async fn invalid_username_is_rejected() {
    let addr = spawn_central().await;
    let mut a = TcpStream::connect(addr).await.unwrap();
    let resp = send(
        &mut a,
        json!({"type": "auth", "action": "register", "data": {"username": "bad/name", "password": "pw"}}),
    )
    .await;
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["error"]["code"], "INVALID_USERNAME");
}
