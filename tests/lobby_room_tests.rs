//! End-to-end launch/create/join/play scenarios (§8, scenarios 3-5), driving
//! real `lobby-server`/`room-server` subprocesses spawned by a real central
//! server.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

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
        11500,
        12500,
        env!("CARGO_BIN_EXE_lobby-server").into(),
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

fn make_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }
    buf
}

async fn send_line(stream: &mut TcpStream, req: Value) {
    let mut line = serde_json::to_string(&req).unwrap();
    line.push('\n');
    stream.write_all(line.as_bytes()).await.unwrap();
    stream.flush().await.unwrap();
}

async fn read_line(reader: &mut BufReader<&mut TcpStream>) -> Value {
    let mut out = String::new();
    reader.read_line(&mut out).await.unwrap();
    serde_json::from_str(&out).unwrap()
}

async fn login(stream: &mut TcpStream, username: &str) {
    send_line(
        stream,
        json!({"type": "auth", "action": "register", "data": {"username": username, "password": "pw"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut *stream);
    read_line(&mut reader).await;
    send_line(
        stream,
        json!({"type": "auth", "action": "login", "data": {"username": username, "password": "pw"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut *stream);
    read_line(&mut reader).await;
}

async fn upload_game(stream: &mut TcpStream, game_name: &str) {
    let archive = make_zip(&[("game_config.json", br#"{"description":"grid"}"#)]);
    send_line(
        stream,
        json!({
            "type": "dev", "action": "upload_game_file",
            "data": {
                "game_name": game_name, "version": "1", "filename": "g.zip",
                "filesize": archive.len(), "min_players": 2, "max_players": 2
            }
        }),
    )
    .await;
    stream.write_all(&archive).await.unwrap();
    stream.flush().await.unwrap();
    let mut reader = BufReader::new(&mut *stream);
    let resp = read_line(&mut reader).await;
    assert_eq!(resp["status"], "ok", "upload failed: {resp:?}");
}

/// Connects to a room server, sends the join line, and returns (stream,
/// assigned symbol) after consuming the join response. The caller keeps
/// reading further broadcast lines off the same stream.
async fn join_room_socket(host: &str, port: u16, username: &str) -> (TcpStream, String) {
    let mut stream = TcpStream::connect((host, port)).await.unwrap();
    send_line(
        &mut stream,
        json!({"type": "room", "action": "join", "data": {"username": username}}),
    )
    .await;
    let mut reader = BufReader::new(&mut stream);
    let resp = read_line(&mut reader).await;
    assert_eq!(resp["status"], "ok", "join failed: {resp:?}");
    let symbol = resp["data"]["symbol"].as_str().unwrap().to_string();
    drop(reader);
    (stream, symbol)
}

async fn read_state(stream: &mut TcpStream) -> Value {
    let mut reader = BufReader::new(stream);
    read_line(&mut reader).await
}

#[tokio::test]
async fn launch_create_join_and_play_to_win() {
    let addr = spawn_central().await;
    let mut dev = TcpStream::connect(addr).await.unwrap();
    login(&mut dev, "host1").await;
    upload_game(&mut dev, "grid").await;

    send_line(
        &mut dev,
        json!({"type": "dev", "action": "launch_game_server", "data": {"game_name": "grid"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut dev);
    let resp = read_line(&mut reader).await;
    assert_eq!(resp["status"], "ok", "launch failed: {resp:?}");
    let lobby_host = resp["data"]["lobby_host"].as_str().unwrap().to_string();
    let lobby_port = resp["data"]["lobby_port"].as_u64().unwrap() as u16;
    drop(reader);

    // Give the freshly spawned lobby process a moment to bind its listener.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut p1_lobby = TcpStream::connect((lobby_host.as_str(), lobby_port)).await.unwrap();
    send_line(
        &mut p1_lobby,
        json!({"type": "lobby", "action": "create_room", "data": {"username": "alice", "max_players": 2, "version": "1"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut p1_lobby);
    let resp = read_line(&mut reader).await;
    assert_eq!(resp["status"], "ok", "create_room failed: {resp:?}");
    let room_id = resp["data"]["room_id"].as_str().unwrap().to_string();
    let room_host = resp["data"]["room_server_host"].as_str().unwrap().to_string();
    let room_port = resp["data"]["room_server_port"].as_u64().unwrap() as u16;
    drop(reader);

    let mut p2_lobby = TcpStream::connect((lobby_host.as_str(), lobby_port)).await.unwrap();
    send_line(
        &mut p2_lobby,
        json!({"type": "lobby", "action": "join_room", "data": {"room_id": room_id, "username": "bob"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut p2_lobby);
    let resp = read_line(&mut reader).await;
    assert_eq!(resp["status"], "ok", "join_room failed: {resp:?}");
    drop(reader);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let (mut alice, alice_symbol) = join_room_socket(&room_host, room_port, "alice").await;
    // alice's join broadcast (seat count is still 1 until bob joins).
    let _ = read_state(&mut alice).await;
    assert_eq!(alice_symbol, "X");

    let (mut bob, bob_symbol) = join_room_socket(&room_host, room_port, "bob").await;
    assert_eq!(bob_symbol, "O");
    // bob's own join broadcast, then alice also receives the turn-start broadcast.
    let _ = read_state(&mut bob).await;
    let _ = read_state(&mut alice).await;

    let moves = [("alice", 0usize), ("bob", 4), ("alice", 1), ("bob", 5), ("alice", 2)];
    let mut last_state = Value::Null;
    for (player, cell) in moves {
        let (mover, other) = if player == "alice" {
            (&mut alice, &mut bob)
        } else {
            (&mut bob, &mut alice)
        };
        send_line(
            mover,
            json!({"type": "room", "action": "move", "data": {"username": player, "cell": cell}}),
        )
        .await;
        last_state = read_state(mover).await;
        let _ = read_state(other).await;
    }

    assert_eq!(last_state["data"]["winner"], "alice");
}

#[tokio::test]
async fn grid_game_ends_in_draw() {
    let addr = spawn_central().await;
    let mut dev = TcpStream::connect(addr).await.unwrap();
    login(&mut dev, "host2").await;
    upload_game(&mut dev, "grid2").await;

    send_line(
        &mut dev,
        json!({"type": "dev", "action": "launch_game_server", "data": {"game_name": "grid2"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut dev);
    let resp = read_line(&mut reader).await;
    let lobby_host = resp["data"]["lobby_host"].as_str().unwrap().to_string();
    let lobby_port = resp["data"]["lobby_port"].as_u64().unwrap() as u16;
    drop(reader);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut p1_lobby = TcpStream::connect((lobby_host.as_str(), lobby_port)).await.unwrap();
    send_line(
        &mut p1_lobby,
        json!({"type": "lobby", "action": "create_room", "data": {"username": "carol", "max_players": 2, "version": "1"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut p1_lobby);
    let resp = read_line(&mut reader).await;
    let room_id = resp["data"]["room_id"].as_str().unwrap().to_string();
    let room_host = resp["data"]["room_server_host"].as_str().unwrap().to_string();
    let room_port = resp["data"]["room_server_port"].as_u64().unwrap() as u16;
    drop(reader);

    let mut p2_lobby = TcpStream::connect((lobby_host.as_str(), lobby_port)).await.unwrap();
    send_line(
        &mut p2_lobby,
        json!({"type": "lobby", "action": "join_room", "data": {"room_id": room_id, "username": "dana"}}),
    )
    .await;
    let mut reader = BufReader::new(&mut p2_lobby);
    read_line(&mut reader).await;
    drop(reader);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let (mut carol, _) = join_room_socket(&room_host, room_port, "carol").await;
    let _ = read_state(&mut carol).await;
    let (mut dana, _) = join_room_socket(&room_host, room_port, "dana").await;
    let _ = read_state(&mut dana).await;
    let _ = read_state(&mut carol).await;

    let moves = [
        ("carol", 0usize),
        ("dana", 1),
        ("carol", 2),
        ("dana", 4),
        ("carol", 3),
        ("dana", 5),
        ("carol", 7),
        ("dana", 6),
        ("carol", 8),
    ];
    let mut last_state = Value::Null;
    for (player, cell) in moves {
        let (mover, other) = if player == "carol" {
            (&mut carol, &mut dana)
        } else {
            (&mut dana, &mut carol)
        };
        send_line(
            mover,
            json!({"type": "room", "action": "move", "data": {"username": player, "cell": cell}}),
        )
        .await;
        last_state = read_state(mover).await;
        let _ = read_state(other).await;
    }

    assert_eq!(last_state["data"]["winner"], "");
}
