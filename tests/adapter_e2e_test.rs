use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use dotlink::adapter::protocol::create_hello;
use dotlink::adapter::runtime::apply_inbound;
use dotlink::adapter::server::{run_server, ServerConfig};
use dotlink::adapter::{
    ClientCommand, EventForwarder, InboundCommand, InboundPayload, OutboundMessage,
};
use dotlink::core::{Config, Grid, Session};
use dotlink::types::{Command, DragState};

struct Harness {
    addr: SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    server: tokio::task::JoinHandle<()>,
}

async fn start(max_pending: usize) -> Harness {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        protocol_version: "1.0.0".to_string(),
        max_pending_commands: max_pending,
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");

    Harness {
        addr,
        cmd_rx,
        out_tx,
        server,
    }
}

async fn connect(addr: SocketAddr) -> (Lines<BufReader<OwnedReadHalf>>, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half).lines(), write_half)
}

async fn send(w: &mut OwnedWriteHalf, line: &str) {
    w.write_all(line.as_bytes()).await.unwrap();
    w.write_all(b"\n").await.unwrap();
    w.flush().await.unwrap();
}

async fn read_json(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timed out waiting for a line")
        .unwrap()
        .expect("connection closed");
    serde_json::from_str(&line).unwrap()
}

async fn next_inbound(rx: &mut mpsc::Receiver<InboundCommand>) -> InboundCommand {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .expect("expected inbound command")
}

fn session() -> Session {
    let grid = Grid::from_rows(&["GBY", "BYP", "RRR"], 1.0).unwrap();
    Session::with_grid(Config::default(), grid, 11).unwrap()
}

#[tokio::test]
async fn adapter_hello_command_events_ack_and_observation() {
    let mut h = start(8).await;
    let (mut lines, mut w) = connect(h.addr).await;

    let hello = create_hello(1, "e2e-test", "1.0.0");
    send(&mut w, &serde_json::to_string(&hello).unwrap()).await;

    let welcome = read_json(&mut lines).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["game_id"], "dotlink");

    let mut session = session();
    let mut events = EventForwarder::new(h.out_tx.clone());

    // Observations were requested, so the hello queues a snapshot.
    let inbound = next_inbound(&mut h.cmd_rx).await;
    assert_eq!(inbound.payload, InboundPayload::SnapshotRequest);
    apply_inbound(&mut session, inbound, &mut events, &h.out_tx);

    let obs = read_json(&mut lines).await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["state"], "idle");
    assert_eq!(obs["grid"]["rows"][2], "RRR");

    send(
        &mut w,
        r#"{"type":"command","seq":2,"ts":1,"action":"dragStart","x":0,"y":0}"#,
    )
    .await;
    let inbound = next_inbound(&mut h.cmd_rx).await;
    assert_eq!(inbound.seq, 2);
    match inbound.payload {
        InboundPayload::Command(ClientCommand::Core(Command::Drag(drag))) => {
            assert_eq!(drag.state, DragState::Started);
        }
        other => panic!("unexpected payload {:?}", other),
    }
    apply_inbound(&mut session, inbound, &mut events, &h.out_tx);

    let event = read_json(&mut lines).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["event"]["name"], "lineStarted");

    let ack = read_json(&mut lines).await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 2);

    let obs = read_json(&mut lines).await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["dragging"], true);
    assert_eq!(obs["chain"][0]["x"], 0);

    h.server.abort();
}

#[tokio::test]
async fn adapter_rejects_commands_before_hello_and_stale_seq() {
    let mut h = start(8).await;
    let (mut lines, mut w) = connect(h.addr).await;

    send(&mut w, r#"{"type":"command","seq":1,"ts":0,"action":"shuffle"}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");

    send(
        &mut w,
        r#"{"type":"hello","seq":5,"ts":0,"client":{"name":"t","version":"0"},"protocol_version":"1.2.0","requested":{"stream_observations":false}}"#,
    )
    .await;
    assert_eq!(read_json(&mut lines).await["type"], "welcome");

    send(&mut w, r#"{"type":"command","seq":5,"ts":0,"action":"shuffle"}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 5);

    send(&mut w, r#"{"type":"command","seq":6,"ts":0,"action":"tap"}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");

    send(&mut w, r#"{"type":"command","seq":7,"ts":0,"action":"fly"}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 7);

    assert!(h.cmd_rx.try_recv().is_err());
    h.server.abort();
}

#[tokio::test]
async fn adapter_observer_cannot_command_and_is_promoted() {
    let mut h = start(8).await;
    let (mut lines_a, mut w_a) = connect(h.addr).await;
    let (mut lines_b, mut w_b) = connect(h.addr).await;

    let hello = r#"{"type":"hello","seq":1,"ts":0,"client":{"name":"x","version":"0"},"protocol_version":"1.0.0","requested":{"stream_observations":false,"stream_events":false}}"#;
    send(&mut w_a, hello).await;
    assert_eq!(read_json(&mut lines_a).await["role"], "controller");
    send(&mut w_b, hello).await;
    assert_eq!(read_json(&mut lines_b).await["role"], "observer");

    send(&mut w_b, r#"{"type":"command","seq":2,"ts":0,"action":"hint"}"#).await;
    let err = read_json(&mut lines_b).await;
    assert_eq!(err["code"], "not_controller");

    // Snapshots are allowed for observers.
    send(&mut w_b, r#"{"type":"command","seq":3,"ts":0,"action":"snapshot"}"#).await;
    let inbound = next_inbound(&mut h.cmd_rx).await;
    assert_eq!(inbound.payload, InboundPayload::Command(ClientCommand::Snapshot));

    drop(w_a);
    drop(lines_a);
    tokio::time::sleep(Duration::from_millis(100)).await;

    send(&mut w_b, r#"{"type":"command","seq":4,"ts":0,"action":"shuffle"}"#).await;
    let inbound = next_inbound(&mut h.cmd_rx).await;
    assert_eq!(inbound.seq, 4);
    assert_eq!(
        inbound.payload,
        InboundPayload::Command(ClientCommand::Core(Command::Shuffle))
    );

    h.server.abort();
}

#[tokio::test]
async fn adapter_protocol_mismatch_closes_connection() {
    let h = start(8).await;
    let (mut lines, mut w) = connect(h.addr).await;

    let hello = create_hello(1, "old-client", "2.0.0");
    send(&mut w, &serde_json::to_string(&hello).unwrap()).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "protocol_mismatch");

    let closed = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap();
    assert!(closed.is_none());

    h.server.abort();
}

#[tokio::test]
async fn adapter_backpressure_returns_error() {
    let mut h = start(1).await;
    let (mut lines, mut w) = connect(h.addr).await;

    send(
        &mut w,
        r#"{"type":"hello","seq":1,"ts":0,"client":{"name":"t","version":"0"},"protocol_version":"1.0.0","requested":{"stream_observations":false}}"#,
    )
    .await;
    assert_eq!(read_json(&mut lines).await["type"], "welcome");

    send(&mut w, r#"{"type":"command","seq":2,"ts":0,"action":"shuffle"}"#).await;
    send(&mut w, r#"{"type":"command","seq":3,"ts":0,"action":"shuffle"}"#).await;

    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "backpressure");
    assert_eq!(err["seq"], 3);

    let inbound = next_inbound(&mut h.cmd_rx).await;
    assert_eq!(inbound.seq, 2);

    h.server.abort();
}

#[tokio::test]
async fn adapter_full_queue_reports_missing_first_observation() {
    let mut h = start(1).await;
    let (mut lines_a, mut w_a) = connect(h.addr).await;

    send(
        &mut w_a,
        r#"{"type":"hello","seq":1,"ts":0,"client":{"name":"a","version":"0"},"protocol_version":"1.0.0","requested":{"stream_observations":false}}"#,
    )
    .await;
    assert_eq!(read_json(&mut lines_a).await["type"], "welcome");
    send(&mut w_a, r#"{"type":"command","seq":2,"ts":0,"action":"shuffle"}"#).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Queue is full: the snapshot queued on hello cannot be delivered.
    let (mut lines_b, mut w_b) = connect(h.addr).await;
    let hello = create_hello(7, "watcher", "1.0.0");
    send(&mut w_b, &serde_json::to_string(&hello).unwrap()).await;

    let welcome = read_json(&mut lines_b).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["role"], "observer");
    let err = read_json(&mut lines_b).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "backpressure");
    assert_eq!(err["seq"], 7);

    let inbound = next_inbound(&mut h.cmd_rx).await;
    assert_eq!(inbound.seq, 2);
    assert!(h.cmd_rx.try_recv().is_err());

    h.server.abort();
}
