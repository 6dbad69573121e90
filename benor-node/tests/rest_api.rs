use std::{net::SocketAddr, time::Duration};

use serde_json::{json, Value as Json};

use benor_common::{Bit, ConsensusMessage, NodeId, Rejection, TransportError, Value};
use benor_consensus::Transport;
use benor_node::{build_runtime, transport::HttpTransport, NodeConfig};

/// Single-node group on an ephemeral port.
fn lone_config(bit: Bit, faulty: bool) -> NodeConfig {
    let mut config = NodeConfig::new(NodeId(0), bit, 1);
    config.base_port = 0;
    config.faulty = faulty;
    config.consensus.collect_timeout_ms = 200;
    config
}

async fn spawn_node(config: NodeConfig) -> SocketAddr {
    let runtime = build_runtime(config).await.unwrap();
    let addr = runtime.local_addr().unwrap();
    tokio::spawn(runtime.serve());
    addr
}

async fn get(addr: SocketAddr, path: &str) -> (u16, Json) {
    let response = reqwest::get(format!("http://{}{}", addr, path)).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

async fn post_message(addr: SocketAddr, body: Json) -> (u16, Json) {
    let response = reqwest::Client::new()
        .post(format!("http://{}/message", addr))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_lone_node_lifecycle() {
    let addr = spawn_node(lone_config(Bit::One, false)).await;

    let (code, body) = get(addr, "/status").await;
    assert_eq!(code, 200);
    assert_eq!(body["message"], "live");

    let (_, state) = get(addr, "/getState").await;
    assert_eq!(state, json!({"killed": false, "x": 1, "decided": false, "k": 0}));

    let (code, body) = get(addr, "/start").await;
    assert_eq!(code, 200);
    assert_eq!(body["message"], "Consensus started");

    let mut decided = json!(null);
    for _ in 0..100 {
        let (_, state) = get(addr, "/getState").await;
        if state["decided"] == json!(true) {
            decided = state;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(decided, json!({"killed": false, "x": 1, "decided": true, "k": 0}));

    let (code, body) = get(addr, "/stop").await;
    assert_eq!(code, 200);
    assert_eq!(body["message"], "Node stopped");

    let (_, state) = get(addr, "/getState").await;
    assert_eq!(state["killed"], json!(true));
    assert_eq!(state["x"], json!(1));

    let (code, body) = get(addr, "/start").await;
    assert_eq!(code, 400);
    assert_eq!(body["reason"], "killed");

    let (code, body) = post_message(addr, json!({"type": "VOTE", "sender": 0, "step": 0, "value": 1})).await;
    assert_eq!(code, 400);
    assert_eq!(body["reason"], "killed");
}

#[tokio::test]
async fn test_faulty_node_answers_with_errors() {
    let addr = spawn_node(lone_config(Bit::Zero, true)).await;

    let (code, body) = get(addr, "/status").await;
    assert_eq!(code, 500);
    assert_eq!(body["message"], "faulty");

    let (_, state) = get(addr, "/getState").await;
    assert_eq!(state, json!({"killed": false, "x": null, "decided": null, "k": null}));

    let (code, body) = get(addr, "/start").await;
    assert_eq!(code, 400);
    assert_eq!(body["reason"], "faulty");

    let (code, body) = post_message(addr, json!({"type": "PROPOSE", "sender": 0, "step": 0, "value": "?"})).await;
    assert_eq!(code, 400);
    assert_eq!(body["reason"], "faulty");
}

#[tokio::test]
async fn test_message_endpoint_accepts_wire_format() {
    let addr = spawn_node(lone_config(Bit::Zero, false)).await;

    let (code, body) = post_message(addr, json!({"type": "PROPOSE", "sender": 0, "step": 3, "value": "?"})).await;
    assert_eq!(code, 200);
    assert_eq!(body, json!({"message": "Message received"}));
}

#[tokio::test]
async fn test_http_transport_reaches_live_node() {
    let addr = spawn_node(lone_config(Bit::Zero, false)).await;
    let transport = HttpTransport::new("127.0.0.1", addr.port(), Duration::from_secs(1)).unwrap();

    let message = ConsensusMessage::propose(NodeId(0), 0, Value::One);
    transport.send(NodeId(0), message).await.unwrap();
}

#[tokio::test]
async fn test_http_transport_surfaces_rejection() {
    let addr = spawn_node(lone_config(Bit::Zero, true)).await;
    let transport = HttpTransport::new("127.0.0.1", addr.port(), Duration::from_secs(1)).unwrap();

    let err = transport
        .send(NodeId(0), ConsensusMessage::vote(NodeId(0), 0, Value::Zero))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Rejected(NodeId(0), Rejection::Faulty)));
}

#[tokio::test]
async fn test_http_transport_unreachable_peer() {
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let transport = HttpTransport::new("127.0.0.1", port, Duration::from_millis(500)).unwrap();

    let err = transport
        .send(NodeId(0), ConsensusMessage::propose(NodeId(1), 0, Value::One))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Unreachable(NodeId(0))));
}
