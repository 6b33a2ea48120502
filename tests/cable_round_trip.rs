//! End-to-end tests against a live server on an ephemeral port.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;

use cable_gateway::app::build_app;
use cable_gateway::app_state::AppState;
use cable_gateway::chat;
use cable_gateway::client::{ChatPage, ElementId, PageEvent, transport};
use cable_gateway::config::CableConfig;
use cable_gateway::domain::PubSub;
use cable_gateway::protocol::{CommandMessage, ControlMessage, ServerMessage};

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Serves the chat gateway on an ephemeral port. `ping_interval_secs` of
/// zero disables pings.
async fn spawn_server(ping_interval_secs: u64) -> SocketAddr {
    let config = CableConfig {
        ping_interval_secs,
        ..CableConfig::default()
    };
    let server = chat::build_server(PubSub::new(config.pubsub_capacity));
    let app = build_app(AppState::new(server, config.ping_interval()), &config);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn next_frame(incoming: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
    match tokio::time::timeout(FRAME_TIMEOUT, incoming.recv()).await {
        Ok(Some(frame)) => frame,
        Ok(None) => panic!("connection closed while waiting for a frame"),
        Err(_) => panic!("timed out waiting for a frame"),
    }
}

/// Opens a chat page for `user` and waits until its subscription is
/// confirmed.
async fn open_page(addr: SocketAddr, user: &str) -> (ChatPage, mpsc::Receiver<ServerMessage>) {
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let Ok(mut page) = ChatPage::bootstrap(&format!("http://{addr}/?user={user}"), outbox_tx)
    else {
        panic!("bootstrap failed");
    };
    let Ok(mut incoming) = transport::connect(page.cable_url(), outbox_rx).await else {
        panic!("connect failed");
    };

    let welcome = next_frame(&mut incoming).await;
    assert_eq!(welcome, ServerMessage::Control(ControlMessage::Welcome));

    while !page.subscription().is_confirmed() {
        let frame = next_frame(&mut incoming).await;
        assert!(page.dispatch(PageEvent::Server(frame)).is_ok());
    }
    (page, incoming)
}

/// Feeds frames to `page` until its container holds `count` children.
async fn wait_for_messages(
    page: &mut ChatPage,
    incoming: &mut mpsc::Receiver<ServerMessage>,
    count: usize,
) {
    while page.container().children().len() < count {
        let frame = next_frame(incoming).await;
        assert!(page.dispatch(PageEvent::Server(frame)).is_ok());
    }
}

#[tokio::test]
async fn chat_message_round_trip() {
    let addr = spawn_server(0).await;
    let (mut alice, mut alice_in) = open_page(addr, "alice").await;
    let (mut bob, mut bob_in) = open_page(addr, "bob").await;

    assert!(alice.dispatch(PageEvent::Input("hello".to_string())).is_ok());
    assert!(alice.dispatch(PageEvent::Click(ElementId::Send)).is_ok());

    wait_for_messages(&mut alice, &mut alice_in, 1).await;
    wait_for_messages(&mut bob, &mut bob_in, 1).await;

    for page in [&alice, &bob] {
        assert!(!page.container().is_hidden());
        assert_eq!(page.container().children(), ["<p>hello</p>"]);
    }
}

#[tokio::test]
async fn missing_user_is_disconnected() {
    let addr = spawn_server(0).await;
    let (_outbox_tx, outbox_rx) = mpsc::unbounded_channel::<CommandMessage>();
    let Ok(mut incoming) = transport::connect(&format!("ws://{addr}/cable"), outbox_rx).await
    else {
        panic!("connect failed");
    };

    let frame = next_frame(&mut incoming).await;
    assert_eq!(
        frame,
        ServerMessage::Control(ControlMessage::Disconnect {
            reason: "unauthorized".to_string(),
            reconnect: false,
        })
    );
    let closed = tokio::time::timeout(FRAME_TIMEOUT, incoming.recv()).await;
    assert!(matches!(closed, Ok(None)));
}

#[tokio::test]
async fn unknown_channel_is_not_confirmed() {
    let addr = spawn_server(0).await;
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let Ok(mut incoming) =
        transport::connect(&format!("ws://{addr}/cable?user=carol"), outbox_rx).await
    else {
        panic!("connect failed");
    };
    assert_eq!(
        next_frame(&mut incoming).await,
        ServerMessage::Control(ControlMessage::Welcome)
    );

    let missing = r#"{"channel":"MissingChannel"}"#;
    let chat_id = r#"{"channel":"ChatChannel"}"#;
    assert!(outbox_tx.send(CommandMessage::subscribe(missing)).is_ok());
    assert!(outbox_tx.send(CommandMessage::subscribe(chat_id)).is_ok());

    // commands are handled in order, so the first reply belongs to ChatChannel
    assert_eq!(
        next_frame(&mut incoming).await,
        ServerMessage::Control(ControlMessage::ConfirmSubscription {
            identifier: chat_id.to_string(),
        })
    );
}

#[tokio::test]
async fn health_endpoint() {
    let addr = spawn_server(0).await;
    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("health request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let Ok(body) = response.json::<Value>().await else {
        panic!("health body is not JSON");
    };
    assert_eq!(body.get("status"), Some(&json!("healthy")));
    assert_eq!(body.get("version"), Some(&json!(env!("CARGO_PKG_VERSION"))));
}

#[tokio::test]
async fn http_broadcast_reaches_subscribers() {
    let addr = spawn_server(0).await;
    let (mut page, mut incoming) = open_page(addr, "dave").await;

    let client = reqwest::Client::new();
    let Ok(response) = client
        .post(format!("http://{addr}/_broadcast"))
        .json(&json!({"stream": "chat", "data": "from http"}))
        .send()
        .await
    else {
        panic!("broadcast request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    let Ok(body) = response.json::<Value>().await else {
        panic!("broadcast body is not JSON");
    };
    assert_eq!(body.get("delivered"), Some(&json!(1)));

    wait_for_messages(&mut page, &mut incoming, 1).await;
    assert_eq!(page.container().children(), ["<p>from http</p>"]);
}

#[tokio::test]
async fn http_broadcast_rejects_empty_stream() {
    let addr = spawn_server(0).await;
    let client = reqwest::Client::new();
    let Ok(response) = client
        .post(format!("http://{addr}/_broadcast"))
        .json(&json!({"stream": "  ", "data": 1}))
        .send()
        .await
    else {
        panic!("broadcast request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ping_arrives_after_welcome() {
    let addr = spawn_server(1).await;
    let (_outbox_tx, outbox_rx) = mpsc::unbounded_channel::<CommandMessage>();
    let Ok(mut incoming) =
        transport::connect(&format!("ws://{addr}/cable?user=frank"), outbox_rx).await
    else {
        panic!("connect failed");
    };

    assert_eq!(
        next_frame(&mut incoming).await,
        ServerMessage::Control(ControlMessage::Welcome)
    );
    let ServerMessage::Control(ControlMessage::Ping { message }) = next_frame(&mut incoming).await
    else {
        panic!("expected a ping after welcome");
    };
    assert!(message > 0);
}

#[tokio::test]
async fn http_disconnect_closes_matching_session() {
    let addr = spawn_server(0).await;
    let (_erin, mut erin_in) = open_page(addr, "erin").await;
    let (_gus, mut gus_in) = open_page(addr, "gus").await;

    let client = reqwest::Client::new();
    let Ok(response) = client
        .post(format!("http://{addr}/_broadcast"))
        .json(&json!({
            "command": "disconnect",
            "payload": {"identifiers": {"user": "erin"}, "reconnect": false}
        }))
        .send()
        .await
    else {
        panic!("disconnect request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);

    assert_eq!(
        next_frame(&mut erin_in).await,
        ServerMessage::Control(ControlMessage::Disconnect {
            reason: "remote".to_string(),
            reconnect: false,
        })
    );
    let closed = tokio::time::timeout(FRAME_TIMEOUT, erin_in.recv()).await;
    assert!(matches!(closed, Ok(None)));

    let untouched = tokio::time::timeout(Duration::from_millis(200), gus_in.recv()).await;
    assert!(untouched.is_err());
}
