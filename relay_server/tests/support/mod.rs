// Shared helpers for booting a relay and talking to it over real sockets.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use relay_server::RelaySettings;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

// Every test gets its own relay so sessions never leak between tests.
pub async fn start_relay(settings: RelaySettings) -> String {
    // Bind to an ephemeral port to avoid collisions with local services.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        relay_server::serve(listener, settings)
            .await
            .expect("relay failed");
    });
    addr.to_string()
}

pub async fn start_default_relay() -> String {
    start_relay(RelaySettings::default()).await
}

pub async fn connect(addr: &str) -> Ws {
    let (ws, _response) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connect");
    ws
}

// Connects and returns the socket plus the `connected` payload.
pub async fn join(addr: &str) -> (Ws, Value) {
    let mut ws = connect(addr).await;
    let connected = next_of_type(&mut ws, "connected").await;
    (ws, connected)
}

pub async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send text frame");
}

// Next JSON text frame, skipping control frames.
pub async fn next_json(ws: &mut Ws) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next()).await.ok()??;
        match frame.ok()? {
            Message::Text(text) => return serde_json::from_str(text.as_str()).ok(),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

pub async fn next_of_type(ws: &mut Ws, kind: &str) -> Value {
    loop {
        let msg = next_json(ws)
            .await
            .unwrap_or_else(|| panic!("socket ended before a `{kind}` message"));
        if msg["type"] == kind {
            return msg;
        }
    }
}

// True when nothing but control frames arrives within `wait`.
pub async fn stays_quiet(ws: &mut Ws, wait: Duration) -> bool {
    loop {
        match tokio::time::timeout(wait, ws.next()).await {
            Err(_) => return true,
            Ok(Some(Ok(Message::Ping(_)))) | Ok(Some(Ok(Message::Pong(_)))) => continue,
            Ok(_) => return false,
        }
    }
}

pub fn host_count(state: &Value) -> usize {
    state["players"]
        .as_object()
        .map(|players| {
            players
                .values()
                .filter(|p| p["isHost"] == Value::Bool(true))
                .count()
        })
        .unwrap_or(0)
}
