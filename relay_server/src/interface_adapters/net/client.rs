use crate::interface_adapters::protocol::ClientMessage;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ClientCommand, RelayEvent};

use axum::{
    Error,
    body::Bytes,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, info, info_span, warn};

// Categorizes connection lifecycle failures so callers can decide policy.
#[derive(Debug)]
enum NetError {
    Ws(axum::Error),
    RelayClosed,
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetError::Ws(e) => write!(f, "websocket error: {e}"),
            NetError::RelayClosed => write!(f, "relay task is gone"),
        }
    }
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let client_id = uuid::Uuid::new_v4().to_string();
    // The player id is only known once the relay has seated the connection.
    let span = info_span!("conn", client_id = %client_id, player_id = tracing::field::Empty);
    let _enter = span.enter();

    let (outbox_tx, outbox_rx) = mpsc::channel::<Utf8Bytes>(state.outbox_capacity);
    let (joined_tx, joined_rx) = oneshot::channel::<String>();

    // Register before reading anything so the welcome is the first frame out.
    // A failed send drops `joined_tx` with the event, so the wait below fails too.
    let _ = state
        .event_tx
        .send(RelayEvent::Connect {
            client_id: client_id.clone(),
            outbox: outbox_tx,
            joined: joined_tx,
        })
        .await;
    let player_id = match joined_rx.await {
        Ok(player_id) => player_id,
        Err(_) => {
            warn!("relay task unavailable; refusing connection");
            refuse(&mut socket).await;
            return;
        }
    };

    span.record("player_id", player_id.as_str());
    info!("client connected");

    let mut ctx = ConnCtx::new(client_id, state, outbox_rx);

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = %e, "client loop exited with error");
    }

    disconnect_cleanup(&ctx).await;
}

async fn refuse(socket: &mut WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::AGAIN,
            reason: "relay unavailable".into(),
        })))
        .await;
    let _ = socket.close().await;
}

struct ConnCtx {
    pub client_id: String,
    pub event_tx: mpsc::Sender<RelayEvent>,
    pub outbox_rx: mpsc::Receiver<Utf8Bytes>,
    pub keepalive: Duration,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    // Any inbound frame, pongs included, counts as liveness.
    pub last_seen: Instant,
    pub last_command_full_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

impl ConnCtx {
    fn new(client_id: String, state: Arc<AppState>, outbox_rx: mpsc::Receiver<Utf8Bytes>) -> Self {
        let now = Instant::now();
        let throttled = now - LOG_THROTTLE;
        Self {
            client_id,
            event_tx: state.event_tx.clone(),
            outbox_rx,
            keepalive: state.keepalive,
            msgs_in: 0,
            msgs_out: 0,
            bytes_in: 0,
            bytes_out: 0,
            invalid_json: 0,
            last_seen: now,
            last_command_full_log: throttled,
            last_invalid_input_log: throttled,
            close_frame: None,
        }
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn forward_command(
    client_id: &str,
    event_tx: &mpsc::Sender<RelayEvent>,
    command: ClientCommand,
    last_command_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match event_tx.try_send(RelayEvent::Command {
        client_id: client_id.to_string(),
        command,
    }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_command_full_log) {
                warn!("relay channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::RelayClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let ConnCtx {
        client_id,
        event_tx,
        outbox_rx,
        keepalive,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_seen,
        last_command_full_log,
        last_invalid_input_log,
        close_frame,
    } = ctx;

    let keepalive = *keepalive;
    let mut ping = interval_at(tokio::time::Instant::now() + keepalive, keepalive);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                *last_seen = Instant::now();
                match handle_incoming_ws(
                    incoming,
                    client_id.as_str(),
                    event_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_command_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            outgoing = outbox_rx.recv() => {
                match outgoing {
                    Some(bytes) => match forward_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    None => {
                        // The relay dropped our outbox: we fell behind or it shut down.
                        *close_frame = Some(CloseFrame {
                            code: close_code::AGAIN,
                            reason: "dropped by relay".into(),
                        });
                        info!("outbox closed by relay");
                        true
                    }
                }
            }

            _ = ping.tick() => {
                if last_seen.elapsed() > keepalive * 2 {
                    info!(silent_ms = last_seen.elapsed().as_millis() as u64, "closing half-open connection");
                    *close_frame = Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "keepalive timeout".into(),
                    });
                    true
                } else {
                    match socket.send(Message::Ping(Bytes::new())).await {
                        Ok(()) => false,
                        Err(e) => {
                            debug!(error = %e, "keepalive ping failed");
                            true
                        }
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = %err, "socket close error");
            }
            break;
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    client_id: &str,
    event_tx: &mpsc::Sender<RelayEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_command_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => {
                        forward_command(client_id, event_tx, msg.into(), last_command_full_log)
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_bytes(
    msg: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = msg.len();
    match socket.send(Message::Text(msg)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Disconnect follows immediately.
            warn!(error = %err, "failed to send relay message");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) {
    // Blocking send: the disconnect must reach the table even when the channel is busy.
    if ctx
        .event_tx
        .send(RelayEvent::Disconnect {
            client_id: ctx.client_id.clone(),
        })
        .await
        .is_err()
    {
        debug!("relay task gone during cleanup");
    }

    info!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        "client disconnected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_socket_fails_then_error_names_the_cause() {
        let err = NetError::from(axum::Error::new(std::io::Error::other("reset by peer")));
        assert!(matches!(err, NetError::Ws(_)));
        assert_eq!(err.to_string(), "websocket error: reset by peer");
        assert_eq!(NetError::RelayClosed.to_string(), "relay task is gone");
    }

    #[test]
    fn when_log_window_is_open_then_only_first_call_logs() {
        let mut last = Instant::now() - LOG_THROTTLE;
        assert!(should_log(&mut last));
        assert!(!should_log(&mut last));
    }

    #[test]
    fn when_relay_channel_is_closed_then_command_is_fatal() {
        let (event_tx, event_rx) = mpsc::channel(1);
        drop(event_rx);
        let mut last = Instant::now();

        let result = forward_command("c1", &event_tx, ClientCommand::StartGame, &mut last);

        assert!(matches!(result, Err(NetError::RelayClosed)));
    }
}
