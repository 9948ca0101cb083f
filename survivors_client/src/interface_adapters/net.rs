use crate::interface_adapters::protocol::{decode_inbound, encode_outbound};
use crate::use_cases::{
    Received, Reconnect, ReconnectPolicy, RelayInbound, RelayOutbound, RelaySession,
};

use futures_util::{SinkExt, StreamExt};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{Instrument, debug, info, info_span, warn};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
pub enum LinkError {
    Ws(tungstenite::Error),
    ConnectionClosed,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::Ws(e) => write!(f, "websocket error: {e}"),
            LinkError::ConnectionClosed => write!(f, "relay closed the connection"),
        }
    }
}

impl From<tungstenite::Error> for LinkError {
    fn from(e: tungstenite::Error) -> Self {
        LinkError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Channel sizes for one link.
#[derive(Debug, Clone, Copy)]
pub struct LinkCapacity {
    pub inbound: usize,
    pub outbound: usize,
}

impl Default for LinkCapacity {
    fn default() -> Self {
        Self {
            inbound: 256,
            outbound: 256,
        }
    }
}

/// Handle to a running relay link. Dropping it without `close` leaves the task to notice
/// the closed outbound channel.
pub struct RelayLink {
    outbound_tx: mpsc::Sender<RelayOutbound>,
    inbound_rx: mpsc::Receiver<Received>,
    status_rx: watch::Receiver<RelaySession>,
    close: Arc<Notify>,
    task: JoinHandle<()>,
    last_full_log: Instant,
}

impl RelayLink {
    /// Session as of the most recent relay message or socket event.
    pub fn session(&self) -> RelaySession {
        self.status_rx.borrow().clone()
    }

    pub fn status(&self) -> watch::Receiver<RelaySession> {
        self.status_rx.clone()
    }

    /// Queues a message for the relay; drops it when the link is backed up.
    pub fn send(&mut self, msg: RelayOutbound) -> bool {
        match self.outbound_tx.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                if self.last_full_log.elapsed() >= LOG_THROTTLE {
                    self.last_full_log = Instant::now();
                    warn!("relay outbound channel full; dropping message");
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Next queued relay message, if any. Never waits.
    pub fn try_recv(&mut self) -> Option<Received> {
        self.inbound_rx.try_recv().ok()
    }

    /// Waits for the next relay message. `None` once the link task has stopped.
    pub async fn recv(&mut self) -> Option<Received> {
        self.inbound_rx.recv().await
    }

    /// Explicit close: the socket is shut and no reconnect follows.
    pub fn close(&self) {
        self.close.notify_one();
    }

    /// Closes the link and waits for its task to finish.
    pub async fn shutdown(self) {
        self.close();
        if let Err(e) = self.task.await {
            warn!(error = %e, "relay link task failed");
        }
    }
}

/// Starts the link task for `url` and returns its handle.
pub fn spawn_link(url: String, policy: ReconnectPolicy, capacity: LinkCapacity) -> RelayLink {
    let (outbound_tx, outbound_rx) = mpsc::channel(capacity.outbound);
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity.inbound);
    let session = RelaySession::new(policy);
    let (status_tx, status_rx) = watch::channel(session.clone());
    let close = Arc::new(Notify::new());

    let span = info_span!("relay_link", url = %url);
    let task = tokio::spawn(
        link_task(
            url,
            session,
            LinkChannels {
                outbound_rx,
                inbound_tx,
                status_tx,
                close: close.clone(),
            },
        )
        .instrument(span),
    );

    RelayLink {
        outbound_tx,
        inbound_rx,
        status_rx,
        close,
        task,
        last_full_log: Instant::now() - LOG_THROTTLE,
    }
}

struct LinkChannels {
    outbound_rx: mpsc::Receiver<RelayOutbound>,
    inbound_tx: mpsc::Sender<Received>,
    status_tx: watch::Sender<RelaySession>,
    close: Arc<Notify>,
}

enum SocketEnd {
    // Explicit close, or the owner dropped its handle.
    Closed,
    Lost(Option<LinkError>),
}

async fn link_task(url: String, mut session: RelaySession, mut ch: LinkChannels) {
    loop {
        session.begin_connect();
        ch.status_tx.send_replace(session.clone());

        let end = tokio::select! {
            _ = ch.close.notified() => SocketEnd::Closed,
            connected = connect_async(url.as_str()) => match connected {
                Ok((ws, _response)) => {
                    debug!("socket open");
                    run_socket(ws, &mut session, &mut ch).await
                }
                Err(e) => SocketEnd::Lost(Some(LinkError::Ws(e))),
            },
        };

        match end {
            SocketEnd::Closed => {
                session.close();
                ch.status_tx.send_replace(session.clone());
                info!("relay link closed");
                return;
            }
            SocketEnd::Lost(err) => {
                if let Some(e) = err {
                    warn!(error = %e, "relay connection lost");
                }
            }
        }

        match session.on_connection_lost() {
            Reconnect::Retry { attempt, delay } => {
                ch.status_tx.send_replace(session.clone());
                info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting to relay");
                tokio::select! {
                    _ = ch.close.notified() => {
                        session.close();
                        ch.status_tx.send_replace(session.clone());
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Reconnect::GiveUp => {
                ch.status_tx.send_replace(session.clone());
                info!("relay link disconnected");
                return;
            }
        }
    }
}

// What one socket read means for the link.
#[derive(Debug)]
enum Frame {
    Inbound(RelayInbound),
    Invalid(serde_json::Error),
    // Control and binary frames; tungstenite answers pings on its own.
    Ignored,
    Ended(LinkError),
}

fn read_frame(incoming: Option<Result<Message, tungstenite::Error>>) -> Frame {
    match incoming {
        Some(Ok(Message::Text(text))) => match decode_inbound(text.as_str()) {
            Ok(msg) => Frame::Inbound(msg),
            Err(e) => Frame::Invalid(e),
        },
        Some(Ok(Message::Close(frame))) => {
            debug!(?frame, "relay sent close");
            Frame::Ended(LinkError::ConnectionClosed)
        }
        Some(Ok(_)) => Frame::Ignored,
        Some(Err(e)) => Frame::Ended(e.into()),
        None => Frame::Ended(LinkError::ConnectionClosed),
    }
}

async fn run_socket(ws: Ws, session: &mut RelaySession, ch: &mut LinkChannels) -> SocketEnd {
    let (mut sink, mut stream) = ws.split();
    let mut invalid_json: u32 = 0;
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;
    let mut last_full_log = Instant::now() - LOG_THROTTLE;

    loop {
        tokio::select! {
            _ = ch.close.notified() => {
                // Flush what the owner queued before asking to close.
                while let Ok(msg) = ch.outbound_rx.try_recv() {
                    let Some(text) = encode_outbound(msg) else {
                        continue;
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                if let Err(e) = sink.send(Message::Close(None)).await {
                    debug!(error = %e, "close frame not sent");
                }
                return SocketEnd::Closed;
            }

            incoming = stream.next() => match read_frame(incoming) {
                Frame::Inbound(msg) => {
                    // Session first, so readers of the status see the role the message implies.
                    session.on_inbound(&msg);
                    ch.status_tx.send_replace(session.clone());
                    let received = Received {
                        msg,
                        session: session.clone(),
                    };
                    match ch.inbound_tx.try_send(received) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            if last_full_log.elapsed() >= LOG_THROTTLE {
                                last_full_log = Instant::now();
                                warn!("inbound queue full; dropping relay message");
                            }
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => return SocketEnd::Closed,
                    }
                }
                Frame::Invalid(e) => {
                    invalid_json += 1;
                    if last_invalid_log.elapsed() >= LOG_THROTTLE {
                        last_invalid_log = Instant::now();
                        warn!(error = %e, invalid_json, "failed to parse relay message");
                    }
                }
                Frame::Ignored => {}
                Frame::Ended(e) => return SocketEnd::Lost(Some(e)),
            },

            outgoing = ch.outbound_rx.recv() => match outgoing {
                Some(msg) => {
                    let Some(text) = encode_outbound(msg) else {
                        continue;
                    };
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        return SocketEnd::Lost(Some(e.into()));
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SocketEnd::Closed;
                }
            },
        }
    }
}
