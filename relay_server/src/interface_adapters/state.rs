use crate::use_cases::RelayEvent;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Connection events flowing into the single relay task.
    pub event_tx: mpsc::Sender<RelayEvent>,
    // Bounded queue size for each connection's outbound messages.
    pub outbox_capacity: usize,
    // Interval between server pings.
    pub keepalive: Duration,
    // Address advertised to other machines, if configured.
    pub public_host: Option<String>,
    pub bind_host: String,
    pub port: u16,
}
