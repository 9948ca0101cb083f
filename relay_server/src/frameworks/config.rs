use std::{
    env,
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

// Runtime/server constants (the relay has no gameplay tuning).

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOX_CAPACITY: usize = 256;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_KEEPALIVE_SECS: u64 = 30;

pub fn http_port() -> u16 {
    env::var("RELAY_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

// Listen on every interface by default so other machines on the LAN can join.
pub fn bind_addr() -> IpAddr {
    env::var("RELAY_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub fn public_host() -> Option<String> {
    env::var("RELAY_PUBLIC_HOST")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn keepalive_interval() -> Duration {
    let secs = env::var("RELAY_KEEPALIVE_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_KEEPALIVE_SECS);
    Duration::from_secs(secs)
}

// Unset or zero disables idle shutdown.
pub fn idle_shutdown() -> Option<Duration> {
    env::var("RELAY_IDLE_SHUTDOWN_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Everything `serve` needs besides the listener.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub keepalive: Duration,
    pub idle_shutdown: Option<Duration>,
    pub public_host: Option<String>,
    pub event_channel_capacity: usize,
    pub outbox_capacity: usize,
}

impl RelaySettings {
    pub fn from_env() -> Self {
        Self {
            keepalive: keepalive_interval(),
            idle_shutdown: idle_shutdown(),
            public_host: public_host(),
            ..Self::default()
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            keepalive: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
            idle_shutdown: None,
            public_host: None,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            outbox_capacity: OUTBOX_CAPACITY,
        }
    }
}
