// Use-case level inputs/outputs for the relay task.

use crate::domain::{PlayerPatch, RelayedProjectile, SessionState};
use axum::extract::ws::Utf8Bytes;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Events flowing from connection handlers into the single relay task.
#[derive(Debug)]
pub enum RelayEvent {
    Connect {
        client_id: String,
        outbox: mpsc::Sender<Utf8Bytes>,
        // Answered with the assigned player id once the welcome is queued.
        joined: oneshot::Sender<String>,
    },
    Disconnect {
        client_id: String,
    },
    Command {
        client_id: String,
        command: ClientCommand,
    },
}

/// Parsed client requests. Authority checks happen in the relay table.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    PlayerUpdate {
        player_id: String,
        patch: PlayerPatch,
    },
    Projectile {
        player_id: String,
        projectile: RelayedProjectile,
    },
    StartGame,
    Reset,
    LevelUp {
        player_id: String,
        level: u32,
    },
    GameOver,
}

/// Messages the relay emits; serialized once per delivery by the adapter encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Welcome {
        client_id: String,
        player_id: String,
        is_host: bool,
        session: SessionState,
        address_hint: Option<String>,
    },
    Session(SessionState),
    Projectile {
        player_id: String,
        projectile: RelayedProjectile,
    },
    HostChanged {
        new_host_id: String,
    },
}

/// Who receives a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    AllExcept(String),
    Only(String),
}

impl Target {
    pub fn includes(&self, client_id: &str) -> bool {
        match self {
            Target::All => true,
            Target::AllExcept(excluded) => excluded != client_id,
            Target::Only(only) => only == client_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub target: Target,
    pub notice: Notice,
}

impl Delivery {
    pub fn new(target: Target, notice: Notice) -> Self {
        Self { target, notice }
    }
}

/// Coarse relay status published for the idle-shutdown watcher.
#[derive(Debug, Clone, Copy)]
pub struct RelayStatus {
    pub connections: usize,
    pub started: bool,
    pub last_activity: Instant,
}

impl RelayStatus {
    pub fn idle_since(now: Instant) -> Self {
        Self {
            connections: 0,
            started: false,
            last_activity: now,
        }
    }
}
