// Use-case level inputs/outputs for the simulation and the relay link.

use super::relay_session::RelaySession;
use crate::domain::{PlayerSnapshot, ProjectileShot, RemotePlayerState, Upgrade};

/// Something the simulation did that the outside world may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ProjectileFired(ProjectileShot),
    LevelUp { level: u32 },
    UpgradeOffered(Vec<Upgrade>),
    UpgradeApplied {
        upgrade: Option<Upgrade>,
        streak_bonus: bool,
    },
    GameOver,
    Reset,
}

/// Shared session table as last broadcast by the relay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub players: Vec<RemotePlayerState>,
    pub started: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayInbound {
    Connected {
        client_id: String,
        player_id: String,
        is_host: bool,
        session: SessionView,
        address_hint: Option<String>,
    },
    State(SessionView),
    Projectile {
        player_id: String,
        shot: ProjectileShot,
    },
    HostChanged {
        new_host_id: String,
    },
}

/// A relay message and the session as it stood right after the link applied it.
#[derive(Debug, Clone)]
pub struct Received {
    pub msg: RelayInbound,
    pub session: RelaySession,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutbound {
    PlayerUpdate {
        player_id: String,
        snapshot: PlayerSnapshot,
    },
    Projectile {
        player_id: String,
        shot: ProjectileShot,
    },
    StartGame,
    Reset,
    LevelUp {
        player_id: String,
        level: u32,
    },
    GameOver,
}
