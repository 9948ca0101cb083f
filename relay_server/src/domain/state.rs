// Relay bookkeeping records: connections, player mirrors and the shared session flags.

use std::collections::BTreeMap;

/// Horizontal spacing between freshly joined players.
pub const SPAWN_SPACING: f32 = 40.0;

/// One open connection. Exactly one record exists per socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub client_id: String,
    pub player_id: String,
    pub is_host: bool,
}

/// Server-side copy of a player's last reported stats.
///
/// The relay never simulates; these values only change through host updates and the
/// lifecycle commands (`reset`, `levelUp`).
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub level: u32,
    pub damage: f32,
    pub fire_rate: f32,
    pub pierce: u32,
    pub pickup: f32,
    pub regen: f32,
    pub proj_size: f32,
    pub proj_count: u32,
    pub dash_cd: f32,
    pub dash_cd_max: f32,
    pub is_host: bool,
}

impl PlayerRecord {
    /// Default loadout for a player joining at `slot` (0-based join position).
    pub fn spawn(id: impl Into<String>, slot: usize, is_host: bool) -> Self {
        Self {
            id: id.into(),
            x: slot as f32 * SPAWN_SPACING,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            hp: 100.0,
            hp_max: 100.0,
            level: 1,
            damage: 9.0,
            fire_rate: 3.2,
            pierce: 0,
            pickup: 70.0,
            regen: 0.0,
            proj_size: 4.0,
            proj_count: 1,
            dash_cd: 0.0,
            dash_cd_max: 1.1,
            is_host,
        }
    }

    /// Overwrites every field present in the patch; absent fields keep their value.
    pub fn merge(&mut self, patch: &PlayerPatch) {
        fn set<T: Copy>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut self.x, patch.x);
        set(&mut self.y, patch.y);
        set(&mut self.vx, patch.vx);
        set(&mut self.vy, patch.vy);
        set(&mut self.hp, patch.hp);
        set(&mut self.hp_max, patch.hp_max);
        set(&mut self.level, patch.level);
        set(&mut self.damage, patch.damage);
        set(&mut self.fire_rate, patch.fire_rate);
        set(&mut self.pierce, patch.pierce);
        set(&mut self.pickup, patch.pickup);
        set(&mut self.regen, patch.regen);
        set(&mut self.proj_size, patch.proj_size);
        set(&mut self.proj_count, patch.proj_count);
        set(&mut self.dash_cd, patch.dash_cd);
        set(&mut self.dash_cd_max, patch.dash_cd_max);
    }

    /// Puts the player back at its join slot with full health.
    pub fn respawn(&mut self, slot: usize) {
        self.x = slot as f32 * SPAWN_SPACING;
        self.y = 0.0;
        self.vx = 0.0;
        self.vy = 0.0;
        self.hp = 100.0;
        self.hp_max = 100.0;
    }
}

/// Partial player update sent by the host. `None` means "unchanged".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
    pub hp: Option<f32>,
    pub hp_max: Option<f32>,
    pub level: Option<u32>,
    pub damage: Option<f32>,
    pub fire_rate: Option<f32>,
    pub pierce: Option<u32>,
    pub pickup: Option<f32>,
    pub regen: Option<f32>,
    pub proj_size: Option<f32>,
    pub proj_count: Option<u32>,
    pub dash_cd: Option<f32>,
    pub dash_cd_max: Option<f32>,
}

/// Projectile fire event relayed verbatim from the host to everyone else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelayedProjectile {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub life: f32,
    pub damage: f32,
    pub pierce: u32,
}

/// Shared session flags plus the player table broadcast to every connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub started: bool,
    pub game_over: bool,
    pub players: BTreeMap<String, PlayerRecord>,
}

impl SessionState {
    /// Clears the run flags for a fresh start.
    pub fn restart(&mut self) {
        self.started = true;
        self.game_over = false;
    }
}
