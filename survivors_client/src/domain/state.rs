// Entity store: every collection the simulation owns, plus the mirrors of remote players.

use super::tuning::{CombatTuning, EnemyStats, EnemyTuning, PlayerTuning};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponKind {
    Ranged,
    Melee,
}

impl FromStr for WeaponKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ranged" | "gun" => Ok(WeaponKind::Ranged),
            "melee" | "sword" => Ok(WeaponKind::Melee),
            other => Err(format!("unknown weapon kind `{other}`")),
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaponKind::Ranged => write!(f, "ranged"),
            WeaponKind::Melee => write!(f, "melee"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashPhase {
    Idle,
    Cooling,
    Active,
}

/// Per-tick control state for one local player. `dash_pressed` is an edge, not a hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub dash_pressed: bool,
}

impl PlayerInput {
    /// Raw axis values in {-1, 0, 1}; +y points down.
    pub fn axis(&self) -> (f32, f32) {
        let ix = f32::from(u8::from(self.right)) - f32::from(u8::from(self.left));
        let iy = f32::from(u8::from(self.down)) - f32::from(u8::from(self.up));
        (ix, iy)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub invuln: f32,
    pub speed: f32,

    pub dash_speed: f32,
    pub dash_cd: f32,
    pub dash_cd_max: f32,
    pub dash_time: f32,
    pub dash_time_max: f32,

    pub level: u32,

    pub damage: f32,
    pub fire_rate: f32,
    pub proj_speed: f32,
    pub proj_size: f32,
    pub proj_count: u32,
    pub pierce: u32,
    pub knockback: f32,
    pub pickup: f32,
    pub regen: f32,
    pub reach: f32,

    pub weapon: WeaponKind,
    // Last non-zero movement direction, radians.
    pub facing: f32,
    pub shot_acc: f32,
}

impl Player {
    pub fn new(weapon: WeaponKind, x: f32, y: f32, pt: &PlayerTuning, ct: &CombatTuning) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            r: pt.radius,
            hp: pt.hp_max,
            hp_max: pt.hp_max,
            invuln: 0.0,
            speed: pt.speed,
            dash_speed: pt.dash_speed,
            dash_cd: 0.0,
            dash_cd_max: pt.dash_cd_max,
            dash_time: 0.0,
            dash_time_max: pt.dash_time_max,
            level: 1,
            damage: ct.damage,
            fire_rate: ct.fire_rate,
            proj_speed: ct.proj_speed,
            proj_size: ct.proj_size,
            proj_count: 1,
            pierce: 0,
            knockback: ct.knockback,
            pickup: pt.pickup,
            regen: 0.0,
            reach: 1.0,
            weapon,
            facing: 0.0,
            shot_acc: 0.0,
        }
    }

    pub fn dash_phase(&self) -> DashPhase {
        if self.dash_time > 0.0 {
            DashPhase::Active
        } else if self.dash_cd > 0.0 {
            DashPhase::Cooling
        } else {
            DashPhase::Idle
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// The stats other peers see for this player.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
            hp: self.hp,
            hp_max: self.hp_max,
            level: self.level,
            damage: self.damage,
            fire_rate: self.fire_rate,
            pierce: self.pierce,
            pickup: self.pickup,
            regen: self.regen,
            proj_size: self.proj_size,
            proj_count: self.proj_count,
            dash_cd: self.dash_cd,
            dash_cd_max: self.dash_cd_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Grunt,
    Runner,
    Tank,
}

impl EnemyKind {
    pub fn tier(self) -> i32 {
        match self {
            EnemyKind::Grunt => 0,
            EnemyKind::Runner => 1,
            EnemyKind::Tank => 2,
        }
    }

    /// XP multiplier `1.5^tier`.
    pub fn xp_multiplier(self) -> f32 {
        1.5f32.powi(self.tier())
    }

    pub fn base_stats(self, tuning: &EnemyTuning) -> EnemyStats {
        match self {
            EnemyKind::Grunt => tuning.grunt,
            EnemyKind::Runner => tuning.runner,
            EnemyKind::Tank => tuning.tank,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub speed: f32,
    pub damage: f32,
    pub hit_cd: f32,
    pub kind: EnemyKind,
}

impl Enemy {
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub life: f32,
    pub damage: f32,
    pub pierce: u32,
    pub knockback: f32,
    // Mirrored from the host; never reported back to the relay.
    pub remote: bool,
}

impl Projectile {
    pub fn shot(&self) -> ProjectileShot {
        ProjectileShot {
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
            r: self.r,
            life: self.life,
            damage: self.damage,
            pierce: self.pierce,
        }
    }
}

/// Sweeping melee hit sector owned by one melee player.
#[derive(Debug, Clone, PartialEq)]
pub struct MeleeArc {
    pub owner: usize,
    // Angle covered so far in the current sweep.
    pub sweep: f32,
    pub base: f32,
    pub angular_speed: f32,
    pub length: f32,
    pub width: f32,
    pub hits: HashSet<u64>,
    pub cooldown: f32,
    pub active: bool,
}

impl MeleeArc {
    pub fn new(owner: usize) -> Self {
        Self {
            owner,
            sweep: 0.0,
            base: 0.0,
            angular_speed: 0.0,
            length: 0.0,
            width: 0.0,
            hits: HashSet::new(),
            cooldown: 0.0,
            active: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Orb {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub x: f32,
    pub y: f32,
    pub ttl: f32,
    pub text: String,
    pub color: &'static str,
}

pub const COLOR_HURT: &str = "#ff4d6d";
pub const COLOR_DAMAGE: &str = "#e8eeff";
pub const COLOR_UPGRADE: &str = "#7c5cff";

/// Player stats exchanged over the relay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerSnapshot {
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
}

/// A fire event as relayed between peers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileShot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub life: f32,
    pub damage: f32,
    pub pierce: u32,
}

/// One row of an inbound player table.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayerState {
    pub id: String,
    pub is_host: bool,
    pub stats: PlayerSnapshot,
}

/// Non-owned mirror of another connection's player.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayerSnapshot {
    pub id: String,
    pub is_host: bool,
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub stats: PlayerSnapshot,
}

impl RemotePlayerSnapshot {
    pub fn from_state(state: &RemotePlayerState) -> Self {
        Self {
            id: state.id.clone(),
            is_host: state.is_host,
            x: state.stats.x,
            y: state.stats.y,
            target_x: state.stats.x,
            target_y: state.stats.y,
            stats: state.stats,
        }
    }

    /// Stats are replaced verbatim; position only moves the target.
    pub fn update(&mut self, state: &RemotePlayerState) {
        self.is_host = state.is_host;
        self.target_x = state.stats.x;
        self.target_y = state.stats.y;
        self.stats = state.stats;
    }

    /// Moves the shown position a fixed fraction toward the target.
    pub fn smooth(&mut self, blend: f32) {
        self.x += (self.target_x - self.x) * blend;
        self.y += (self.target_y - self.y) * blend;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    // Elapsed running time; frozen while paused or after game over.
    pub t: f32,
    pub paused: bool,
    pub game_over: bool,
    pub players: Vec<Player>,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub arcs: Vec<MeleeArc>,
    pub orbs: Vec<Orb>,
    pub floats: Vec<FloatingText>,
    pub remote_players: BTreeMap<String, RemotePlayerSnapshot>,
    pub spawn_acc: f32,
    pub next_id: u64,
}

impl SimulationState {
    /// Fresh session: players side by side at the origin, one arc per melee player.
    pub fn new(weapons: &[WeaponKind], pt: &PlayerTuning, ct: &CombatTuning) -> Self {
        let players: Vec<Player> = weapons
            .iter()
            .enumerate()
            .map(|(slot, weapon)| Player::new(*weapon, slot as f32 * pt.spawn_spacing, 0.0, pt, ct))
            .collect();
        let arcs = players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.weapon == WeaponKind::Melee)
            .map(|(owner, _)| MeleeArc::new(owner))
            .collect();

        Self {
            players,
            arcs,
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn weapons(&self) -> Vec<WeaponKind> {
        self.players.iter().map(|p| p.weapon).collect()
    }
}
