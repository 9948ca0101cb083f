// Domain layer: entity store, tuning and the per-tick rules.

pub mod math;
pub mod progression;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod upgrades;

pub use progression::{Choice, Progression};
pub use state::{
    DashPhase, Enemy, EnemyKind, FloatingText, MeleeArc, Orb, Player, PlayerInput,
    PlayerSnapshot, Projectile, ProjectileShot, RemotePlayerSnapshot, RemotePlayerState,
    SimulationState, WeaponKind,
};
pub use upgrades::Upgrade;
