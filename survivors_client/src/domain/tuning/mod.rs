// Gameplay tuning, kept apart from runtime configuration.

pub mod combat;
pub mod enemy;
pub mod pickup;
pub mod player;

pub use combat::CombatTuning;
pub use enemy::{EnemyStats, EnemyTuning};
pub use pickup::PickupTuning;
pub use player::PlayerTuning;

#[derive(Debug, Clone, Copy, Default)]
pub struct SimTuning {
    pub player: PlayerTuning,
    pub combat: CombatTuning,
    pub enemy: EnemyTuning,
    pub pickup: PickupTuning,
}
