// Per-tick systems. Each one mutates the collections it is handed and nothing else.

pub mod enemies;
pub mod floats;
pub mod melee;
pub mod movement;
pub mod pickup;
pub mod projectiles;
pub mod spawner;

use super::math::dist_sq;
use super::state::{Enemy, Player};

/// Index of the closest local player by squared distance.
pub fn nearest_player(players: &[Player], x: f32, y: f32) -> Option<usize> {
    players
        .iter()
        .enumerate()
        .map(|(i, p)| (i, dist_sq(x, y, p.x, p.y)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Index of the closest live enemy by squared distance.
pub fn nearest_enemy(enemies: &[Enemy], x: f32, y: f32) -> Option<usize> {
    enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.is_dead())
        .map(|(i, e)| (i, dist_sq(x, y, e.x, e.y)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
