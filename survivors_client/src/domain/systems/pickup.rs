use super::nearest_player;
use crate::domain::math::{clamp, len, norm};
use crate::domain::state::{Enemy, EnemyKind, Orb, Player};
use crate::domain::tuning::PickupTuning;

/// XP carried by one orb dropped by `kind` at elapsed time `t`.
pub fn orb_value(t: f32, kind: EnemyKind, cfg: &PickupTuning) -> u32 {
    let base = cfg.base_xp as f32 + (t / cfg.xp_step).floor();
    (base * kind.xp_multiplier()).floor() as u32
}

/// Removes dead enemies, dropping one orb per local player for each. Returns the kill count.
pub fn reap_dead(
    enemies: &mut Vec<Enemy>,
    local_players: usize,
    orbs: &mut Vec<Orb>,
    t: f32,
    cfg: &PickupTuning,
) -> usize {
    let before = enemies.len();
    enemies.retain(|e| {
        if !e.is_dead() {
            return true;
        }
        let amount = orb_value(t, e.kind, cfg);
        orbs.extend((0..local_players).map(|_| Orb {
            x: e.x,
            y: e.y,
            r: cfg.orb_radius,
            amount,
        }));
        false
    });
    before - enemies.len()
}

/// Pulls orbs toward the nearest player and collects the ones in contact.
/// Returns the XP collected this tick.
pub fn tick_orbs(orbs: &mut Vec<Orb>, players: &[Player], dt: f32, cfg: &PickupTuning) -> u32 {
    let mut gained = 0;

    orbs.retain_mut(|o| {
        let Some(i) = nearest_player(players, o.x, o.y) else {
            return true;
        };
        let p = &players[i];
        let (dx, dy) = (p.x - o.x, p.y - o.y);
        let d = len(dx, dy);

        if d <= p.r + o.r + cfg.contact_pad {
            gained += o.amount;
            return false;
        }

        if d < p.pickup {
            let pull = cfg.pull_speed * clamp((p.pickup - d) / p.pickup, 0.0, 1.0);
            let (nx, ny) = norm(dx, dy);
            // Never step past the player.
            let step = (pull * dt).min(d);
            o.x += nx * step;
            o.y += ny * step;
        }
        true
    });

    gained
}
