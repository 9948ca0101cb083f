use crate::domain::math::rand_range;
use crate::domain::state::{Enemy, EnemyKind, SimulationState};
use crate::domain::tuning::EnemyTuning;
use rand::Rng;
use std::f32::consts::TAU;

/// Enemies per second at elapsed time `t`, scaled by the number of remote players.
pub fn spawn_rate(t: f32, remote_count: usize, cfg: &EnemyTuning) -> f32 {
    (cfg.base_spawn_rate + t / cfg.spawn_ramp) * (1 + remote_count) as f32
}

/// Kind draw for a roll in [0, 1).
pub fn choose_kind(t: f32, roll: f32, cfg: &EnemyTuning) -> EnemyKind {
    if t > cfg.runner_after && roll < cfg.runner_chance {
        EnemyKind::Runner
    } else if t > cfg.tank_after && roll < cfg.tank_chance {
        EnemyKind::Tank
    } else {
        EnemyKind::Grunt
    }
}

/// Builds an enemy of `kind` with stats scaled for elapsed time `t`.
pub fn make_enemy(id: u64, kind: EnemyKind, x: f32, y: f32, t: f32, cfg: &EnemyTuning) -> Enemy {
    let base = kind.base_stats(cfg);
    let s = 1.0 + t / cfg.scale_period;
    Enemy {
        id,
        x,
        y,
        vx: 0.0,
        vy: 0.0,
        r: base.radius,
        hp: base.hp * s,
        hp_max: base.hp * s,
        speed: base.speed * (0.9 + 0.1 * s),
        damage: base.damage,
        hit_cd: 0.0,
        kind,
    }
}

/// Advances the spawn accumulator and spawns one enemy per local player per interval.
pub fn tick_spawner<R: Rng + ?Sized>(
    state: &mut SimulationState,
    rng: &mut R,
    dt: f32,
    cfg: &EnemyTuning,
) -> usize {
    let rate = spawn_rate(state.t, state.remote_players.len(), cfg);
    let interval = 1.0 / rate;
    let mut spawned = 0;

    state.spawn_acc += dt;
    while state.spawn_acc >= interval {
        state.spawn_acc -= interval;

        for slot in 0..state.players.len() {
            let (px, py) = (state.players[slot].x, state.players[slot].y);
            let kind = choose_kind(state.t, rng.random::<f32>(), cfg);
            let ang = rand_range(rng, 0.0, TAU);
            let dist = rand_range(rng, cfg.spawn_min_dist, cfg.spawn_max_dist);
            let id = state.alloc_id();
            let enemy = make_enemy(
                id,
                kind,
                px + ang.cos() * dist,
                py + ang.sin() * dist,
                state.t,
                cfg,
            );
            state.enemies.push(enemy);
            spawned += 1;
        }
    }

    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::math::len;
    use crate::domain::state::WeaponKind;
    use crate::domain::tuning::{CombatTuning, PlayerTuning};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn when_early_then_only_grunts_spawn() {
        let cfg = EnemyTuning::default();
        assert_eq!(choose_kind(10.0, 0.01, &cfg), EnemyKind::Grunt);
        assert_eq!(choose_kind(30.0, 0.11, &cfg), EnemyKind::Runner);
        assert_eq!(choose_kind(30.0, 0.15, &cfg), EnemyKind::Grunt);
        assert_eq!(choose_kind(50.0, 0.15, &cfg), EnemyKind::Tank);
        assert_eq!(choose_kind(50.0, 0.05, &cfg), EnemyKind::Runner);
        assert_eq!(choose_kind(50.0, 0.5, &cfg), EnemyKind::Grunt);
    }

    #[test]
    fn when_time_passes_then_enemies_scale() {
        let cfg = EnemyTuning::default();
        let fresh = make_enemy(1, EnemyKind::Grunt, 0.0, 0.0, 0.0, &cfg);
        let late = make_enemy(2, EnemyKind::Grunt, 0.0, 0.0, 45.0, &cfg);
        assert_eq!(fresh.hp, 26.0);
        assert_eq!(late.hp, 52.0);
        assert!((late.speed - 60.0 * 1.1).abs() < 1e-4);
    }

    #[test]
    fn when_remote_players_exist_then_rate_multiplies() {
        let cfg = EnemyTuning::default();
        assert!((spawn_rate(0.0, 0, &cfg) - 0.9).abs() < 1e-6);
        assert!((spawn_rate(0.0, 1, &cfg) - 1.8).abs() < 1e-6);
        assert!((spawn_rate(35.0, 0, &cfg) - 1.9).abs() < 1e-5);
    }

    #[test]
    fn when_interval_elapses_then_one_enemy_per_local_player_spawns_in_ring() {
        let cfg = EnemyTuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut state = SimulationState::new(
            &[WeaponKind::Ranged, WeaponKind::Melee],
            &PlayerTuning::default(),
            &CombatTuning::default(),
        );

        // 0.9/s -> first spawn after ~1.11 s
        let mut spawned = 0;
        for _ in 0..23 {
            spawned += tick_spawner(&mut state, &mut rng, 0.05, &cfg);
        }

        assert_eq!(spawned, 2);
        assert_eq!(state.enemies.len(), 2);
        for (slot, e) in state.enemies.iter().enumerate() {
            let p = &state.players[slot];
            let d = len(e.x - p.x, e.y - p.y);
            assert!((359.9..=520.1).contains(&d));
        }
        assert_ne!(state.enemies[0].id, state.enemies[1].id);
    }
}
