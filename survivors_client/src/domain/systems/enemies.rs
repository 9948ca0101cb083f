use super::nearest_player;
use crate::domain::math::{len, lerp, norm, smoothing};
use crate::domain::state::{COLOR_HURT, Enemy, FloatingText, Player};
use crate::domain::tuning::EnemyTuning;

/// Chases the nearest local player and resolves contact damage.
/// Returns the index of the first player brought to zero hp, if any.
pub fn tick_enemies(
    enemies: &mut [Enemy],
    players: &mut [Player],
    floats: &mut Vec<FloatingText>,
    dt: f32,
    cfg: &EnemyTuning,
) -> Option<usize> {
    let mut fallen: Option<usize> = None;
    let blend = smoothing(cfg.steer, dt);

    for e in enemies.iter_mut() {
        if e.is_dead() {
            continue;
        }

        e.hit_cd = (e.hit_cd - dt).max(0.0);

        let Some(target) = nearest_player(players, e.x, e.y) else {
            continue;
        };
        let (tx, ty) = (players[target].x, players[target].y);
        let (nx, ny) = norm(tx - e.x, ty - e.y);

        e.vx = lerp(e.vx, nx * e.speed, blend);
        e.vy = lerp(e.vy, ny * e.speed, blend);
        e.x += e.vx * dt;
        e.y += e.vy * dt;

        for (i, p) in players.iter_mut().enumerate() {
            let d = len(p.x - e.x, p.y - e.y);
            let reach = p.r + e.r;
            if d >= reach {
                continue;
            }

            if e.hit_cd <= 0.0 && p.invuln <= 0.0 {
                e.hit_cd = cfg.hit_cooldown;
                p.invuln = cfg.contact_invuln;
                p.hp -= e.damage;
                floats.push(FloatingText {
                    x: p.x,
                    y: p.y - 18.0,
                    ttl: 0.65,
                    text: format!("-{}", e.damage.floor()),
                    color: COLOR_HURT,
                });
                if p.hp <= 0.0 {
                    p.hp = 0.0;
                    fallen.get_or_insert(i);
                }
            }

            // soft push away from this player
            let (cx, cy) = norm(p.x - e.x, p.y - e.y);
            let push = (reach - d) * cfg.push;
            e.x -= cx * push;
            e.y -= cy * push;
        }
    }

    fallen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{EnemyKind, WeaponKind};
    use crate::domain::systems::spawner::make_enemy;
    use crate::domain::tuning::{CombatTuning, PlayerTuning};

    fn player_at(x: f32) -> Player {
        Player::new(
            WeaponKind::Ranged,
            x,
            0.0,
            &PlayerTuning::default(),
            &CombatTuning::default(),
        )
    }

    #[test]
    fn when_two_players_then_enemy_chases_the_nearest() {
        let cfg = EnemyTuning::default();
        let mut players = vec![player_at(-200.0), player_at(200.0)];
        let mut enemies = vec![make_enemy(1, EnemyKind::Grunt, 150.0, 0.0, 0.0, &cfg)];
        let mut floats = Vec::new();

        tick_enemies(&mut enemies, &mut players, &mut floats, 0.05, &cfg);

        assert!(enemies[0].vx > 0.0);
    }

    #[test]
    fn when_enemy_touches_player_then_damage_and_cooldowns_apply() {
        let cfg = EnemyTuning::default();
        let mut players = vec![player_at(0.0)];
        let mut enemies = vec![make_enemy(1, EnemyKind::Grunt, 10.0, 0.0, 0.0, &cfg)];
        let mut floats = Vec::new();

        let fallen = tick_enemies(&mut enemies, &mut players, &mut floats, 1.0 / 60.0, &cfg);

        assert_eq!(fallen, None);
        assert_eq!(players[0].hp, 88.0);
        assert_eq!(players[0].invuln, cfg.contact_invuln);
        assert_eq!(enemies[0].hit_cd, cfg.hit_cooldown);
        assert_eq!(floats.len(), 1);
        assert_eq!(floats[0].text, "-12");

        // invulnerable on the next tick
        tick_enemies(&mut enemies, &mut players, &mut floats, 1.0 / 60.0, &cfg);
        assert_eq!(players[0].hp, 88.0);
    }

    #[test]
    fn when_contact_is_lethal_then_hp_clamps_and_index_is_reported() {
        let cfg = EnemyTuning::default();
        let mut players = vec![player_at(0.0)];
        players[0].hp = 5.0;
        let mut enemies = vec![make_enemy(1, EnemyKind::Tank, 5.0, 0.0, 0.0, &cfg)];
        let mut floats = Vec::new();

        let fallen = tick_enemies(&mut enemies, &mut players, &mut floats, 1.0 / 60.0, &cfg);

        assert_eq!(fallen, Some(0));
        assert_eq!(players[0].hp, 0.0);
    }
}
