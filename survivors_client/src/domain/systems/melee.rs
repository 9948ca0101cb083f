use crate::domain::math::{len, norm, normalize_angle};
use crate::domain::state::{COLOR_DAMAGE, Enemy, FloatingText, MeleeArc, Player};
use crate::domain::tuning::CombatTuning;
use std::f32::consts::FRAC_PI_2;

/// Seconds one 90 degree sweep takes at the given fire rate.
pub fn sweep_time(fire_rate: f32, cfg: &CombatTuning) -> f32 {
    cfg.melee_sweep_time * cfg.fire_rate / fire_rate.max(f32::EPSILON)
}

/// Advances every melee arc. An enemy is hit at most once per sweep.
pub fn tick_melee(
    arcs: &mut [MeleeArc],
    players: &[Player],
    enemies: &mut [Enemy],
    floats: &mut Vec<FloatingText>,
    dt: f32,
    cfg: &CombatTuning,
) {
    for arc in arcs.iter_mut() {
        let Some(owner) = players.get(arc.owner) else {
            continue;
        };

        arc.length = (cfg.melee_length + cfg.melee_length_per_size * owner.proj_size) * owner.reach;
        arc.width = cfg.melee_width + owner.proj_size;

        if !arc.active {
            arc.cooldown = (arc.cooldown - dt).max(0.0);
            if arc.cooldown > 0.0 {
                continue;
            }
            // Re-anchor to wherever the owner faces now.
            arc.active = true;
            arc.sweep = 0.0;
            arc.base = owner.facing - FRAC_PI_2;
            arc.angular_speed = FRAC_PI_2 / sweep_time(owner.fire_rate, cfg);
            arc.hits.clear();
        }

        arc.sweep = (arc.sweep + arc.angular_speed * dt).min(FRAC_PI_2);

        for e in enemies.iter_mut() {
            if e.is_dead() || arc.hits.contains(&e.id) {
                continue;
            }
            let (dx, dy) = (e.x - owner.x, e.y - owner.y);
            let d = len(dx, dy);
            if d > arc.length + e.r {
                continue;
            }

            let rel = normalize_angle(dy.atan2(dx) - arc.base);
            let pad = (arc.width / 2.0) / d.max(1.0);
            if rel < -pad || rel > arc.sweep + pad {
                continue;
            }

            arc.hits.insert(e.id);
            e.hp -= owner.damage;
            let (nx, ny) = norm(dx, dy);
            e.x += nx * owner.knockback * dt;
            e.y += ny * owner.knockback * dt;
            floats.push(FloatingText {
                x: e.x,
                y: e.y - 18.0,
                ttl: 0.55,
                text: format!("{}", owner.damage.floor()),
                color: COLOR_DAMAGE,
            });
        }

        if arc.sweep >= FRAC_PI_2 {
            arc.active = false;
            arc.hits.clear();
            arc.cooldown = cfg.melee_cooldown;
        }
    }
}
