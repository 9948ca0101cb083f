use super::nearest_enemy;
use crate::domain::math::{len, norm, rand_range};
use crate::domain::state::{
    COLOR_DAMAGE, Enemy, FloatingText, Projectile, SimulationState, WeaponKind,
};
use crate::domain::tuning::CombatTuning;
use rand::Rng;

/// Runs every ranged player's shot accumulator and returns the projectiles fired this tick.
pub fn fire_ranged<R: Rng + ?Sized>(
    state: &mut SimulationState,
    rng: &mut R,
    dt: f32,
    cfg: &CombatTuning,
) -> Vec<Projectile> {
    let mut fired = Vec::new();

    for i in 0..state.players.len() {
        if state.players[i].weapon != WeaponKind::Ranged {
            continue;
        }

        state.players[i].shot_acc += dt;
        let interval = 1.0 / state.players[i].fire_rate;

        while state.players[i].shot_acc >= interval {
            state.players[i].shot_acc -= interval;

            let p = &state.players[i];
            // No target, no shot; the interval is still spent.
            let Some(target) = nearest_enemy(&state.enemies, p.x, p.y) else {
                continue;
            };
            let e = &state.enemies[target];
            let (nx, ny) = norm(e.x - p.x, e.y - p.y);
            let aim = ny.atan2(nx) + rand_range(rng, -cfg.spread, cfg.spread);

            let count = p.proj_count.max(1);
            let mid = (count - 1) as f32 / 2.0;
            let (px, py, speed) = (p.x, p.y, p.proj_speed);
            let (r, damage, pierce, knockback) = (p.proj_size, p.damage, p.pierce, p.knockback);

            for k in 0..count {
                let ang = aim + (k as f32 - mid) * cfg.fan_step;
                let id = state.alloc_id();
                let proj = Projectile {
                    id,
                    x: px,
                    y: py,
                    vx: ang.cos() * speed,
                    vy: ang.sin() * speed,
                    r,
                    life: cfg.proj_life,
                    damage,
                    pierce,
                    knockback,
                    remote: false,
                };
                fired.push(proj.clone());
                state.projectiles.push(proj);
            }
        }
    }

    fired
}

/// Moves projectiles and resolves hits. Each projectile tests each live enemy at most once
/// per tick; a hit consumes one pierce, or removes the projectile when none is left.
pub fn tick_projectiles(
    projectiles: &mut Vec<Projectile>,
    enemies: &mut [Enemy],
    floats: &mut Vec<FloatingText>,
    dt: f32,
) {
    projectiles.retain_mut(|p| {
        p.life -= dt;
        p.x += p.vx * dt;
        p.y += p.vy * dt;

        if p.life <= 0.0 {
            p.life = 0.0;
            return false;
        }

        for e in enemies.iter_mut() {
            if e.is_dead() {
                continue;
            }
            let d = len(p.x - e.x, p.y - e.y);
            if d >= p.r + e.r {
                continue;
            }

            e.hp -= p.damage;
            let (nx, ny) = norm(e.x - p.x, e.y - p.y);
            e.x += nx * p.knockback * dt;
            e.y += ny * p.knockback * dt;
            floats.push(FloatingText {
                x: e.x,
                y: e.y - 18.0,
                ttl: 0.55,
                text: format!("{}", p.damage.floor()),
                color: COLOR_DAMAGE,
            });

            if p.pierce > 0 {
                p.pierce -= 1;
            } else {
                return false;
            }
        }

        true
    });
}
