use crate::domain::math::{len, lerp, norm, smoothing};
use crate::domain::state::{Player, PlayerInput};
use crate::domain::tuning::PlayerTuning;

pub fn tick_player(p: &mut Player, input: &PlayerInput, dt: f32, cfg: &PlayerTuning) {
    // regen
    if p.regen > 0.0 {
        p.hp = (p.hp + p.regen * dt).min(p.hp_max);
    }

    // timers never go below zero
    p.dash_cd = (p.dash_cd - dt).max(0.0);
    p.invuln = (p.invuln - dt).max(0.0);
    p.dash_time = (p.dash_time - dt).max(0.0);

    let (ix, iy) = input.axis();
    let (mx, my) = norm(ix, iy);
    let moving = len(mx, my) > 0.0;

    // dash start (edge triggered)
    if input.dash_pressed && p.dash_cd <= 0.0 && moving {
        p.dash_time = p.dash_time_max;
        p.dash_cd = p.dash_cd_max;
        p.invuln = p.invuln.max(cfg.dash_invuln);
    }

    let dashing = p.dash_time > 0.0;
    let speed = if dashing { p.dash_speed } else { p.speed };
    let k = if dashing { cfg.dash_accel } else { cfg.accel };
    let blend = smoothing(k, dt);

    p.vx = lerp(p.vx, mx * speed, blend);
    p.vy = lerp(p.vy, my * speed, blend);

    p.x += p.vx * dt;
    p.y += p.vy * dt;

    if moving {
        p.facing = my.atan2(mx);
    }
}

pub fn tick_players(players: &mut [Player], inputs: &[PlayerInput], dt: f32, cfg: &PlayerTuning) {
    for (i, p) in players.iter_mut().enumerate() {
        // Missing input means "no keys held".
        let input = inputs.get(i).copied().unwrap_or_default();
        tick_player(p, &input, dt, cfg);
    }
}
