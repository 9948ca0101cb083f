// Small vector helpers shared by every system. Positions are plain (x, y) pairs.

use rand::Rng;
use std::f32::consts::{PI, TAU};

pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn len(x: f32, y: f32) -> f32 {
    x.hypot(y)
}

pub fn dist_sq(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    dx * dx + dy * dy
}

/// Unit vector in the direction of (x, y); the zero vector stays zero.
pub fn norm(x: f32, y: f32) -> (f32, f32) {
    let l = len(x, y);
    if l > 0.0 { (x / l, y / l) } else { (0.0, 0.0) }
}

pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}

/// Frame-rate independent blend factor for exponential smoothing with rate `k`.
pub fn smoothing(k: f32, dt: f32) -> f32 {
    1.0 - (-k * dt).exp()
}

/// Wraps an angle into (-PI, PI].
pub fn normalize_angle(a: f32) -> f32 {
    let wrapped = a.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}
