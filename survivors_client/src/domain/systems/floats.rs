use crate::domain::state::FloatingText;

/// Floating text drifts upward and expires at ttl <= 0.
pub fn tick_floats(floats: &mut Vec<FloatingText>, dt: f32, rise: f32) {
    floats.retain_mut(|f| {
        f.ttl -= dt;
        f.y -= rise * dt;
        f.ttl > 0.0
    });
}
