/// Gameplay tuning for weapons.

#[derive(Debug, Clone, Copy)]
pub struct CombatTuning {
    pub damage: f32,

    /// Shots (or melee sweeps) per second before upgrades.
    pub fire_rate: f32,

    pub proj_speed: f32,
    pub proj_size: f32,
    pub proj_life: f32,

    /// Random aim jitter in radians, applied +/- around the target bearing.
    pub spread: f32,

    /// Angle between fanned projectiles when more than one is fired.
    pub fan_step: f32,

    pub knockback: f32,

    /// Sweep duration at the base fire rate; scales inversely with fire rate.
    pub melee_sweep_time: f32,

    /// Pause between two sweeps.
    pub melee_cooldown: f32,

    /// Arc length is `(melee_length + melee_length_per_size * proj_size) * reach`.
    pub melee_length: f32,
    pub melee_length_per_size: f32,

    /// Arc width is `melee_width + proj_size`.
    pub melee_width: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            damage: 9.0,
            fire_rate: 3.2,
            proj_speed: 420.0,
            proj_size: 4.0,
            proj_life: 1.35,
            spread: 0.06,
            fan_step: 0.12,
            knockback: 120.0,
            melee_sweep_time: 0.22,
            melee_cooldown: 0.35,
            melee_length: 46.0,
            melee_length_per_size: 3.0,
            melee_width: 10.0,
        }
    }
}
