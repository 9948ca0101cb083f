/// Gameplay tuning for locally controlled players.
///
/// Keep this separate from runtime configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Collision radius in world units.
    pub radius: f32,

    /// Starting and reset health.
    pub hp_max: f32,

    /// Walking speed in units per second.
    pub speed: f32,

    /// Speed target while a dash is active.
    pub dash_speed: f32,

    /// Cooldown between dashes, before upgrades.
    pub dash_cd_max: f32,

    /// How long a dash lasts.
    pub dash_time_max: f32,

    /// Minimum invulnerability granted by a dash.
    pub dash_invuln: f32,

    /// Velocity smoothing rate while walking.
    pub accel: f32,

    /// Velocity smoothing rate while dashing.
    pub dash_accel: f32,

    /// Horizontal gap between local players at spawn.
    pub spawn_spacing: f32,

    /// Pickup radius for XP orbs.
    pub pickup: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 12.0,
            hp_max: 100.0,
            speed: 175.0,
            dash_speed: 460.0,
            dash_cd_max: 1.1,
            dash_time_max: 0.16,
            dash_invuln: 0.12,
            accel: 16.0,
            dash_accel: 26.0,
            spawn_spacing: 40.0,
            pickup: 70.0,
        }
    }
}
