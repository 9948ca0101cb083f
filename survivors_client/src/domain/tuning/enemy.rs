/// Gameplay tuning for enemy waves.

/// Base stats for one enemy kind before time scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct EnemyTuning {
    pub grunt: EnemyStats,
    pub runner: EnemyStats,
    pub tank: EnemyStats,

    /// Spawns per second at t = 0.
    pub base_spawn_rate: f32,

    /// Seconds for the spawn rate to grow by one enemy per second.
    pub spawn_ramp: f32,

    /// Seconds for the stat scale to grow by one.
    pub scale_period: f32,

    pub runner_after: f32,
    pub runner_chance: f32,
    pub tank_after: f32,
    pub tank_chance: f32,

    pub spawn_min_dist: f32,
    pub spawn_max_dist: f32,

    /// Velocity smoothing rate while chasing.
    pub steer: f32,

    pub hit_cooldown: f32,
    pub contact_invuln: f32,

    /// Fraction of the overlap the enemy is pushed back on contact.
    pub push: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            grunt: EnemyStats {
                hp: 26.0,
                speed: 60.0,
                damage: 12.0,
                radius: 12.0,
            },
            runner: EnemyStats {
                hp: 18.0,
                speed: 92.0,
                damage: 10.0,
                radius: 10.0,
            },
            tank: EnemyStats {
                hp: 60.0,
                speed: 42.0,
                damage: 18.0,
                radius: 15.0,
            },
            base_spawn_rate: 0.9,
            spawn_ramp: 35.0,
            scale_period: 45.0,
            runner_after: 25.0,
            runner_chance: 0.12,
            tank_after: 45.0,
            tank_chance: 0.20,
            spawn_min_dist: 360.0,
            spawn_max_dist: 520.0,
            steer: 8.0,
            hit_cooldown: 0.55,
            contact_invuln: 0.42,
            push: 0.6,
        }
    }
}
