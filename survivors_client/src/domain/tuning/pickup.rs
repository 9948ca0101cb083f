/// Gameplay tuning for XP orbs and presentational text.

#[derive(Debug, Clone, Copy)]
pub struct PickupTuning {
    pub orb_radius: f32,

    /// Pull speed at the centre of the pickup radius.
    pub pull_speed: f32,

    /// Extra slack added to the contact distance.
    pub contact_pad: f32,

    /// Orb value at t = 0 before the kind multiplier.
    pub base_xp: u32,

    /// Every `xp_step` seconds the base value grows by one.
    pub xp_step: f32,

    /// Upward drift of floating text in units per second.
    pub float_rise: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            orb_radius: 6.0,
            pull_speed: 260.0,
            contact_pad: 2.0,
            base_xp: 4,
            xp_step: 25.0,
            float_rise: 18.0,
        }
    }
}
