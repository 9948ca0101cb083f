// Upgrade catalogue. Effects are pure: they take a player and return the upgraded copy.

use super::state::{Player, WeaponKind};

/// Extra proportional boost for picking the same upgrade three times in a row.
pub const STREAK_BONUS: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upgrade {
    Damage,
    AttackSpeed,
    MoveSpeed,
    MaxHp,
    Regen,
    ProjectileSize,
    Pierce,
    Magnet,
    DashCooldown,
    Multishot,
    Knockback,
    Reach,
}

impl Upgrade {
    pub const ALL: [Upgrade; 12] = [
        Upgrade::Damage,
        Upgrade::AttackSpeed,
        Upgrade::MoveSpeed,
        Upgrade::MaxHp,
        Upgrade::Regen,
        Upgrade::ProjectileSize,
        Upgrade::Pierce,
        Upgrade::Magnet,
        Upgrade::DashCooldown,
        Upgrade::Multishot,
        Upgrade::Knockback,
        Upgrade::Reach,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Upgrade::Damage => "dmg",
            Upgrade::AttackSpeed => "as",
            Upgrade::MoveSpeed => "spd",
            Upgrade::MaxHp => "hp",
            Upgrade::Regen => "regen",
            Upgrade::ProjectileSize => "size",
            Upgrade::Pierce => "pierce",
            Upgrade::Magnet => "magnet",
            Upgrade::DashCooldown => "dash",
            Upgrade::Multishot => "multi",
            Upgrade::Knockback => "knock",
            Upgrade::Reach => "reach",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Upgrade::Damage => "+20% damage",
            Upgrade::AttackSpeed => "+18% attack speed",
            Upgrade::MoveSpeed => "+12% move speed",
            Upgrade::MaxHp => "+25 max hp",
            Upgrade::Regen => "+0.6 hp/s",
            Upgrade::ProjectileSize => "+35% size",
            Upgrade::Pierce => "+1 pierce",
            Upgrade::Magnet => "+35% pickup range",
            Upgrade::DashCooldown => "-18% dash cooldown",
            Upgrade::Multishot => "+1 projectile",
            Upgrade::Knockback => "+25% knockback",
            Upgrade::Reach => "+15% reach",
        }
    }

    /// The weapon an upgrade is restricted to, if any.
    pub fn requires(self) -> Option<WeaponKind> {
        match self {
            Upgrade::Pierce | Upgrade::Multishot => Some(WeaponKind::Ranged),
            Upgrade::Reach => Some(WeaponKind::Melee),
            _ => None,
        }
    }

    /// Upgrades usable by at least one of the given local weapons.
    pub fn pool(weapons: &[WeaponKind]) -> Vec<Upgrade> {
        Upgrade::ALL
            .into_iter()
            .filter(|u| match u.requires() {
                Some(kind) => weapons.contains(&kind),
                None => true,
            })
            .collect()
    }

    pub fn apply(self, player: &Player) -> Player {
        let mut p = player.clone();
        match self {
            Upgrade::Damage => p.damage *= 1.2,
            Upgrade::AttackSpeed => p.fire_rate *= 1.18,
            Upgrade::MoveSpeed => p.speed *= 1.12,
            Upgrade::MaxHp => {
                p.hp_max += 25.0;
                p.hp = (p.hp + 25.0).min(p.hp_max);
            }
            Upgrade::Regen => p.regen += 0.6,
            Upgrade::ProjectileSize => p.proj_size *= 1.35,
            Upgrade::Pierce => p.pierce += 1,
            Upgrade::Magnet => p.pickup *= 1.35,
            Upgrade::DashCooldown => p.dash_cd_max *= 0.82,
            Upgrade::Multishot => p.proj_count += 1,
            Upgrade::Knockback => p.knockback *= 1.25,
            Upgrade::Reach => p.reach *= 1.15,
        }
        p
    }

    /// One-time +10% on the stat this upgrade touches. Integer stats round up.
    pub fn apply_streak_bonus(self, player: &Player) -> Player {
        let mut p = player.clone();
        let bump = |v: u32| (v as f32 * STREAK_BONUS).ceil() as u32;
        match self {
            Upgrade::Damage => p.damage *= STREAK_BONUS,
            Upgrade::AttackSpeed => p.fire_rate *= STREAK_BONUS,
            Upgrade::MoveSpeed => p.speed *= STREAK_BONUS,
            Upgrade::MaxHp => {
                let gained = p.hp_max * (STREAK_BONUS - 1.0);
                p.hp_max += gained;
                p.hp = (p.hp + gained).min(p.hp_max);
            }
            Upgrade::Regen => p.regen *= STREAK_BONUS,
            Upgrade::ProjectileSize => p.proj_size *= STREAK_BONUS,
            Upgrade::Pierce => p.pierce = bump(p.pierce),
            Upgrade::Magnet => p.pickup *= STREAK_BONUS,
            Upgrade::DashCooldown => p.dash_cd_max /= STREAK_BONUS,
            Upgrade::Multishot => p.proj_count = bump(p.proj_count),
            Upgrade::Knockback => p.knockback *= STREAK_BONUS,
            Upgrade::Reach => p.reach *= STREAK_BONUS,
        }
        p
    }
}
