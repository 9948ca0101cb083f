// Shared team progression: one XP pool, one level, queued upgrade offers.

use super::upgrades::Upgrade;
use rand::Rng;
use std::collections::VecDeque;

pub const XP_TO_NEXT_START: u32 = 18;
pub const CHOICES_PER_OFFER: usize = 3;
const STREAK_LEN: usize = 3;

/// Threshold after `current`: `floor(current * 1.28 + 8)`.
pub fn next_threshold(current: u32) -> u32 {
    (current as f32 * 1.28 + 8.0).floor() as u32
}

/// Result of resolving an open offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub upgrade: Option<Upgrade>,
    pub streak_bonus: bool,
}

#[derive(Debug, Clone)]
pub struct Progression {
    level: u32,
    xp: u32,
    xp_to_next: u32,
    // Level-ups whose offer has not been opened yet.
    pending: u32,
    offer: Option<Vec<Upgrade>>,
    history: VecDeque<Upgrade>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next: XP_TO_NEXT_START,
            pending: 0,
            offer: None,
            history: VecDeque::with_capacity(STREAK_LEN),
        }
    }
}

impl Progression {
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn xp_to_next(&self) -> u32 {
        self.xp_to_next
    }

    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn offer(&self) -> Option<&[Upgrade]> {
        self.offer.as_deref()
    }

    pub fn is_choosing(&self) -> bool {
        self.offer.is_some()
    }

    pub fn history(&self) -> impl Iterator<Item = Upgrade> + '_ {
        self.history.iter().copied()
    }

    /// Adds XP and returns how many thresholds were crossed.
    pub fn grant(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut crossed = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next = next_threshold(self.xp_to_next);
            self.pending += 1;
            crossed += 1;
        }
        crossed
    }

    /// Opens the next queued offer, drawing unique upgrades from `pool`.
    pub fn open_next<R: Rng + ?Sized>(&mut self, rng: &mut R, pool: &[Upgrade]) -> Option<&[Upgrade]> {
        if self.offer.is_some() || self.pending == 0 {
            return None;
        }
        self.pending -= 1;

        let mut remaining = pool.to_vec();
        let mut picks = Vec::with_capacity(CHOICES_PER_OFFER);
        while picks.len() < CHOICES_PER_OFFER && !remaining.is_empty() {
            let i = rng.random_range(0..remaining.len());
            picks.push(remaining.swap_remove(i));
        }

        self.offer = Some(picks);
        self.offer.as_deref()
    }

    /// Closes the open offer. An out-of-range index closes it without picking.
    pub fn choose(&mut self, index: usize) -> Option<Choice> {
        let offer = self.offer.take()?;
        let Some(upgrade) = offer.get(index).copied() else {
            return Some(Choice {
                upgrade: None,
                streak_bonus: false,
            });
        };

        if self.history.len() == STREAK_LEN {
            self.history.pop_front();
        }
        self.history.push_back(upgrade);

        let streak_bonus =
            self.history.len() == STREAK_LEN && self.history.iter().all(|u| *u == upgrade);
        if streak_bonus {
            self.history.clear();
        }

        Some(Choice {
            upgrade: Some(upgrade),
            streak_bonus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn when_threshold_grows_then_formula_floors() {
        assert_eq!(next_threshold(18), 31);
        assert_eq!(next_threshold(31), 47);
    }

    #[test]
    fn when_grant_crosses_two_thresholds_then_two_levels_are_pending() {
        let mut prog = Progression::default();
        assert_eq!(prog.grant(50), 2);
        assert_eq!(prog.level(), 3);
        assert_eq!(prog.xp(), 1);
        assert_eq!(prog.xp_to_next(), 47);
        assert_eq!(prog.pending(), 2);
    }

    #[test]
    fn when_offer_opens_then_choices_are_unique() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut prog = Progression::default();
        prog.grant(18);

        let offer = prog.open_next(&mut rng, &Upgrade::ALL).unwrap().to_vec();
        assert_eq!(offer.len(), CHOICES_PER_OFFER);
        assert_ne!(offer[0], offer[1]);
        assert_ne!(offer[1], offer[2]);
        assert_ne!(offer[0], offer[2]);
        // Only one offer is open at a time.
        prog.grant(100);
        assert!(prog.open_next(&mut rng, &Upgrade::ALL).is_none());
    }

    #[test]
    fn when_pool_is_small_then_offer_shrinks() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut prog = Progression::default();
        prog.grant(18);
        let offer = prog.open_next(&mut rng, &[Upgrade::Damage]).unwrap();
        assert_eq!(offer, &[Upgrade::Damage]);
    }

    #[test]
    fn when_index_is_out_of_range_then_offer_closes_without_pick() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut prog = Progression::default();
        prog.grant(18);
        prog.open_next(&mut rng, &Upgrade::ALL);

        let choice = prog.choose(7).unwrap();
        assert_eq!(choice.upgrade, None);
        assert!(!prog.is_choosing());
        assert_eq!(prog.history().count(), 0);
    }

    #[test]
    fn when_same_upgrade_is_picked_three_times_then_bonus_fires_once() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut prog = Progression::default();
        let mut bonuses = 0;

        for _ in 0..4 {
            prog.grant(prog.xp_to_next());
            prog.open_next(&mut rng, &[Upgrade::Damage]);
            let choice = prog.choose(0).unwrap();
            assert_eq!(choice.upgrade, Some(Upgrade::Damage));
            if choice.streak_bonus {
                bonuses += 1;
            }
        }

        assert_eq!(bonuses, 1);
        assert_eq!(prog.history().count(), 1);
    }

    #[test]
    fn when_picks_differ_then_no_bonus() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut prog = Progression::default();
        for upgrade in [Upgrade::Damage, Upgrade::Damage, Upgrade::Regen] {
            prog.grant(prog.xp_to_next());
            prog.open_next(&mut rng, &[upgrade]);
            assert!(!prog.choose(0).unwrap().streak_bonus);
        }
    }
}
