// Simulation engine: owns the entity store, the team progression and the seeded RNG.
//
// One `tick` runs every system in a fixed order. Anything the outside world must react to
// (fired projectiles, level-ups, offers, game over) is queued as a `SimEvent`.

use super::types::SimEvent;
use crate::domain::math::clamp;
use crate::domain::state::COLOR_UPGRADE;
use crate::domain::systems::{enemies, floats, melee, movement, pickup, projectiles, spawner};
use crate::domain::tuning::SimTuning;
use crate::domain::{
    Choice, FloatingText, PlayerInput, PlayerSnapshot, Progression, Projectile, ProjectileShot,
    RemotePlayerSnapshot, RemotePlayerState, SimulationState, Upgrade, WeaponKind,
};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use tracing::{debug, info};

/// Largest step a single tick may take.
pub const MAX_DT: f32 = 1.0 / 20.0;

/// Fraction of the gap a remote player closes toward its target every tick.
pub const REMOTE_BLEND: f32 = 0.35;

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// One entry per local player, in slot order.
    pub weapons: Vec<WeaponKind>,
    pub tuning: SimTuning,
    pub seed: u64,
}

impl SimConfig {
    pub fn solo(weapon: WeaponKind, seed: u64) -> Self {
        Self {
            weapons: vec![weapon],
            tuning: SimTuning::default(),
            seed,
        }
    }
}

pub struct Simulation {
    state: SimulationState,
    progression: Progression,
    rng: Pcg32,
    config: SimConfig,
    events: Vec<SimEvent>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let state = SimulationState::new(
            &config.weapons,
            &config.tuning.player,
            &config.tuning.combat,
        );
        Self {
            state,
            progression: Progression::default(),
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    /// Snapshot of the first local player, the one this instance reports to the relay.
    pub fn local_snapshot(&self) -> Option<PlayerSnapshot> {
        self.state.players.first().map(|p| p.snapshot())
    }

    pub fn offered_upgrades(&self) -> Option<&[Upgrade]> {
        self.progression.offer()
    }

    /// Takes every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advances the simulation by `dt` seconds (clamped to `[0, MAX_DT]`).
    pub fn tick(&mut self, dt: f32, inputs: &[PlayerInput]) {
        let dt = clamp(dt, 0.0, MAX_DT);

        // Remote mirrors keep converging while the local game is frozen.
        for remote in self.state.remote_players.values_mut() {
            remote.smooth(REMOTE_BLEND);
        }

        if self.state.game_over || self.state.paused {
            return;
        }

        let tuning = self.config.tuning;
        let state = &mut self.state;
        state.t += dt;

        movement::tick_players(&mut state.players, inputs, dt, &tuning.player);

        let fired = projectiles::fire_ranged(state, &mut self.rng, dt, &tuning.combat);
        self.events
            .extend(fired.iter().map(|p| SimEvent::ProjectileFired(p.shot())));

        spawner::tick_spawner(state, &mut self.rng, dt, &tuning.enemy);

        let fallen = enemies::tick_enemies(
            &mut state.enemies,
            &mut state.players,
            &mut state.floats,
            dt,
            &tuning.enemy,
        );
        if let Some(slot) = fallen {
            state.game_over = true;
            info!(
                slot,
                t = state.t,
                level = self.progression.level(),
                "local player fell; game over"
            );
            self.events.push(SimEvent::GameOver);
            return;
        }

        projectiles::tick_projectiles(&mut state.projectiles, &mut state.enemies, &mut state.floats, dt);
        melee::tick_melee(
            &mut state.arcs,
            &state.players,
            &mut state.enemies,
            &mut state.floats,
            dt,
            &tuning.combat,
        );

        let killed = pickup::reap_dead(
            &mut state.enemies,
            state.players.len(),
            &mut state.orbs,
            state.t,
            &tuning.pickup,
        );
        if killed > 0 {
            debug!(killed, remaining = state.enemies.len(), "enemies reaped");
        }

        let xp = pickup::tick_orbs(&mut state.orbs, &state.players, dt, &tuning.pickup);
        floats::tick_floats(&mut state.floats, dt, tuning.pickup.float_rise);

        if xp > 0 {
            self.grant_xp(xp);
        }
    }

    /// Adds XP to the team pool, emitting one level-up per crossed threshold.
    pub fn grant_xp(&mut self, amount: u32) {
        let crossed = self.progression.grant(amount);
        if crossed == 0 {
            return;
        }

        let level = self.progression.level();
        for reached in (level + 1 - crossed)..=level {
            info!(level = reached, "level up");
            self.events.push(SimEvent::LevelUp { level: reached });
        }
        for p in &mut self.state.players {
            p.level = level;
        }

        self.open_offer();
    }

    fn open_offer(&mut self) {
        let pool = Upgrade::pool(&self.config.weapons);
        if let Some(offer) = self.progression.open_next(&mut self.rng, &pool) {
            let offer = offer.to_vec();
            debug!(?offer, "upgrade offer opened");
            self.state.paused = true;
            self.events.push(SimEvent::UpgradeOffered(offer));
        }
    }

    /// Resolves the open offer. Returns `None` when no offer is open.
    ///
    /// An out-of-range index closes the offer without applying anything.
    pub fn apply_choice(&mut self, index: usize) -> Option<Choice> {
        let choice = self.progression.choose(index)?;

        if let Some(upgrade) = choice.upgrade {
            for p in &mut self.state.players {
                let mut upgraded = upgrade.apply(p);
                if choice.streak_bonus {
                    upgraded = upgrade.apply_streak_bonus(&upgraded);
                }
                *p = upgraded;
                self.state.floats.push(FloatingText {
                    x: p.x,
                    y: p.y - 24.0,
                    ttl: 1.2,
                    text: upgrade.title().to_string(),
                    color: COLOR_UPGRADE,
                });
            }
            info!(upgrade = upgrade.id(), streak_bonus = choice.streak_bonus, "upgrade applied");
        } else {
            debug!(index, "upgrade pick out of range; offer closed");
        }

        self.events.push(SimEvent::UpgradeApplied {
            upgrade: choice.upgrade,
            streak_bonus: choice.streak_bonus,
        });
        self.state.paused = false;
        self.open_offer();
        Some(choice)
    }

    /// Flips the manual pause. Ignored during game over or an open upgrade offer.
    pub fn toggle_pause(&mut self) -> bool {
        if self.state.game_over || self.progression.is_choosing() {
            return self.state.paused;
        }
        self.state.paused = !self.state.paused;
        self.state.paused
    }

    /// Restores the initial session with the same loadout and seed. Remote mirrors survive.
    pub fn reset(&mut self) {
        let remote_players = std::mem::take(&mut self.state.remote_players);
        self.state = SimulationState::new(
            &self.config.weapons,
            &self.config.tuning.player,
            &self.config.tuning.combat,
        );
        self.state.remote_players = remote_players;
        self.progression = Progression::default();
        self.rng = Pcg32::seed_from_u64(self.config.seed);
        info!(players = self.state.players.len(), "session reset");
        self.events.push(SimEvent::Reset);
    }

    /// Replaces the remote mirror set with `rows`, skipping this instance's own player.
    pub fn sync_remote_players(&mut self, rows: &[RemotePlayerState], own_id: Option<&str>) {
        let remotes = &mut self.state.remote_players;
        remotes.retain(|id, _| rows.iter().any(|r| &r.id == id));

        for row in rows {
            if Some(row.id.as_str()) == own_id {
                continue;
            }
            match remotes.get_mut(&row.id) {
                Some(existing) => existing.update(row),
                None => {
                    remotes.insert(row.id.clone(), RemotePlayerSnapshot::from_state(row));
                }
            }
        }
        if let Some(id) = own_id {
            remotes.remove(id);
        }
    }

    /// Mirrors a projectile fired by another peer. It damages local enemies but is never
    /// reported as a local fire event.
    pub fn spawn_remote_projectile(&mut self, shot: ProjectileShot) {
        let id = self.state.alloc_id();
        self.state.projectiles.push(Projectile {
            id,
            x: shot.x,
            y: shot.y,
            vx: shot.vx,
            vy: shot.vy,
            r: shot.r,
            life: shot.life.max(0.0),
            damage: shot.damage,
            pierce: shot.pierce,
            knockback: self.config.tuning.combat.knockback,
            remote: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::EnemyKind;
    use crate::domain::systems::spawner::make_enemy;
    use crate::domain::tuning::EnemyTuning;

    fn solo(weapon: WeaponKind) -> Simulation {
        Simulation::new(SimConfig::solo(weapon, 42))
    }

    fn remote(id: &str, x: f32) -> RemotePlayerState {
        RemotePlayerState {
            id: id.to_string(),
            is_host: false,
            stats: PlayerSnapshot {
                x,
                ..PlayerSnapshot::default()
            },
        }
    }

    fn count<F: Fn(&SimEvent) -> bool>(events: &[SimEvent], f: F) -> usize {
        events.iter().filter(|e| f(e)).count()
    }

    #[test]
    fn when_dt_is_large_then_it_is_clamped() {
        let mut sim = solo(WeaponKind::Ranged);
        sim.tick(1.0, &[]);
        assert!((sim.state().t - MAX_DT).abs() < 1e-6);

        sim.tick(-1.0, &[]);
        assert!((sim.state().t - MAX_DT).abs() < 1e-6);
    }

    #[test]
    fn when_paused_then_time_stands_still_but_remotes_still_smooth() {
        let mut sim = solo(WeaponKind::Ranged);
        sim.sync_remote_players(&[remote("P2", 0.0)], Some("P1"));
        sim.sync_remote_players(&[remote("P2", 100.0)], Some("P1"));

        assert!(sim.toggle_pause());
        sim.tick(0.016, &[]);

        assert_eq!(sim.state().t, 0.0);
        let mirrored = &sim.state().remote_players["P2"];
        assert!((mirrored.x - 35.0).abs() < 1e-4);
    }

    #[test]
    fn when_fifty_xp_is_granted_then_two_offers_follow_in_turn() {
        let mut sim = solo(WeaponKind::Ranged);
        sim.grant_xp(50);

        assert_eq!(sim.progression().level(), 3);
        assert_eq!(sim.state().players[0].level, 3);
        assert!(sim.is_paused());
        // Pause cannot be lifted by hand while choosing.
        assert!(sim.toggle_pause());

        let mut events = sim.drain_events();
        assert_eq!(count(&events, |e| matches!(e, SimEvent::LevelUp { .. })), 2);

        sim.apply_choice(0);
        assert!(sim.is_paused());
        sim.apply_choice(0);
        assert!(!sim.is_paused());
        assert!(sim.apply_choice(0).is_none());

        events.extend(sim.drain_events());
        assert_eq!(count(&events, |e| matches!(e, SimEvent::UpgradeOffered(_))), 2);
        assert_eq!(count(&events, |e| matches!(e, SimEvent::UpgradeApplied { .. })), 2);
    }

    #[test]
    fn when_offer_is_drawn_for_melee_then_ranged_only_upgrades_are_absent() {
        let mut sim = solo(WeaponKind::Melee);
        for _ in 0..20 {
            sim.grant_xp(sim.progression().xp_to_next());
            let offer = sim.offered_upgrades().map(<[Upgrade]>::to_vec).unwrap_or_default();
            assert!(!offer.contains(&Upgrade::Pierce));
            assert!(!offer.contains(&Upgrade::Multishot));
            sim.apply_choice(0);
        }
    }

    #[test]
    fn when_damage_is_picked_three_times_then_bonus_applies_once() {
        let mut sim = solo(WeaponKind::Ranged);
        let mut picks = 0;

        for _ in 0..200 {
            if picks == 4 {
                break;
            }
            sim.grant_xp(sim.progression().xp_to_next());
            let index = sim
                .offered_upgrades()
                .and_then(|o| o.iter().position(|u| *u == Upgrade::Damage));
            match index {
                Some(i) => {
                    sim.apply_choice(i);
                    picks += 1;
                    if picks == 3 {
                        let expected = 9.0 * 1.2f32.powi(3) * 1.1;
                        assert!((sim.state().players[0].damage - expected).abs() < 1e-3);
                    }
                }
                // Skipping keeps the streak intact.
                None => {
                    sim.apply_choice(usize::MAX);
                }
            }
        }

        assert_eq!(picks, 4);
        let expected = 9.0 * 1.2f32.powi(4) * 1.1;
        assert!((sim.state().players[0].damage - expected).abs() < 1e-3);
        let bonuses = sim
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SimEvent::UpgradeApplied { streak_bonus: true, .. }))
            .count();
        assert_eq!(bonuses, 1);
    }

    #[test]
    fn when_player_falls_then_game_over_freezes_the_session() {
        let mut sim = solo(WeaponKind::Ranged);
        sim.state.players[0].hp = 1.0;
        let enemy = make_enemy(500, EnemyKind::Grunt, 0.0, 0.0, 0.0, &EnemyTuning::default());
        sim.state.enemies.push(enemy);

        sim.tick(0.016, &[]);

        assert!(sim.is_game_over());
        assert_eq!(sim.state().players[0].hp, 0.0);
        assert!(sim.drain_events().contains(&SimEvent::GameOver));

        let t = sim.state().t;
        sim.tick(0.016, &[]);
        assert_eq!(sim.state().t, t);
        assert!(!sim.toggle_pause());
    }

    #[test]
    fn when_reset_then_initial_session_returns() {
        let mut sim = solo(WeaponKind::Melee);
        sim.grant_xp(40);
        sim.state.players[0].hp = 0.0;
        sim.state.game_over = true;

        sim.reset();

        assert!(!sim.is_game_over());
        assert!(!sim.is_paused());
        assert_eq!(sim.progression().level(), 1);
        assert_eq!(sim.state().players[0].hp, 100.0);
        assert_eq!(sim.state().arcs.len(), 1);
        assert!(sim.drain_events().contains(&SimEvent::Reset));
    }

    #[test]
    fn when_enemy_is_near_ranged_player_then_fire_events_are_queued() {
        let mut sim = solo(WeaponKind::Ranged);
        let enemy = make_enemy(500, EnemyKind::Tank, 150.0, 0.0, 0.0, &EnemyTuning::default());
        sim.state.enemies.push(enemy);

        for _ in 0..30 {
            sim.tick(1.0 / 60.0, &[]);
        }

        let fired = count(&sim.drain_events(), |e| matches!(e, SimEvent::ProjectileFired(_)));
        assert!(fired >= 1);
    }

    #[test]
    fn when_remote_projectile_arrives_then_it_is_not_reported_again() {
        let mut sim = solo(WeaponKind::Melee);
        sim.spawn_remote_projectile(ProjectileShot {
            x: 0.0,
            y: 0.0,
            vx: 420.0,
            vy: 0.0,
            r: 4.0,
            life: 1.35,
            damage: 9.0,
            pierce: 0,
        });

        sim.tick(1.0 / 60.0, &[]);

        assert_eq!(sim.state().projectiles.len(), 1);
        assert!(sim.state().projectiles[0].remote);
        assert_eq!(
            count(&sim.drain_events(), |e| matches!(e, SimEvent::ProjectileFired(_))),
            0
        );
    }

    #[test]
    fn when_table_changes_then_mirrors_follow_and_own_row_is_skipped() {
        let mut sim = solo(WeaponKind::Ranged);
        sim.sync_remote_players(&[remote("P1", 0.0), remote("P2", 5.0), remote("P3", 9.0)], Some("P1"));
        assert_eq!(sim.state().remote_players.len(), 2);

        sim.sync_remote_players(&[remote("P1", 0.0), remote("P3", 9.0)], Some("P1"));
        let ids: Vec<&str> = sim.state().remote_players.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["P3"]);
    }
}
