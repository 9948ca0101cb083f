use crate::domain::WeaponKind;
use crate::domain::tuning::SimTuning;
use crate::interface_adapters::LinkCapacity;
use crate::use_cases::{ReconnectPolicy, SimConfig};
use std::{
    env,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::warn;

// Runtime constants. Gameplay numbers live in `domain::tuning`.

/// Frame period of the headless driver (60 Hz).
pub const TICK_INTERVAL: Duration = Duration::from_micros(16_667);
pub const INBOUND_CHANNEL_CAPACITY: usize = 256;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_RECONNECT_BASE_MS: u64 = 500;
const DEFAULT_RECONNECT_MAX_MS: u64 = 8_000;
const MAX_LOCAL_PLAYERS: usize = 2;

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Relay WebSocket URL; unset means solo play.
pub fn relay_url() -> Option<String> {
    env::var("RELAY_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn reconnect_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        max_attempts: env_parse("RELAY_RECONNECT_ATTEMPTS").unwrap_or(DEFAULT_RECONNECT_ATTEMPTS),
        base: Duration::from_millis(
            env_parse("RELAY_RECONNECT_BASE_MS").unwrap_or(DEFAULT_RECONNECT_BASE_MS),
        ),
        max_delay: Duration::from_millis(
            env_parse("RELAY_RECONNECT_MAX_MS").unwrap_or(DEFAULT_RECONNECT_MAX_MS),
        ),
    }
}

// Unset seed: derive one from the clock so solo runs differ.
pub fn seed() -> u64 {
    env_parse("SURVIVORS_SEED").unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64
    })
}

/// Weapons for `count` local players from a comma-separated list, cycled as needed.
pub fn parse_weapons(raw: Option<&str>, count: usize) -> Vec<WeaponKind> {
    let mut listed: Vec<WeaponKind> = Vec::new();
    for part in raw.unwrap_or("").split(',').filter(|p| !p.trim().is_empty()) {
        match part.parse::<WeaponKind>() {
            Ok(kind) => listed.push(kind),
            Err(e) => warn!(error = %e, "ignoring weapon entry"),
        }
    }
    if listed.is_empty() {
        listed.push(WeaponKind::Ranged);
    }

    listed.iter().copied().cycle().take(count).collect()
}

pub fn local_players() -> usize {
    env_parse::<usize>("SURVIVORS_LOCAL_PLAYERS")
        .unwrap_or(1)
        .clamp(1, MAX_LOCAL_PLAYERS)
}

pub fn weapons() -> Vec<WeaponKind> {
    parse_weapons(env::var("SURVIVORS_WEAPON").ok().as_deref(), local_players())
}

// Unset or zero runs until game over or ctrl-c.
pub fn run_for() -> Option<Duration> {
    env_parse::<u64>("SURVIVORS_RUN_SECS")
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Everything the headless client needs.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub relay_url: Option<String>,
    pub reconnect: ReconnectPolicy,
    pub capacity: LinkCapacity,
    pub sim: SimConfig,
    pub tick: Duration,
    pub run_for: Option<Duration>,
}

impl ClientSettings {
    pub fn from_env() -> Self {
        Self {
            relay_url: relay_url(),
            reconnect: reconnect_policy(),
            sim: SimConfig {
                weapons: weapons(),
                tuning: SimTuning::default(),
                seed: seed(),
            },
            run_for: run_for(),
            ..Self::default()
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            relay_url: None,
            reconnect: ReconnectPolicy::default(),
            capacity: LinkCapacity {
                inbound: INBOUND_CHANNEL_CAPACITY,
                outbound: OUTBOUND_CHANNEL_CAPACITY,
            },
            sim: SimConfig::solo(WeaponKind::Ranged, 0),
            tick: TICK_INTERVAL,
            run_for: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_weapon_list_is_short_then_it_cycles() {
        assert_eq!(
            parse_weapons(Some("melee"), 2),
            vec![WeaponKind::Melee, WeaponKind::Melee]
        );
        assert_eq!(
            parse_weapons(Some("gun, sword"), 2),
            vec![WeaponKind::Ranged, WeaponKind::Melee]
        );
    }

    #[test]
    fn when_weapon_list_is_empty_or_bogus_then_ranged_is_used() {
        assert_eq!(parse_weapons(None, 1), vec![WeaponKind::Ranged]);
        assert_eq!(parse_weapons(Some("bow,"), 1), vec![WeaponKind::Ranged]);
    }
}
