// Framework bootstrap for the headless client.

use crate::domain::{PlayerInput, Upgrade};
use crate::frameworks::config::ClientSettings;
use crate::interface_adapters::{RelayLink, spawn_link};
use crate::use_cases::{
    Driver, FrameObserver, InputSource, SimEvent, Simulation, UpgradeChooser,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::info;

pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Bot input: every local player wanders in a random direction, re-rolled every second,
/// and dashes now and then.
pub struct WanderInput {
    rng: Pcg32,
    held: Vec<PlayerInput>,
    next_turn: f32,
}

impl WanderInput {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            held: Vec::new(),
            next_turn: 0.0,
        }
    }
}

impl InputSource for WanderInput {
    fn poll(&mut self, sim: &Simulation) -> Vec<PlayerInput> {
        let players = sim.state().players.len();
        let t = sim.state().t;

        if self.held.len() != players || t >= self.next_turn {
            self.next_turn = t + 1.0;
            self.held = (0..players)
                .map(|_| PlayerInput {
                    up: self.rng.random_bool(0.5),
                    down: self.rng.random_bool(0.5),
                    left: self.rng.random_bool(0.5),
                    right: self.rng.random_bool(0.5),
                    dash_pressed: false,
                })
                .collect();
        }

        // Dash is an edge: raise it for a single frame at a time.
        self.held
            .iter()
            .map(|held| PlayerInput {
                dash_pressed: self.rng.random_bool(0.01),
                ..*held
            })
            .collect()
    }
}

/// Picks uniformly from each offer.
pub struct RandomChooser {
    rng: Pcg32,
}

impl RandomChooser {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl UpgradeChooser for RandomChooser {
    fn choose(&mut self, offer: &[Upgrade]) -> usize {
        if offer.is_empty() {
            return 0;
        }
        self.rng.random_range(0..offer.len())
    }
}

/// Logs notable events and a periodic summary of the store.
pub struct LogObserver {
    every: Duration,
    last: Instant,
}

impl LogObserver {
    pub fn new(every: Duration) -> Self {
        Self {
            every,
            last: Instant::now(),
        }
    }
}

impl FrameObserver for LogObserver {
    fn on_frame(&mut self, sim: &Simulation, events: &[SimEvent]) {
        for ev in events {
            match ev {
                SimEvent::UpgradeApplied {
                    upgrade: Some(upgrade),
                    streak_bonus,
                } => info!(upgrade = upgrade.title(), streak_bonus, "picked upgrade"),
                SimEvent::GameOver => info!(
                    t = sim.state().t,
                    level = sim.progression().level(),
                    "run ended"
                ),
                _ => {}
            }
        }

        if self.last.elapsed() >= self.every {
            self.last = Instant::now();
            let state = sim.state();
            info!(
                t = state.t,
                level = sim.progression().level(),
                xp = sim.progression().xp(),
                hp = state.players.first().map(|p| p.hp).unwrap_or_default(),
                enemies = state.enemies.len(),
                projectiles = state.projectiles.len(),
                remotes = state.remote_players.len(),
                "frame"
            );
        }
    }
}

/// Runs the headless client until game over, the run limit, or ctrl-c.
pub async fn run(settings: ClientSettings) {
    let seed = settings.sim.seed;
    info!(
        seed,
        weapons = ?settings.sim.weapons,
        relay = settings.relay_url.as_deref().unwrap_or("none"),
        "starting client"
    );

    let mut link: Option<RelayLink> = settings
        .relay_url
        .clone()
        .map(|url| spawn_link(url, settings.reconnect, settings.capacity));

    let mut driver = Driver::new(
        Simulation::new(settings.sim.clone()),
        WanderInput::new(seed.wrapping_add(1)),
        LogObserver::new(Duration::from_secs(5)),
        RandomChooser::new(seed.wrapping_add(2)),
    );

    let mut interval = tokio::time::interval(settings.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            _ = interval.tick() => {}
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let (session, inbound) = match link.as_mut() {
            Some(link) => {
                let inbound = std::iter::from_fn(|| link.try_recv()).collect();
                (Some(link.session()), inbound)
            }
            None => (None, Vec::new()),
        };

        let outbound = driver.frame(dt, session.as_ref(), inbound);
        if let Some(link) = link.as_mut() {
            for msg in outbound {
                link.send(msg);
            }
        }

        if driver.sim().is_game_over() {
            break;
        }
        if settings.run_for.is_some_and(|limit| started.elapsed() >= limit) {
            info!("run limit reached");
            break;
        }
    }

    if let Some(link) = link {
        link.shutdown().await;
    }
}

/// Reads settings from the environment and runs.
pub async fn run_with_config() {
    init_runtime();
    run(ClientSettings::from_env()).await;
}
