// One frame of the client: relay inbound, upgrade picks, the tick, then relay outbound.

use super::relay_session::RelaySession;
use super::simulation::Simulation;
use super::sync::{apply_inbound, host_outbound};
use super::types::{Received, RelayOutbound, SimEvent};
use crate::domain::{PlayerInput, Upgrade};

/// Supplies per-tick control state, one entry per local player.
pub trait InputSource {
    fn poll(&mut self, sim: &Simulation) -> Vec<PlayerInput>;
}

/// Reads the store after every tick. Never mutates it.
pub trait FrameObserver {
    fn on_frame(&mut self, sim: &Simulation, events: &[SimEvent]);
}

/// Picks an index out of an open upgrade offer.
pub trait UpgradeChooser {
    fn choose(&mut self, offer: &[Upgrade]) -> usize;
}

pub struct Driver<I, O, C> {
    sim: Simulation,
    input: I,
    observer: O,
    chooser: C,
}

impl<I, O, C> Driver<I, O, C>
where
    I: InputSource,
    O: FrameObserver,
    C: UpgradeChooser,
{
    pub fn new(sim: Simulation, input: I, observer: O, chooser: C) -> Self {
        Self {
            sim,
            input,
            observer,
            chooser,
        }
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Runs one frame and returns what should go to the relay.
    ///
    /// Each inbound message is applied with the session it arrived under; `session` is the
    /// current one and decides what the tick sends. Without a session the instance plays
    /// solo and nothing is returned.
    pub fn frame(
        &mut self,
        dt: f32,
        session: Option<&RelaySession>,
        inbound: Vec<Received>,
    ) -> Vec<RelayOutbound> {
        let mut out = Vec::new();
        for Received { msg, session: after } in inbound {
            out.extend(apply_inbound(&after, &mut self.sim, msg));
        }

        if let Some(offer) = self.sim.offered_upgrades() {
            let index = self.chooser.choose(offer);
            self.sim.apply_choice(index);
        }

        let inputs = self.input.poll(&self.sim);
        self.sim.tick(dt, &inputs);

        let events = self.sim.drain_events();
        self.observer.on_frame(&self.sim, &events);

        if let Some(session) = session {
            out.extend(host_outbound(session, &self.sim, &events));
        }
        out
    }
}
