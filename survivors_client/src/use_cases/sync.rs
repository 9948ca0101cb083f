// Host-authoritative sync: which relay messages a tick produces, and how inbound relay
// messages land in the simulation.

use super::relay_session::RelaySession;
use super::simulation::Simulation;
use super::types::{RelayInbound, RelayOutbound, SimEvent};

/// Messages the host sends after a tick. Guests send nothing.
///
/// Fire events and lifecycle changes come first, then one `PlayerUpdate` with the own
/// snapshot. Melee, enemy and orb state never leave the instance.
pub fn host_outbound(session: &RelaySession, sim: &Simulation, events: &[SimEvent]) -> Vec<RelayOutbound> {
    if !session.is_host() {
        return Vec::new();
    }
    let Some(player_id) = session.player_id() else {
        return Vec::new();
    };

    let mut out: Vec<RelayOutbound> = events
        .iter()
        .filter_map(|ev| match ev {
            SimEvent::ProjectileFired(shot) => Some(RelayOutbound::Projectile {
                player_id: player_id.to_string(),
                shot: *shot,
            }),
            SimEvent::LevelUp { level } => Some(RelayOutbound::LevelUp {
                player_id: player_id.to_string(),
                level: *level,
            }),
            SimEvent::GameOver => Some(RelayOutbound::GameOver),
            SimEvent::Reset => Some(RelayOutbound::Reset),
            SimEvent::UpgradeOffered(_) | SimEvent::UpgradeApplied { .. } => None,
        })
        .collect();

    if let Some(snapshot) = sim.local_snapshot() {
        out.push(RelayOutbound::PlayerUpdate {
            player_id: player_id.to_string(),
            snapshot,
        });
    }
    out
}

/// Applies one relay message to the simulation. Returns any replies.
///
/// `session` must already reflect `msg`; the link updates it before handing messages on.
pub fn apply_inbound(session: &RelaySession, sim: &mut Simulation, msg: RelayInbound) -> Vec<RelayOutbound> {
    match msg {
        RelayInbound::Connected { session: view, .. } => {
            sim.sync_remote_players(&view.players, session.player_id());
            Vec::new()
        }
        RelayInbound::State(view) => {
            sim.sync_remote_players(&view.players, session.player_id());
            // The host nudges a populated but idle session into play.
            if session.is_host() && !view.started && view.players.len() > 1 {
                vec![RelayOutbound::StartGame]
            } else {
                Vec::new()
            }
        }
        RelayInbound::Projectile { shot, .. } => {
            sim.spawn_remote_projectile(shot);
            Vec::new()
        }
        RelayInbound::HostChanged { .. } => Vec::new(),
    }
}
