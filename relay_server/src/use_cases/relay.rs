// Connection table and session bookkeeping for the relay.
//
// Pure state machine: every operation returns the deliveries it produced and the relay
// task decides how to ship them. Only the host may mutate shared state.

use super::types::{ClientCommand, Delivery, Notice, Target};
use crate::domain::{ConnectionRecord, PlayerRecord, SessionState};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct RelayTable {
    // Insertion order doubles as the host promotion order.
    connections: Vec<ConnectionRecord>,
    session: SessionState,
    next_player: u32,
    address_hint: Option<String>,
}

impl RelayTable {
    pub fn new(address_hint: Option<String>) -> Self {
        Self {
            address_hint,
            ..Self::default()
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn connections(&self) -> &[ConnectionRecord] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn host_id(&self) -> Option<&str> {
        self.connections
            .iter()
            .find(|c| c.is_host)
            .map(|c| c.client_id.as_str())
    }

    fn record(&self, client_id: &str) -> Option<&ConnectionRecord> {
        self.connections.iter().find(|c| c.client_id == client_id)
    }

    fn broadcast_session(&self, target: Target) -> Delivery {
        Delivery::new(target, Notice::Session(self.session.clone()))
    }

    /// Registers a new connection. The first connection becomes host.
    pub fn connect(&mut self, client_id: &str) -> Vec<Delivery> {
        if self.record(client_id).is_some() {
            warn!(client_id, "duplicate connect ignored");
            return Vec::new();
        }

        self.next_player += 1;
        let player_id = format!("P{}", self.next_player);
        let is_host = self.connections.is_empty();
        let slot = self.connections.len();

        self.connections.push(ConnectionRecord {
            client_id: client_id.to_string(),
            player_id: player_id.clone(),
            is_host,
        });
        self.session.players.insert(
            player_id.clone(),
            PlayerRecord::spawn(player_id.clone(), slot, is_host),
        );

        // A second player joining starts the shared session.
        if self.connections.len() > 1 && !self.session.started {
            self.session.restart();
            info!(players = self.connections.len(), "session auto-started");
        }

        info!(client_id, player_id, is_host, "client connected");

        vec![
            Delivery::new(
                Target::Only(client_id.to_string()),
                Notice::Welcome {
                    client_id: client_id.to_string(),
                    player_id,
                    is_host,
                    session: self.session.clone(),
                    address_hint: self.address_hint.clone(),
                },
            ),
            self.broadcast_session(Target::All),
        ]
    }

    /// Removes a connection, promoting the next one in join order if the host left.
    pub fn disconnect(&mut self, client_id: &str) -> Vec<Delivery> {
        let Some(index) = self
            .connections
            .iter()
            .position(|c| c.client_id == client_id)
        else {
            return Vec::new();
        };

        let removed = self.connections.remove(index);
        self.session.players.remove(&removed.player_id);
        info!(client_id, player_id = removed.player_id, "client disconnected");

        let mut out = Vec::new();

        if removed.is_host {
            if let Some(next) = self.connections.first_mut() {
                next.is_host = true;
                if let Some(player) = self.session.players.get_mut(&next.player_id) {
                    player.is_host = true;
                }
                info!(
                    new_host = next.client_id,
                    player_id = next.player_id,
                    "host migrated"
                );
                out.push(Delivery::new(
                    Target::All,
                    Notice::HostChanged {
                        new_host_id: next.client_id.clone(),
                    },
                ));
            }
        }

        if self.connections.is_empty() {
            self.session.started = false;
            self.session.game_over = false;
        }

        out.push(self.broadcast_session(Target::All));
        out
    }

    /// Applies a client command. Commands from non-host connections are dropped.
    pub fn handle(&mut self, client_id: &str, command: ClientCommand) -> Vec<Delivery> {
        let Some(sender) = self.record(client_id).cloned() else {
            warn!(client_id, "command from unknown connection");
            return Vec::new();
        };

        if !sender.is_host {
            debug!(client_id, ?command, "non-host command dropped");
            return Vec::new();
        }

        match command {
            ClientCommand::PlayerUpdate { player_id, patch } => {
                if player_id != sender.player_id {
                    debug!(client_id, player_id, "update for foreign player dropped");
                    return Vec::new();
                }
                let Some(player) = self.session.players.get_mut(&player_id) else {
                    return Vec::new();
                };
                player.merge(&patch);
                vec![self.broadcast_session(Target::AllExcept(sender.client_id))]
            }
            ClientCommand::Projectile {
                player_id,
                projectile,
            } => {
                if player_id != sender.player_id {
                    debug!(client_id, player_id, "projectile for foreign player dropped");
                    return Vec::new();
                }
                vec![Delivery::new(
                    Target::AllExcept(sender.client_id),
                    Notice::Projectile {
                        player_id,
                        projectile,
                    },
                )]
            }
            ClientCommand::StartGame => {
                if self.connections.len() < 2 {
                    debug!(client_id, "start ignored without guests");
                    return Vec::new();
                }
                self.session.restart();
                info!(players = self.connections.len(), "session started by host");
                vec![self.broadcast_session(Target::All)]
            }
            ClientCommand::Reset => {
                self.session.game_over = false;
                for (slot, conn) in self.connections.iter().enumerate() {
                    if let Some(player) = self.session.players.get_mut(&conn.player_id) {
                        player.respawn(slot);
                    }
                }
                info!("session reset by host");
                vec![self.broadcast_session(Target::All)]
            }
            ClientCommand::LevelUp { player_id, level } => {
                let Some(player) = self.session.players.get_mut(&player_id) else {
                    return Vec::new();
                };
                player.level = level;
                vec![self.broadcast_session(Target::All)]
            }
            ClientCommand::GameOver => {
                self.session.game_over = true;
                info!("game over reported by host");
                vec![self.broadcast_session(Target::All)]
            }
        }
    }
}
