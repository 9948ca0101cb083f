// Client side of the relay protocol: identity, role and the reconnect policy.
//
// Pure bookkeeping. The link task feeds it socket outcomes and acts on the answers.

use super::types::RelayInbound;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    ConnectedGuest,
    ConnectedHost,
}

impl LinkState {
    pub fn is_connected(self) -> bool {
        matches!(self, LinkState::ConnectedGuest | LinkState::ConnectedHost)
    }
}

/// Bounded exponential backoff: `base * 2^(attempt-1)`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exp)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// What the link should do after losing its socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnect {
    Retry { attempt: u32, delay: Duration },
    GiveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub client_id: String,
    pub player_id: String,
}

#[derive(Debug, Clone)]
pub struct RelaySession {
    state: LinkState,
    identity: Option<Identity>,
    started: bool,
    // Role held on the last live socket; survives into reconnect attempts.
    was_host: bool,
    attempts: u32,
    closed: bool,
    policy: ReconnectPolicy,
}

impl RelaySession {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: LinkState::Disconnected,
            identity: None,
            started: false,
            was_host: false,
            attempts: 0,
            closed: false,
            policy,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_host(&self) -> bool {
        self.state == LinkState::ConnectedHost
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.player_id.as_str())
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn begin_connect(&mut self) {
        if !self.closed {
            self.state = LinkState::Connecting;
        }
    }

    /// Updates identity and role from a relay message.
    pub fn on_inbound(&mut self, msg: &RelayInbound) {
        match msg {
            RelayInbound::Connected {
                client_id,
                player_id,
                is_host,
                session,
                ..
            } => {
                self.identity = Some(Identity {
                    client_id: client_id.clone(),
                    player_id: player_id.clone(),
                });
                self.started = session.started;
                self.attempts = 0;
                self.was_host = *is_host;
                self.state = if *is_host {
                    LinkState::ConnectedHost
                } else {
                    LinkState::ConnectedGuest
                };
                info!(client_id, player_id, is_host, "joined relay session");
            }
            RelayInbound::State(view) => {
                self.started = view.started;
            }
            RelayInbound::HostChanged { new_host_id } => {
                let mine = self
                    .identity
                    .as_ref()
                    .is_some_and(|i| &i.client_id == new_host_id);
                if mine && self.state == LinkState::ConnectedGuest {
                    info!(client_id = new_host_id, "promoted to host");
                    self.state = LinkState::ConnectedHost;
                    self.was_host = true;
                } else if !mine && self.state == LinkState::ConnectedHost {
                    warn!(new_host_id, "host role moved to another client");
                    self.state = LinkState::ConnectedGuest;
                    self.was_host = false;
                }
            }
            RelayInbound::Projectile { .. } => {}
        }
    }

    /// Decides whether a lost socket is worth reconnecting.
    ///
    /// Only a started session or a host role is resumed; an explicit close never is.
    pub fn on_connection_lost(&mut self) -> Reconnect {
        if self.closed || !(self.started || self.was_host) {
            self.state = LinkState::Disconnected;
            return Reconnect::GiveUp;
        }

        self.attempts += 1;
        if self.attempts > self.policy.max_attempts {
            warn!(attempts = self.attempts - 1, "reconnect attempts exhausted");
            self.state = LinkState::Disconnected;
            return Reconnect::GiveUp;
        }

        self.state = LinkState::Connecting;
        Reconnect::Retry {
            attempt: self.attempts,
            delay: self.policy.delay_for(self.attempts),
        }
    }

    /// Explicit close: terminal, no reconnects.
    pub fn close(&mut self) {
        self.closed = true;
        self.state = LinkState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::types::SessionView;

    fn connected(client_id: &str, is_host: bool, started: bool) -> RelayInbound {
        RelayInbound::Connected {
            client_id: client_id.to_string(),
            player_id: "P2".to_string(),
            is_host,
            session: SessionView {
                started,
                ..SessionView::default()
            },
            address_hint: None,
        }
    }

    #[test]
    fn when_attempts_grow_then_delay_doubles_up_to_cap() {
        let policy = ReconnectPolicy {
            max_attempts: 10,
            base: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(4), Duration::from_secs(2));
        assert_eq!(policy.delay_for(40), Duration::from_secs(2));
    }

    #[test]
    fn when_connected_as_guest_then_role_and_identity_are_stored() {
        let mut session = RelaySession::new(ReconnectPolicy::default());
        session.begin_connect();
        assert_eq!(session.state(), LinkState::Connecting);

        session.on_inbound(&connected("c-2", false, true));

        assert_eq!(session.state(), LinkState::ConnectedGuest);
        assert_eq!(session.player_id(), Some("P2"));
        assert!(session.started());
    }

    #[test]
    fn when_host_changed_names_me_then_i_am_promoted() {
        let mut session = RelaySession::new(ReconnectPolicy::default());
        session.on_inbound(&connected("c-2", false, true));

        session.on_inbound(&RelayInbound::HostChanged {
            new_host_id: "c-9".to_string(),
        });
        assert_eq!(session.state(), LinkState::ConnectedGuest);

        session.on_inbound(&RelayInbound::HostChanged {
            new_host_id: "c-2".to_string(),
        });
        assert!(session.is_host());
    }

    #[test]
    fn when_session_never_started_then_guest_gives_up() {
        let mut session = RelaySession::new(ReconnectPolicy::default());
        session.on_inbound(&connected("c-2", false, false));

        assert_eq!(session.on_connection_lost(), Reconnect::GiveUp);
        assert_eq!(session.state(), LinkState::Disconnected);
    }

    #[test]
    fn when_host_loses_socket_then_backoff_is_bounded() {
        let policy = ReconnectPolicy {
            max_attempts: 2,
            base: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };
        let mut session = RelaySession::new(policy);
        session.on_inbound(&connected("c-1", true, false));

        assert_eq!(
            session.on_connection_lost(),
            Reconnect::Retry {
                attempt: 1,
                delay: Duration::from_millis(100)
            }
        );
        assert_eq!(
            session.on_connection_lost(),
            Reconnect::Retry {
                attempt: 2,
                delay: Duration::from_millis(200)
            }
        );
        assert_eq!(session.on_connection_lost(), Reconnect::GiveUp);
        assert_eq!(session.state(), LinkState::Disconnected);
    }

    #[test]
    fn when_reconnect_succeeds_then_attempts_reset() {
        let mut session = RelaySession::new(ReconnectPolicy::default());
        session.on_inbound(&connected("c-2", false, true));
        session.on_connection_lost();
        session.on_connection_lost();

        session.on_inbound(&connected("c-3", false, true));

        assert_eq!(
            session.on_connection_lost(),
            Reconnect::Retry {
                attempt: 1,
                delay: Duration::from_millis(500)
            }
        );
    }

    #[test]
    fn when_closed_explicitly_then_nothing_reconnects() {
        let mut session = RelaySession::new(ReconnectPolicy::default());
        session.on_inbound(&connected("c-1", true, true));

        session.close();
        session.begin_connect();

        assert_eq!(session.state(), LinkState::Disconnected);
        assert_eq!(session.on_connection_lost(), Reconnect::GiveUp);
    }
}
