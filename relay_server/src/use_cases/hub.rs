// Relay task: the single owner of the connection table and the per-connection outboxes.

use super::relay::RelayTable;
use super::types::{Delivery, Notice, RelayEvent, RelayStatus};
use axum::extract::ws::Utf8Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, info, warn};

/// Serializes a notice into the shared wire text. `None` drops the delivery.
pub type NoticeEncoder = fn(&Notice) -> Option<Utf8Bytes>;

pub async fn relay_task(
    mut event_rx: mpsc::Receiver<RelayEvent>,
    mut table: RelayTable,
    encode: NoticeEncoder,
    status_tx: watch::Sender<RelayStatus>,
    shutdown: Arc<Notify>,
) {
    let mut outboxes: HashMap<String, mpsc::Sender<Utf8Bytes>> = HashMap::new();

    loop {
        let event = tokio::select! {
            _ = shutdown.notified() => break,
            event = event_rx.recv() => match event {
                Some(event) => event,
                // Every sender is gone; nothing can reach the table anymore.
                None => break,
            },
        };

        let deliveries = match event {
            RelayEvent::Connect {
                client_id,
                outbox,
                joined,
            } => {
                outboxes.insert(client_id.clone(), outbox);
                let deliveries = table.connect(&client_id);
                let player_id = table
                    .connections()
                    .iter()
                    .find(|c| c.client_id == client_id)
                    .map(|c| c.player_id.clone());
                if let Some(player_id) = player_id {
                    if joined.send(player_id).is_err() {
                        debug!(client_id, "connection left before its join was confirmed");
                    }
                }
                deliveries
            }
            RelayEvent::Disconnect { client_id } => {
                outboxes.remove(&client_id);
                table.disconnect(&client_id)
            }
            RelayEvent::Command { client_id, command } => table.handle(&client_id, command),
        };

        dispatch(deliveries, &mut table, &mut outboxes, encode);

        // Never fails, even once the idle watcher has gone away.
        status_tx.send_replace(RelayStatus {
            connections: table.len(),
            started: table.session().started,
            last_activity: Instant::now(),
        });
    }

    info!(connections = table.len(), "relay task stopped");
}

// Fans deliveries out. A connection whose outbox is full or closed is torn down and the
// resulting notices are dispatched in the same pass.
fn dispatch(
    deliveries: Vec<Delivery>,
    table: &mut RelayTable,
    outboxes: &mut HashMap<String, mpsc::Sender<Utf8Bytes>>,
    encode: NoticeEncoder,
) {
    let mut queue: VecDeque<Delivery> = deliveries.into();

    while let Some(delivery) = queue.pop_front() {
        let Some(bytes) = encode(&delivery.notice) else {
            continue;
        };

        let mut failed: Vec<String> = Vec::new();
        for (client_id, outbox) in outboxes.iter() {
            if !delivery.target.includes(client_id) {
                continue;
            }
            match outbox.try_send(bytes.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(client_id, "outbox full, dropping connection");
                    failed.push(client_id.clone());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(client_id, "outbox closed");
                    failed.push(client_id.clone());
                }
            }
        }

        for client_id in failed {
            // Dropping the sender ends the connection's writer loop.
            outboxes.remove(&client_id);
            queue.extend(table.disconnect(&client_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::types::ClientCommand;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn encode_kind(notice: &Notice) -> Option<Utf8Bytes> {
        let kind = match notice {
            Notice::Welcome { player_id, .. } => format!("welcome:{player_id}"),
            Notice::Session(session) => format!("session:{}", session.players.len()),
            Notice::Projectile { player_id, .. } => format!("projectile:{player_id}"),
            Notice::HostChanged { new_host_id } => format!("host:{new_host_id}"),
        };
        Some(Utf8Bytes::from(kind))
    }

    struct Harness {
        event_tx: mpsc::Sender<RelayEvent>,
        status_rx: watch::Receiver<RelayStatus>,
        shutdown: Arc<Notify>,
    }

    fn start() -> Harness {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = watch::channel(RelayStatus::idle_since(Instant::now()));
        let shutdown = Arc::new(Notify::new());
        tokio::spawn(relay_task(
            event_rx,
            RelayTable::new(None),
            encode_kind,
            status_tx,
            shutdown.clone(),
        ));
        Harness {
            event_tx,
            status_rx,
            shutdown,
        }
    }

    async fn join_as(
        harness: &Harness,
        id: &str,
        capacity: usize,
    ) -> (mpsc::Receiver<Utf8Bytes>, oneshot::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let (joined_tx, joined_rx) = oneshot::channel();
        harness
            .event_tx
            .send(RelayEvent::Connect {
                client_id: id.to_string(),
                outbox: tx,
                joined: joined_tx,
            })
            .await
            .unwrap();
        (rx, joined_rx)
    }

    async fn join(harness: &Harness, id: &str, capacity: usize) -> mpsc::Receiver<Utf8Bytes> {
        join_as(harness, id, capacity).await.0
    }

    async fn next(rx: &mut mpsc::Receiver<Utf8Bytes>) -> String {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("outbox closed")
            .to_string()
    }

    #[tokio::test]
    async fn when_clients_join_then_each_gets_welcome_and_table() {
        let mut harness = start();
        let mut a = join(&harness, "a", 16).await;
        assert_eq!(next(&mut a).await, "welcome:P1");
        assert_eq!(next(&mut a).await, "session:1");

        let mut b = join(&harness, "b", 16).await;
        assert_eq!(next(&mut b).await, "welcome:P2");
        assert_eq!(next(&mut b).await, "session:2");
        assert_eq!(next(&mut a).await, "session:2");

        let status = harness
            .status_rx
            .wait_for(|s| s.connections == 2)
            .await
            .unwrap();
        assert!(status.started);
    }

    #[tokio::test]
    async fn when_client_connects_then_assigned_player_id_is_confirmed() {
        let harness = start();
        let (_a, a_joined) = join_as(&harness, "a", 16).await;
        let (_b, b_joined) = join_as(&harness, "b", 16).await;

        assert_eq!(a_joined.await.unwrap(), "P1");
        assert_eq!(b_joined.await.unwrap(), "P2");
    }

    #[tokio::test]
    async fn when_status_watcher_is_gone_then_relay_keeps_serving() {
        let Harness {
            event_tx,
            status_rx,
            shutdown: _shutdown,
        } = start();
        drop(status_rx);

        for (client_id, player_id) in [("a", "P1"), ("b", "P2")] {
            let (tx, mut rx) = mpsc::channel(16);
            let (joined_tx, joined_rx) = oneshot::channel();
            event_tx
                .send(RelayEvent::Connect {
                    client_id: client_id.to_string(),
                    outbox: tx,
                    joined: joined_tx,
                })
                .await
                .unwrap();

            assert_eq!(joined_rx.await.unwrap(), player_id);
            assert_eq!(next(&mut rx).await, format!("welcome:{player_id}"));
        }
    }

    #[tokio::test]
    async fn when_outbox_is_full_then_only_that_connection_is_dropped() {
        let harness = start();
        let mut a = join(&harness, "a", 64).await;
        // Capacity one: the welcome fits, the table broadcast does not.
        let mut b = join(&harness, "b", 1).await;

        assert_eq!(next(&mut a).await, "welcome:P1");
        assert_eq!(next(&mut a).await, "session:1");
        assert_eq!(next(&mut a).await, "session:2");
        assert_eq!(next(&mut a).await, "session:1");

        assert_eq!(next(&mut b).await, "welcome:P2");
        let closed = tokio::time::timeout(Duration::from_secs(1), b.recv())
            .await
            .unwrap();
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn when_host_projectile_arrives_then_sender_is_skipped() {
        let harness = start();
        let mut a = join(&harness, "a", 16).await;
        let mut b = join(&harness, "b", 16).await;
        for _ in 0..3 {
            next(&mut a).await;
        }
        for _ in 0..2 {
            next(&mut b).await;
        }

        harness
            .event_tx
            .send(RelayEvent::Command {
                client_id: "a".into(),
                command: ClientCommand::Projectile {
                    player_id: "P1".into(),
                    projectile: crate::domain::RelayedProjectile {
                        x: 0.0,
                        y: 0.0,
                        vx: 1.0,
                        vy: 0.0,
                        r: 4.0,
                        life: 1.0,
                        damage: 9.0,
                        pierce: 0,
                    },
                },
            })
            .await
            .unwrap();

        assert_eq!(next(&mut b).await, "projectile:P1");
        assert!(a.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_shutdown_is_notified_then_outboxes_close() {
        let harness = start();
        let mut a = join(&harness, "a", 16).await;
        next(&mut a).await;
        next(&mut a).await;

        harness.shutdown.notify_one();

        let closed = tokio::time::timeout(Duration::from_secs(1), a.recv())
            .await
            .unwrap();
        assert!(closed.is_none());
    }
}
