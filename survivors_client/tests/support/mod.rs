// Shared helpers for booting a relay and driving client links against it.
#![allow(dead_code)]

use relay_server::RelaySettings;
use std::net::SocketAddr;
use std::time::Duration;
use survivors_client::domain::ProjectileShot;
use survivors_client::interface_adapters::{LinkCapacity, RelayLink, spawn_link};
use survivors_client::use_cases::{ReconnectPolicy, RelayInbound, RelaySession, SessionView};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(3);

// Every test gets its own relay so sessions never leak between tests.
pub async fn start_relay() -> String {
    ws_url(start_relay_at().await)
}

pub async fn start_relay_at() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        relay_server::serve(listener, RelaySettings::default())
            .await
            .expect("relay failed");
    });
    addr
}

pub fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{addr}/ws")
}

/// TCP forwarder in front of a relay whose open pipes can be severed on demand.
pub struct Forwarder {
    pub url: String,
    cut_tx: watch::Sender<u64>,
}

impl Forwarder {
    // Drops every pipe open right now; later connections pass through again.
    pub fn cut(&self) {
        self.cut_tx.send_modify(|generation| *generation += 1);
    }
}

pub async fn start_forwarder(upstream: SocketAddr) -> Forwarder {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind forwarder port");
    let addr = listener.local_addr().expect("forwarder addr");
    let (cut_tx, cut_rx) = watch::channel(0u64);

    tokio::spawn(async move {
        while let Ok((mut client, _)) = listener.accept().await {
            let mut cut = cut_rx.clone();
            cut.mark_unchanged();
            tokio::spawn(async move {
                let Ok(mut server) = TcpStream::connect(upstream).await else {
                    return;
                };
                tokio::select! {
                    _ = tokio::io::copy_bidirectional(&mut client, &mut server) => {}
                    _ = cut.changed() => {}
                }
            });
        }
    });

    Forwarder {
        url: ws_url(addr),
        cut_tx,
    }
}

pub fn quick_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        max_attempts: 2,
        base: Duration::from_millis(20),
        max_delay: Duration::from_millis(100),
    }
}

pub fn link(url: &str) -> RelayLink {
    spawn_link(url.to_string(), quick_policy(), LinkCapacity::default())
}

// Waits until the published session satisfies `pred`, or the link task stops.
pub async fn wait_for<F>(link: &RelayLink, pred: F) -> RelaySession
where
    F: Fn(&RelaySession) -> bool,
{
    let mut rx = link.status();
    let found = tokio::time::timeout(WAIT, async {
        loop {
            {
                let current = rx.borrow_and_update();
                if pred(&*current) {
                    return current.clone();
                }
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    })
    .await
    .expect("timed out waiting for link status");
    assert!(pred(&found), "link stopped in state {:?}", found.state());
    found
}

pub async fn next_inbound(link: &mut RelayLink) -> RelayInbound {
    tokio::time::timeout(WAIT, link.recv())
        .await
        .expect("timed out waiting for relay message")
        .expect("link ended")
        .msg
}

pub async fn next_projectile(link: &mut RelayLink) -> ProjectileShot {
    loop {
        if let RelayInbound::Projectile { shot, .. } = next_inbound(link).await {
            return shot;
        }
    }
}

// Next `state` table matching `pred`.
pub async fn next_state<F>(link: &mut RelayLink, pred: F) -> SessionView
where
    F: Fn(&SessionView) -> bool,
{
    loop {
        if let RelayInbound::State(view) = next_inbound(link).await {
            if pred(&view) {
                return view;
            }
        }
    }
}
