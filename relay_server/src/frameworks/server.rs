// Framework bootstrap for the relay runtime.

use crate::frameworks::config::{self, RelaySettings};
use crate::interface_adapters::http::not_found;
use crate::interface_adapters::net::{address_handler, ws_handler};
use crate::interface_adapters::protocol::encode_notice;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RelayStatus, RelayTable, relay_task};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc, time::Duration, time::Instant};
use tokio::sync::{Notify, mpsc, watch};
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

/// Serves the relay with settings taken from the environment.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    serve(listener, RelaySettings::from_env()).await
}

pub async fn serve(listener: tokio::net::TcpListener, settings: RelaySettings) -> Result<()> {
    let address = listener.local_addr()?;

    // event_tx/rx: every connection feeds the single relay task.
    let (event_tx, event_rx) = mpsc::channel(settings.event_channel_capacity);
    let (status_tx, status_rx) = watch::channel(RelayStatus::idle_since(Instant::now()));
    let relay_shutdown = Arc::new(Notify::new());

    tokio::spawn(relay_task(
        event_rx,
        RelayTable::new(settings.public_host.clone()),
        encode_notice,
        status_tx,
        relay_shutdown.clone(),
    ));

    let state = Arc::new(AppState {
        event_tx,
        outbox_capacity: settings.outbox_capacity,
        keepalive: settings.keepalive,
        public_host: settings.public_host.clone(),
        bind_host: address.ip().to_string(),
        port: address.port(),
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/ip", get(address_handler))
        .fallback(not_found)
        .with_state(state);

    info!(
        %address,
        keepalive_secs = settings.keepalive.as_secs(),
        idle_shutdown_secs = settings.idle_shutdown.map(|d| d.as_secs()),
        "listening"
    );

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(idle_shutdown_signal(status_rx, settings.idle_shutdown))
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    relay_shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

// Resolves once the relay has had zero connections for the whole window.
// With no window configured it never resolves.
async fn idle_shutdown_signal(mut status_rx: watch::Receiver<RelayStatus>, window: Option<Duration>) {
    let Some(window) = window else {
        std::future::pending::<()>().await;
        return;
    };

    loop {
        let status = *status_rx.borrow_and_update();

        if status.connections > 0 {
            if status_rx.changed().await.is_err() {
                return;
            }
            continue;
        }

        let deadline = tokio::time::Instant::from_std(status.last_activity + window);
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                info!(idle_secs = window.as_secs(), "no connections for idle window; shutting down");
                return;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}
