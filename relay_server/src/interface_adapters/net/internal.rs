use crate::interface_adapters::state::AppState;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    // Host other machines should dial; falls back to the bind address.
    pub ip: String,
    pub port: u16,
    pub ws_url: String,
    pub local_ws_url: String,
}

impl AddressInfo {
    pub fn new(public_host: Option<&str>, bind_host: &str, port: u16) -> Self {
        let ip = public_host.unwrap_or(bind_host).to_string();
        Self {
            ws_url: format!("ws://{ip}:{port}/ws"),
            local_ws_url: format!("ws://127.0.0.1:{port}/ws"),
            ip,
            port,
        }
    }
}

pub async fn address_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(AddressInfo::new(
        state.public_host.as_deref(),
        &state.bind_host,
        state.port,
    ))
}
