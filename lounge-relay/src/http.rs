use crate::{RelayService, ws_handler};
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::Json;
use lounge_core::Identity;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

/// Response of `GET /api/host`, used by front-ends to pick a role.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HostInfo {
    pub profile: Option<Identity>,
}

pub async fn host_info(State(service): State<RelayService>) -> Json<HostInfo> {
    Json(HostInfo {
        profile: service.current_host().await,
    })
}

pub fn router(service: RelayService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/host", get(host_info))
        .with_state(service)
}

pub async fn serve(listener: TcpListener, service: RelayService) -> anyhow::Result<()> {
    info!("Relay listening on {}", listener.local_addr()?);
    axum::serve(listener, router(service)).await?;
    Ok(())
}
