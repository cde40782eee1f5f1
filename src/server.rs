//! HTTP intake for bucket notifications. S3 compatible stores can deliver their notifications to
//! a webhook; we accept those on `POST /notifications` and answer with the batch result. A failed
//! batch is answered with a 500 so the sender redelivers it.

use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router, Server,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    env::{Env, EnvConfig},
    notification::S3Event,
    relay::CompressionRelay,
};

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<CompressionRelay>,
}

async fn get_livez() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn post_notifications(
    State(state): State<AppState>,
    Json(event): Json<S3Event>,
) -> Response {
    let notifications = event.into_notifications();
    debug!(count = notifications.len(), "received notification batch");

    match state.relay.handle_batch(&notifications).await {
        Ok(batch_result) => (StatusCode::OK, Json(batch_result)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub fn router(relay: Arc<CompressionRelay>) -> Router {
    Router::new()
        .route("/livez", get(get_livez))
        .route("/notifications", post(post_notifications))
        .with_state(AppState { relay })
}

pub async fn serve(
    relay: Arc<CompressionRelay>,
    env_config: &EnvConfig,
    shutdown_signal: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let address = match env_config.env {
        // Developing locally we don't want to expose our server to the world.
        // This also avoids the macOS firewall prompt.
        Env::Dev => "127.0.0.1",
        Env::Stag | Env::Prod => "0.0.0.0",
    };
    let port = env_config.port;

    let socket_addr: SocketAddr = format!("{address}:{port}")
        .parse()
        .context("parsing server socket address")?;

    info!(address, port, "server listening");

    Server::bind(&socket_addr)
        .serve(router(relay).into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("running server")?;

    info!("server exiting");

    Ok(())
}
