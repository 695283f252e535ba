use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

mod config;
mod health;
pub mod share;

pub use config::{make_location, parse_url_base, Config, UrlBaseError};

use crate::ServiceState;

const STATUS_PREFIX: &str = "/_status";

/// Routes of the gateway: status endpoints, everything else is a share
pub fn router(state: ServiceState, request_timeout: Duration) -> Router {
    Router::new()
        .nest(STATUS_PREFIX, health::router())
        .fallback(share::handler)
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
}

/// Run the gateway HTTP server until the shutdown signal fires
pub async fn run(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state, config.request_timeout).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "gateway listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
