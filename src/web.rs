//! Thin HTTP layer over the [`Engine`].

pub mod charge_times;
pub mod error;
pub mod greeting;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::{net::TcpListener, signal};

use crate::{core::engine::Engine, prelude::*};

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/greeting", get(greeting::greeting))
        .route("/api/v1/charge-times", get(charge_times::get_charge_times))
        .route("/api/v1/charge-times/schedule", post(charge_times::schedule))
        .route("/api/v1/charge-times/devices", get(charge_times::get_devices))
        .route("/api/v1/charge-times/devices/{id}", delete(charge_times::remove_device))
        .route("/api/v1/charge-times/prices", get(charge_times::get_prices))
        .route("/api/v1/charge-times/prices/cheapest", get(charge_times::get_cheapest_hours))
        .route("/api/v1/charge-times/prices/refresh", post(charge_times::refresh_prices))
        .with_state(engine)
}

/// Serve the API until Ctrl+C.
#[instrument(skip_all)]
pub async fn serve(listener: TcpListener, engine: Arc<Engine>) -> Result {
    info!(address = %listener.local_addr()?, "listening…");
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async {
            if let Err(error) = signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C: {error:#}");
                std::future::pending::<()>().await;
            }
            info!("shutting down…");
        })
        .await
        .context("the server failed")
}
