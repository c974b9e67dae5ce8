//! HTTP front for the provider: `GET /api/ip-lookup?ip=...`.

use crate::error::LookupError;
use crate::providers::ipapi::{NormalizedRecord, Provider};
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub const LOOKUP_PATH: &str = "/api/ip-lookup";

/// Builds the router. Each request is independent; the provider is only
/// read.
pub fn router(provider: Provider) -> Router {
  Router::new()
    .route(LOOKUP_PATH, get(ip_lookup))
    .with_state(provider)
}

async fn ip_lookup(
  State(provider): State<Provider>,
  Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<NormalizedRecord>, LookupError> {
  let Some(ip) = first_ip(params) else {
    tracing::warn!(kind = LookupError::MissingParameter.kind(), "lookup refused");
    return Err(LookupError::MissingParameter);
  };

  match provider.lookup(&ip).await {
    Ok(record) => {
      tracing::info!(
        %ip,
        country = record.country.as_ref().and_then(serde_json::Value::as_str).unwrap_or("-"),
        "lookup succeeded"
      );
      Ok(Json(record))
    }
    Err(err) => {
      tracing::warn!(
        %ip,
        kind = err.kind(),
        status = %err.status(),
        error = ?err,
        "lookup failed"
      );
      Err(err)
    }
  }
}

/// First `ip` pair wins; an empty value counts as absent.
fn first_ip(params: Vec<(String, String)>) -> Option<String> {
  params
    .into_iter()
    .find(|(key, _)| key == "ip")
    .map(|(_, value)| value)
    .filter(|value| !value.is_empty())
}

/// Serves the router on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, provider: Provider) -> Result<()> {
  let listener = TcpListener::bind(addr)
    .await
    .with_context(|| format!("Failed to bind {addr}"))?;
  let local = listener.local_addr().context("Listener has no address")?;
  tracing::info!(%local, path = LOOKUP_PATH, "serving lookups");

  axum::serve(listener, router(provider))
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server terminated unexpectedly")
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
