//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreHealthStatus,
    pub change_feed: ChangeFeedHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreHealthStatus {
    /// `postgres` or `memory`
    pub backend: &'static str,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ChangeFeedHealth {
    pub enabled: bool,
    pub subscribers: usize,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check. 503 when the store does not answer.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let ping = state.health.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    if let Err(ref e) = ping {
        tracing::warn!(error = %e, "Health check ping failed");
    }
    let connected = ping.is_ok();

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: StoreHealthStatus {
            backend: state.store_backend,
            connected,
            latency_ms: connected.then_some(latency_ms),
        },
        change_feed: ChangeFeedHealth {
            enabled: state.config.change_feed.enabled,
            subscribers: state.change_feed.subscriber_count(),
        },
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe: 200 while the process runs.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe: 200 once the store answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    match state.health.ping().await {
        Ok(()) => Ok(Json(StatusResponse {
            status: "ready".to_string(),
        })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.3.0".to_string(),
            store: StoreHealthStatus {
                backend: "memory",
                connected: true,
                latency_ms: Some(0),
            },
            change_feed: ChangeFeedHealth {
                enabled: true,
                subscribers: 2,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["store"]["backend"], "memory");
        assert_eq!(json["change_feed"]["subscribers"], 2);
    }

    #[tokio::test]
    async fn test_live() {
        let Json(response) = live().await;
        assert_eq!(response.status, "alive");
    }
}
