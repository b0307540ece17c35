//! Prometheus metrics.
//!
//! HTTP request metrics come from [`metrics_middleware`]; ledger and request
//! lifecycle counters are recorded by the route handlers through the
//! `record_*` helpers below.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::RequestKind;
use domain::services::LedgerEffect;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Records `http_requests_total` and `http_request_duration_seconds`,
/// labelled by the matched route rather than the raw path.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(duration);

    response
}

fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

pub fn record_request_submitted(kind: RequestKind) {
    counter!("requests_submitted_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_transition(kind: RequestKind, to: &str) {
    counter!(
        "request_transitions_total",
        "kind" => kind.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

/// A decrement found no free unit.
pub fn record_refusal(kind: RequestKind) {
    counter!("ledger_refusals_total", "kind" => kind.to_string()).increment(1);
}

/// Counts what a lifecycle operation did to the ledger.
pub fn record_ledger_effect(kind: RequestKind, effect: &LedgerEffect) {
    let kind = kind.to_string();
    match effect {
        LedgerEffect::Untouched => {}
        LedgerEffect::Consumed(_) => {
            counter!("ambulance_units_consumed_total", "kind" => kind).increment(1)
        }
        LedgerEffect::Returned(_) => {
            counter!("ambulance_units_returned_total", "kind" => kind).increment(1)
        }
        LedgerEffect::ReturnFailed => {
            counter!("ledger_return_failures_total", "kind" => kind).increment(1)
        }
    }
}

/// Serves the Prometheus text exposition format.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Installs the global Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;

    // Lost race with another initializer; its handle serves the same recorder.
    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}
