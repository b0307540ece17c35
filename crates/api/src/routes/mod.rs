//! HTTP route handlers.
//!
//! Patient routes take the hospital from the path; admin routes take it from
//! the verified token.

pub mod activity;
pub mod ambulance_requests;
pub mod availability;
pub mod events;
pub mod health;
pub mod help_requests;

use domain::models::request::ListRequestsQuery;
use domain::models::{AvailabilityResponse, Pagination, RequestFilter, RequestKind};
use domain::services::{LedgerEffect, Transitioned};
use domain::LifecycleError;
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::metrics::record_refusal;

/// Response for a status transition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TransitionResponse<R> {
    pub request: R,
    /// `untouched`, `consumed`, `returned` or `return_failed`.
    pub ledger_effect: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityResponse>,
}

impl<R> TransitionResponse<R> {
    pub fn new(transitioned: Transitioned<R>, low_threshold: i32) -> Self {
        let availability = transitioned
            .ledger
            .availability()
            .map(|row| row.to_response(low_threshold));
        Self {
            ledger_effect: effect_name(&transitioned.ledger),
            availability,
            request: transitioned.request,
        }
    }
}

fn effect_name(effect: &LedgerEffect) -> &'static str {
    match effect {
        LedgerEffect::Untouched => "untouched",
        LedgerEffect::Consumed(_) => "consumed",
        LedgerEffect::Returned(_) => "returned",
        LedgerEffect::ReturnFailed => "return_failed",
    }
}

/// Converts a lifecycle error, counting ledger refusals on the way.
pub(crate) fn lifecycle_error(kind: RequestKind) -> impl Fn(LifecycleError) -> ApiError {
    move |err| {
        if matches!(err, LifecycleError::NoUnitsAvailable { .. }) {
            record_refusal(kind);
        }
        err.into()
    }
}

/// Builds the store filter and the page echo for a listing query.
pub(crate) fn list_window<S>(
    query: &ListRequestsQuery,
    max_page_size: i64,
) -> Result<(RequestFilter<S>, i64, i64), ApiError>
where
    S: std::str::FromStr<Err = String>,
{
    let statuses = query.statuses::<S>().map_err(ApiError::validation)?;
    let (limit, offset) = query.window(max_page_size);
    let page = offset / limit + 1;
    Ok((RequestFilter::with_statuses(statuses, limit, offset), page, limit))
}

pub(crate) fn pagination(page: i64, per_page: i64, total: i64) -> Pagination {
    Pagination::new(page, per_page, total)
}
