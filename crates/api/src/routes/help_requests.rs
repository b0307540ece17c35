//! Help request endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::help_request::{ListHelpRequestsResponse, SubmitHelpRequestRequest};
use domain::models::request::{ListRequestsQuery, RejectRequestBody};
use domain::models::{HelpRequest, HelpRequestStatus, RequestKind};
use uuid::Uuid;

use super::{lifecycle_error, list_window, pagination, TransitionResponse};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{HospitalAdmin, OptionalPatient};
use crate::middleware::metrics::{record_ledger_effect, record_request_submitted, record_transition};

const KIND: RequestKind = RequestKind::Help;

type HelpTransition = Json<TransitionResponse<HelpRequest>>;

/// Submit a help request, as a signed-in patient or a guest.
///
/// POST /api/v1/hospitals/:hospital_id/help-requests
pub async fn submit_help_request(
    State(state): State<AppState>,
    patient: OptionalPatient,
    Path(hospital_id): Path<String>,
    Json(request): Json<SubmitHelpRequestRequest>,
) -> Result<(StatusCode, Json<HelpRequest>), ApiError> {
    let created = state
        .help_requests
        .submit(&hospital_id, patient.user_id(), &request)
        .await
        .map_err(lifecycle_error(KIND))?;

    record_request_submitted(KIND);
    Ok((StatusCode::CREATED, Json(created)))
}

/// List the admin hospital's help requests, newest first.
///
/// GET /api/v1/admin/help-requests?status=&page=&per_page=
pub async fn list_help_requests(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<ListHelpRequestsResponse>, ApiError> {
    let (filter, page, per_page) =
        list_window::<HelpRequestStatus>(&query, state.config.limits.max_page_size)?;

    let result = state
        .help_requests
        .list(&admin.hospital_id, &filter)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(Json(ListHelpRequestsResponse {
        data: result.data,
        pagination: pagination(page, per_page, result.total),
    }))
}

/// Accept a pending request. Takes an ambulance unit; 409 when none is free.
///
/// POST /api/v1/admin/help-requests/:id/accept
pub async fn accept_help_request(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Path(id): Path<Uuid>,
) -> Result<HelpTransition, ApiError> {
    let transitioned = state
        .help_requests
        .accept(&admin.hospital_id, id)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(respond(&state, transitioned))
}

/// Cancel a pending request. The body must carry `"confirm": true`.
///
/// POST /api/v1/admin/help-requests/:id/reject
pub async fn reject_help_request(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectRequestBody>>,
) -> Result<HelpTransition, ApiError> {
    let confirmed = body.map(|Json(b)| b.confirm).unwrap_or(false);
    let transitioned = state
        .help_requests
        .reject(&admin.hospital_id, id, confirmed)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(respond(&state, transitioned))
}

/// Resolve an in-progress request and return its unit.
///
/// POST /api/v1/admin/help-requests/:id/resolve
pub async fn resolve_help_request(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Path(id): Path<Uuid>,
) -> Result<HelpTransition, ApiError> {
    let transitioned = state
        .help_requests
        .resolve(&admin.hospital_id, id)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(respond(&state, transitioned))
}

fn respond(
    state: &AppState,
    transitioned: domain::services::Transitioned<HelpRequest>,
) -> HelpTransition {
    record_transition(KIND, transitioned.request.status.as_str());
    record_ledger_effect(KIND, &transitioned.ledger);
    Json(TransitionResponse::new(
        transitioned,
        state.config.ledger.low_availability_threshold,
    ))
}
