//! Server-sent change events.
//!
//! Clients use these as a hint to re-read; each event names the table and
//! row that changed, scoped to one hospital.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::error::check_hospital_id;
use domain::services::ChangeEvent;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{HospitalAdmin, OptionalPatient};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// GET /api/v1/hospitals/:hospital_id/events
pub async fn hospital_events(
    State(state): State<AppState>,
    _patient: OptionalPatient,
    Path(hospital_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    check_hospital_id(&hospital_id)?;
    subscribe(&state, hospital_id)
}

/// GET /api/v1/admin/events
pub async fn admin_events(
    State(state): State<AppState>,
    admin: HospitalAdmin,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    subscribe(&state, admin.hospital_id)
}

fn subscribe(
    state: &AppState,
    hospital_id: String,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if !state.config.change_feed.enabled {
        return Err(ApiError::ServiceUnavailable(
            "Change feed is disabled".to_string(),
        ));
    }

    tracing::debug!(hospital_id = %hospital_id, "Change feed subscriber connected");

    let stream = BroadcastStream::new(state.change_feed.subscribe())
        .filter_map(move |message| to_sse_event(&hospital_id, message).map(Ok));

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

fn to_sse_event(
    hospital_id: &str,
    message: Result<ChangeEvent, BroadcastStreamRecvError>,
) -> Option<Event> {
    match message {
        Ok(event) if event.is_for_hospital(hospital_id) => {
            match Event::default().event(event.table.as_str()).json_data(&event) {
                Ok(sse) => Some(sse),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode change event");
                    None
                }
            }
        }
        Ok(_) => None,
        // The subscriber fell behind; tell it to re-read everything.
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            Some(Event::default().event("lagged").data(skipped.to_string()))
        }
    }
}
