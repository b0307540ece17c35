//! Recent activity feed shown on the admin dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ambulance_request::AmbulanceRequest;
use super::help_request::{HelpRequest, HelpRequestStatus};
use super::request::RequestKind;

/// Number of entries the activity feed returns.
pub const ACTIVITY_FEED_LIMIT: usize = 20;

/// Help request statuses that appear in the activity feed.
pub const ACTIVITY_HELP_STATUSES: [HelpRequestStatus; 2] =
    [HelpRequestStatus::InProgress, HelpRequestStatus::Resolved];

/// One row of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivityItem {
    pub kind: RequestKind,
    pub id: Uuid,
    pub patient_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&HelpRequest> for ActivityItem {
    fn from(request: &HelpRequest) -> Self {
        Self {
            kind: RequestKind::Help,
            id: request.id,
            patient_name: request.patient_name.clone(),
            status: request.status.to_string(),
            description: request.description.clone(),
            location: None,
            timestamp: request.created_at,
        }
    }
}

impl From<&AmbulanceRequest> for ActivityItem {
    fn from(request: &AmbulanceRequest) -> Self {
        Self {
            kind: RequestKind::Ambulance,
            id: request.id,
            patient_name: request.patient_name.clone(),
            status: request.status.to_string(),
            description: request.description.clone(),
            location: request.location.clone(),
            timestamp: request.created_at,
        }
    }
}

/// Response for the activity feed endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivityFeedResponse {
    pub hospital_id: String,
    pub data: Vec<ActivityItem>,
}

/// Merges both request kinds into one feed, newest first, capped at `limit`.
///
/// Help requests outside [`ACTIVITY_HELP_STATUSES`] are skipped.
pub fn merge_activity(
    help: &[HelpRequest],
    ambulance: &[AmbulanceRequest],
    limit: usize,
) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = help
        .iter()
        .filter(|r| ACTIVITY_HELP_STATUSES.contains(&r.status))
        .map(ActivityItem::from)
        .chain(ambulance.iter().map(ActivityItem::from))
        .collect();

    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    items.truncate(limit);
    items
}
