//! Ambulance request domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::availability::AvailabilityResponse;
use super::request::Pagination;

/// Status of an ambulance request.
///
/// `pending -> dispatched -> completed`, or `pending -> rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbulanceRequestStatus {
    Pending,
    Dispatched,
    Completed,
    Rejected,
}

impl AmbulanceRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbulanceRequestStatus::Pending => "pending",
            AmbulanceRequestStatus::Dispatched => "dispatched",
            AmbulanceRequestStatus::Completed => "completed",
            AmbulanceRequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AmbulanceRequestStatus::Completed | AmbulanceRequestStatus::Rejected
        )
    }

    /// Returns true if `self -> to` is an edge of the lifecycle.
    pub fn can_transition_to(&self, to: AmbulanceRequestStatus) -> bool {
        matches!(
            (self, to),
            (AmbulanceRequestStatus::Pending, AmbulanceRequestStatus::Dispatched)
                | (AmbulanceRequestStatus::Pending, AmbulanceRequestStatus::Rejected)
                | (AmbulanceRequestStatus::Dispatched, AmbulanceRequestStatus::Completed)
        )
    }

    /// Returns true while the request holds a ledger unit.
    ///
    /// Units are consumed at submission and returned on completion or
    /// rejection.
    pub fn holds_unit(&self) -> bool {
        matches!(
            self,
            AmbulanceRequestStatus::Pending | AmbulanceRequestStatus::Dispatched
        )
    }
}

impl std::fmt::Display for AmbulanceRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AmbulanceRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AmbulanceRequestStatus::Pending),
            "dispatched" => Ok(AmbulanceRequestStatus::Dispatched),
            "completed" => Ok(AmbulanceRequestStatus::Completed),
            "rejected" => Ok(AmbulanceRequestStatus::Rejected),
            _ => Err(format!("Invalid ambulance request status: {}", s)),
        }
    }
}

/// A request for ambulance dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AmbulanceRequest {
    pub id: Uuid,
    pub hospital_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub patient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: AmbulanceRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Validated, normalized input for inserting an ambulance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAmbulanceRequest {
    pub hospital_id: String,
    pub user_id: Option<Uuid>,
    pub patient_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl NewAmbulanceRequest {
    /// Builds insert input from a submission, trimming text fields.
    pub fn from_submission(
        hospital_id: &str,
        user_id: Option<Uuid>,
        request: &SubmitAmbulanceRequestRequest,
    ) -> Self {
        Self {
            hospital_id: hospital_id.to_string(),
            user_id,
            patient_name: shared::validation::normalize_text(&request.patient_name),
            location: shared::validation::normalize_optional_text(request.location.as_deref()),
            description: shared::validation::normalize_optional_text(
                request.description.as_deref(),
            ),
        }
    }
}

/// Request payload for submitting an ambulance request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmitAmbulanceRequestRequest {
    #[validate(custom(function = "shared::validation::validate_patient_name"))]
    #[validate(length(max = 100, message = "Patient name must be at most 100 characters"))]
    pub patient_name: String,

    #[validate(length(max = 500, message = "Location must be at most 500 characters"))]
    #[serde(default)]
    pub location: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub description: Option<String>,
}

/// Response after submitting an ambulance request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmitAmbulanceRequestResponse {
    pub request: AmbulanceRequest,
    pub availability: AvailabilityResponse,
}

/// Response for listing ambulance requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListAmbulanceRequestsResponse {
    pub data: Vec<AmbulanceRequest>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ambulance_request_status_display() {
        assert_eq!(AmbulanceRequestStatus::Pending.to_string(), "pending");
        assert_eq!(AmbulanceRequestStatus::Dispatched.to_string(), "dispatched");
        assert_eq!(AmbulanceRequestStatus::Completed.to_string(), "completed");
        assert_eq!(AmbulanceRequestStatus::Rejected.to_string(), "rejected");
    }

    #[test]
    fn test_ambulance_request_status_from_str() {
        assert_eq!(
            AmbulanceRequestStatus::from_str("dispatched").unwrap(),
            AmbulanceRequestStatus::Dispatched
        );
        assert!(AmbulanceRequestStatus::from_str("in-progress").is_err());
    }

    #[test]
    fn test_transition_edges() {
        use AmbulanceRequestStatus::*;
        assert!(Pending.can_transition_to(Dispatched));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Dispatched.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Dispatched.can_transition_to(Rejected));
        assert!(!Completed.can_transition_to(Dispatched));
        assert!(!Rejected.can_transition_to(Pending));
    }

    #[test]
    fn test_holds_unit() {
        assert!(AmbulanceRequestStatus::Pending.holds_unit());
        assert!(AmbulanceRequestStatus::Dispatched.holds_unit());
        assert!(!AmbulanceRequestStatus::Completed.holds_unit());
        assert!(!AmbulanceRequestStatus::Rejected.holds_unit());
    }

    #[test]
    fn test_submit_validation() {
        let ok = SubmitAmbulanceRequestRequest {
            patient_name: "Karim".to_string(),
            location: Some("Avenue Hassan II".to_string()),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let blank = SubmitAmbulanceRequestRequest {
            patient_name: "".to_string(),
            location: None,
            description: None,
        };
        assert!(blank.validate().is_err());

        let long_location = SubmitAmbulanceRequestRequest {
            patient_name: "Karim".to_string(),
            location: Some("x".repeat(501)),
            description: None,
        };
        assert!(long_location.validate().is_err());
    }

    #[test]
    fn test_new_ambulance_request_normalizes() {
        let req = SubmitAmbulanceRequestRequest {
            patient_name: " Karim ".to_string(),
            location: Some("  Rue 12  ".to_string()),
            description: Some("".to_string()),
        };
        let user_id = Uuid::new_v4();
        let new = NewAmbulanceRequest::from_submission("mohammed-6", Some(user_id), &req);
        assert_eq!(new.patient_name, "Karim");
        assert_eq!(new.location.as_deref(), Some("Rue 12"));
        assert_eq!(new.description, None);
        assert_eq!(new.user_id, Some(user_id));
    }
}
