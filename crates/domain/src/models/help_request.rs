//! Help request domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::request::Pagination;

/// Status of a help request.
///
/// `pending -> in-progress -> resolved`, or `pending -> cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HelpRequestStatus {
    Pending,
    InProgress,
    Resolved,
    Cancelled,
}

impl HelpRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelpRequestStatus::Pending => "pending",
            HelpRequestStatus::InProgress => "in-progress",
            HelpRequestStatus::Resolved => "resolved",
            HelpRequestStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if no further transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HelpRequestStatus::Resolved | HelpRequestStatus::Cancelled
        )
    }

    /// Returns true if `self -> to` is an edge of the lifecycle.
    pub fn can_transition_to(&self, to: HelpRequestStatus) -> bool {
        matches!(
            (self, to),
            (HelpRequestStatus::Pending, HelpRequestStatus::InProgress)
                | (HelpRequestStatus::Pending, HelpRequestStatus::Cancelled)
                | (HelpRequestStatus::InProgress, HelpRequestStatus::Resolved)
        )
    }
}

impl std::fmt::Display for HelpRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HelpRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(HelpRequestStatus::Pending),
            "in-progress" => Ok(HelpRequestStatus::InProgress),
            "resolved" => Ok(HelpRequestStatus::Resolved),
            "cancelled" => Ok(HelpRequestStatus::Cancelled),
            _ => Err(format!("Invalid help request status: {}", s)),
        }
    }
}

/// A general assistance request from a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HelpRequest {
    pub id: Uuid,
    pub hospital_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub patient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: HelpRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Validated, normalized input for inserting a help request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHelpRequest {
    pub hospital_id: String,
    pub user_id: Option<Uuid>,
    pub patient_name: String,
    pub description: Option<String>,
}

impl NewHelpRequest {
    /// Builds insert input from a submission, trimming text fields.
    pub fn from_submission(
        hospital_id: &str,
        user_id: Option<Uuid>,
        request: &SubmitHelpRequestRequest,
    ) -> Self {
        Self {
            hospital_id: hospital_id.to_string(),
            user_id,
            patient_name: shared::validation::normalize_text(&request.patient_name),
            description: shared::validation::normalize_optional_text(
                request.description.as_deref(),
            ),
        }
    }
}

/// Request payload for submitting a help request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmitHelpRequestRequest {
    #[validate(custom(function = "shared::validation::validate_patient_name"))]
    #[validate(length(
        max = 100,
        message = "Patient name must be at most 100 characters"
    ))]
    pub patient_name: String,

    #[validate(length(
        max = 2000,
        message = "Description must be at most 2000 characters"
    ))]
    #[serde(default)]
    pub description: Option<String>,
}

/// Response for listing help requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListHelpRequestsResponse {
    pub data: Vec<HelpRequest>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_help_request_status_display() {
        assert_eq!(HelpRequestStatus::Pending.to_string(), "pending");
        assert_eq!(HelpRequestStatus::InProgress.to_string(), "in-progress");
        assert_eq!(HelpRequestStatus::Resolved.to_string(), "resolved");
        assert_eq!(HelpRequestStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_help_request_status_serde() {
        assert_eq!(
            serde_json::to_string(&HelpRequestStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let status: HelpRequestStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, HelpRequestStatus::Cancelled);
    }

    #[test]
    fn test_help_request_status_from_str() {
        assert_eq!(
            HelpRequestStatus::from_str("in-progress").unwrap(),
            HelpRequestStatus::InProgress
        );
        assert!(HelpRequestStatus::from_str("in_progress").is_err());
        assert!(HelpRequestStatus::from_str("dispatched").is_err());
    }

    #[test]
    fn test_transition_edges() {
        use HelpRequestStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Resolved));

        assert!(!Pending.can_transition_to(Resolved));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!Resolved.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!HelpRequestStatus::Pending.is_terminal());
        assert!(!HelpRequestStatus::InProgress.is_terminal());
        assert!(HelpRequestStatus::Resolved.is_terminal());
        assert!(HelpRequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_submit_validation() {
        let ok = SubmitHelpRequestRequest {
            patient_name: "Salma".to_string(),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let blank = SubmitHelpRequestRequest {
            patient_name: "   ".to_string(),
            description: Some("chest pain".to_string()),
        };
        assert!(blank.validate().is_err());

        let long = SubmitHelpRequestRequest {
            patient_name: "x".repeat(101),
            description: None,
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_submit_deserialize_without_description() {
        let json = r#"{"patient_name":"Omar"}"#;
        let req: SubmitHelpRequestRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.patient_name, "Omar");
        assert!(req.description.is_none());
    }

    #[test]
    fn test_new_help_request_normalizes() {
        let req = SubmitHelpRequestRequest {
            patient_name: "  Omar  ".to_string(),
            description: Some("   ".to_string()),
        };
        let new = NewHelpRequest::from_submission("saniat-rmel", None, &req);
        assert_eq!(new.patient_name, "Omar");
        assert_eq!(new.description, None);
        assert_eq!(new.user_id, None);
        assert_eq!(new.hospital_id, "saniat-rmel");
    }
}
