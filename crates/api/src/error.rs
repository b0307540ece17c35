use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::StoreError;
use domain::LifecycleError;
use serde::Serialize;
use shared::jwt::JwtError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The ledger had no unit to give. Not a failure of the service.
    #[error("No ambulances available")]
    NoUnitsAvailable {
        available_count: i32,
        total_count: i32,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = ErrorBody {
            error: String::new(),
            message: String::new(),
            details: None,
            available_count: None,
            total_count: None,
        };

        let status = match self {
            ApiError::Unauthorized(msg) => {
                body.error = "unauthorized".into();
                body.message = msg;
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(msg) => {
                body.error = "forbidden".into();
                body.message = msg;
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(msg) => {
                body.error = "not_found".into();
                body.message = msg;
                StatusCode::NOT_FOUND
            }
            ApiError::Conflict(msg) => {
                body.error = "conflict".into();
                body.message = msg;
                StatusCode::CONFLICT
            }
            ApiError::NoUnitsAvailable {
                available_count,
                total_count,
            } => {
                body.error = "no_units_available".into();
                body.message = "No ambulances available at this time".into();
                body.available_count = Some(available_count);
                body.total_count = Some(total_count);
                StatusCode::CONFLICT
            }
            ApiError::Validation { message, details } => {
                body.error = "validation_error".into();
                body.message = message;
                body.details = (!details.is_empty()).then_some(details);
                StatusCode::BAD_REQUEST
            }
            ApiError::RateLimited => {
                body.error = "rate_limited".into();
                body.message = "Too many requests. Please try again later.".into();
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                body.error = "internal_error".into();
                body.message = "An internal error occurred".into();
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                body.error = "service_unavailable".into();
                body.message = "Service temporarily unavailable".into();
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
            StoreError::AlreadyExists => ApiError::Conflict("Resource already exists".into()),
            StoreError::Query(msg) => ApiError::Internal(format!("Store error: {}", msg)),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NoUnitsAvailable { availability } => ApiError::NoUnitsAvailable {
                available_count: availability.available_count,
                total_count: availability.total_count,
            },
            LifecycleError::Validation(errors) => errors.into(),
            LifecycleError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            err @ LifecycleError::StaleTransition { .. } => ApiError::Conflict(err.to_string()),
            err @ LifecycleError::ConfirmationRequired => ApiError::validation(err.to_string()),
            LifecycleError::Store(store) => store.into(),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".into()),
            _ => ApiError::Unauthorized("Invalid or missing token".into()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation { message, details }
    }
}
