//! Bearer token extractors.
//!
//! Tokens come from the external identity provider and are only verified
//! here. Patients may submit as guests; admins must carry a hospital claim,
//! and that claim (never a path segment) decides which hospital they act on.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use shared::jwt::{Claims, JwtVerifier};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Returns the bearer token, `None` when there is no Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    match headers.typed_try_get::<Authorization<Bearer>>() {
        Ok(Some(Authorization(bearer))) if !bearer.token().trim().is_empty() => {
            Ok(Some(bearer.token().trim().to_string()))
        }
        Ok(None) => Ok(None),
        Ok(Some(_)) | Err(_) => Err(ApiError::Unauthorized(
            "Invalid Authorization header format".to_string(),
        )),
    }
}

/// Verifies the bearer token, if any.
pub fn verify_optional(
    headers: &HeaderMap,
    verifier: &JwtVerifier,
) -> Result<Option<Claims>, ApiError> {
    match bearer_token(headers)? {
        Some(token) => Ok(Some(verifier.verify(&token)?)),
        None => Ok(None),
    }
}

/// A signed-in patient.
#[derive(Debug, Clone)]
pub struct Patient {
    pub user_id: Uuid,
}

/// Patient identity when a token is supplied, guest otherwise.
///
/// A token that is present but invalid is rejected rather than silently
/// downgraded to a guest.
#[derive(Debug, Clone)]
pub struct OptionalPatient(pub Option<Patient>);

impl OptionalPatient {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|p| p.user_id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalPatient {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let patient = match verify_optional(&parts.headers, &state.verifier)? {
            Some(claims) => Some(Patient {
                user_id: claims.user_id()?,
            }),
            None => None,
        };
        Ok(OptionalPatient(patient))
    }
}

/// Staff member administering one hospital.
#[derive(Debug, Clone)]
pub struct HospitalAdmin {
    pub user_id: Uuid,
    pub hospital_id: String,
    pub email: Option<String>,
}

impl HospitalAdmin {
    fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        let user_id = claims.user_id()?;
        let hospital_id = claims
            .hospital_id()
            .map(|h| h.trim().to_string())
            .ok_or_else(|| {
                ApiError::Forbidden("Account is not linked to a hospital".to_string())
            })?;

        Ok(Self {
            user_id,
            hospital_id,
            email: claims.email,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for HospitalAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verify_optional(&parts.headers, &state.verifier)?.ok_or_else(|| {
            ApiError::Unauthorized("Missing Authorization header".to_string())
        })?;
        Self::from_claims(claims)
    }
}
