//! Help request lifecycle.
//!
//! `pending -> in-progress -> resolved`, or `pending -> cancelled`.
//! Accepting takes a ledger unit; resolving gives it back.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::ledger::{AvailabilityLedger, DecrementOutcome};
use super::lifecycle::{compensate, return_unit, LedgerEffect, RequestPage, Transitioned};
use super::store::HelpRequestStore;
use crate::error::{check_hospital_id, LifecycleError};
use crate::models::help_request::SubmitHelpRequestRequest;
use crate::models::{
    HelpRequest, HelpRequestStatus, NewHelpRequest, RequestFilter, RequestKind,
};

const KIND: RequestKind = RequestKind::Help;

#[derive(Clone)]
pub struct HelpRequestLifecycle {
    store: Arc<dyn HelpRequestStore>,
    ledger: AvailabilityLedger,
}

impl HelpRequestLifecycle {
    pub fn new(store: Arc<dyn HelpRequestStore>, ledger: AvailabilityLedger) -> Self {
        Self { store, ledger }
    }

    /// Records a new pending request. No ledger effect.
    pub async fn submit(
        &self,
        hospital_id: &str,
        user_id: Option<Uuid>,
        request: &SubmitHelpRequestRequest,
    ) -> Result<HelpRequest, LifecycleError> {
        check_hospital_id(hospital_id)?;
        request.validate()?;

        let created = self
            .store
            .insert(NewHelpRequest::from_submission(hospital_id, user_id, request))
            .await?;

        info!(
            hospital_id = %hospital_id,
            request_id = %created.id,
            guest = user_id.is_none(),
            "Help request submitted"
        );

        Ok(created)
    }

    /// Takes a unit and moves the request to `in-progress`.
    ///
    /// With no unit free the request stays pending and
    /// [`LifecycleError::NoUnitsAvailable`] is returned.
    pub async fn accept(
        &self,
        hospital_id: &str,
        id: Uuid,
    ) -> Result<Transitioned<HelpRequest>, LifecycleError> {
        self.expect_status(hospital_id, id, HelpRequestStatus::Pending)
            .await?;

        let consumed = match self.ledger.decrement(hospital_id).await? {
            DecrementOutcome::Consumed(row) => row,
            DecrementOutcome::Refused(row) => {
                warn!(
                    hospital_id = %hospital_id,
                    request_id = %id,
                    "Help request accept refused, no ambulances available"
                );
                return Err(LifecycleError::NoUnitsAvailable { availability: row });
            }
        };

        let moved = self
            .store
            .transition(
                id,
                hospital_id,
                HelpRequestStatus::Pending,
                HelpRequestStatus::InProgress,
                Utc::now(),
            )
            .await;

        match moved {
            Ok(Some(request)) => {
                info!(
                    hospital_id = %hospital_id,
                    request_id = %id,
                    from = %HelpRequestStatus::Pending,
                    to = %HelpRequestStatus::InProgress,
                    available_count = consumed.available_count,
                    "Help request accepted"
                );
                Ok(Transitioned {
                    request,
                    ledger: LedgerEffect::Consumed(consumed),
                })
            }
            Ok(None) => {
                compensate(&self.ledger, KIND, hospital_id, "accept lost race").await;
                Err(self.stale(id, HelpRequestStatus::Pending).await)
            }
            Err(e) => {
                compensate(&self.ledger, KIND, hospital_id, "accept update failed").await;
                Err(e.into())
            }
        }
    }

    /// Cancels a pending request. Requires `confirmed`; no ledger effect.
    pub async fn reject(
        &self,
        hospital_id: &str,
        id: Uuid,
        confirmed: bool,
    ) -> Result<Transitioned<HelpRequest>, LifecycleError> {
        if !confirmed {
            return Err(LifecycleError::ConfirmationRequired);
        }

        let request = self
            .advance(
                hospital_id,
                id,
                HelpRequestStatus::Pending,
                HelpRequestStatus::Cancelled,
            )
            .await?;

        info!(
            hospital_id = %hospital_id,
            request_id = %id,
            from = %HelpRequestStatus::Pending,
            to = %HelpRequestStatus::Cancelled,
            "Help request cancelled"
        );

        Ok(Transitioned::untouched(request))
    }

    /// Resolves an in-progress request, then gives its unit back.
    ///
    /// The request is resolved even when the return fails; see
    /// [`LedgerEffect::ReturnFailed`].
    pub async fn resolve(
        &self,
        hospital_id: &str,
        id: Uuid,
    ) -> Result<Transitioned<HelpRequest>, LifecycleError> {
        let request = self
            .advance(
                hospital_id,
                id,
                HelpRequestStatus::InProgress,
                HelpRequestStatus::Resolved,
            )
            .await?;

        info!(
            hospital_id = %hospital_id,
            request_id = %id,
            from = %HelpRequestStatus::InProgress,
            to = %HelpRequestStatus::Resolved,
            "Help request resolved"
        );

        let ledger = return_unit(&self.ledger, KIND, hospital_id, id).await;
        Ok(Transitioned { request, ledger })
    }

    /// Lists a hospital's requests newest first.
    pub async fn list(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<HelpRequestStatus>,
    ) -> Result<RequestPage<HelpRequest>, LifecycleError> {
        let data = self.store.list_for_hospital(hospital_id, filter).await?;
        let total = self
            .store
            .count_for_hospital(hospital_id, &filter.statuses)
            .await?;
        Ok(RequestPage { data, total })
    }

    async fn find(&self, hospital_id: &str, id: Uuid) -> Result<HelpRequest, LifecycleError> {
        self.store
            .find_by_id(id)
            .await?
            .filter(|r| r.hospital_id == hospital_id)
            .ok_or(LifecycleError::NotFound("Help request"))
    }

    async fn expect_status(
        &self,
        hospital_id: &str,
        id: Uuid,
        expected: HelpRequestStatus,
    ) -> Result<HelpRequest, LifecycleError> {
        let request = self.find(hospital_id, id).await?;
        if request.status != expected {
            return Err(LifecycleError::stale(expected, request.status));
        }
        Ok(request)
    }

    async fn advance(
        &self,
        hospital_id: &str,
        id: Uuid,
        from: HelpRequestStatus,
        to: HelpRequestStatus,
    ) -> Result<HelpRequest, LifecycleError> {
        self.expect_status(hospital_id, id, from).await?;
        match self
            .store
            .transition(id, hospital_id, from, to, Utc::now())
            .await?
        {
            Some(request) => Ok(request),
            None => Err(self.stale(id, from).await),
        }
    }

    /// Builds the error for a conditional update that matched nothing.
    async fn stale(&self, id: Uuid, expected: HelpRequestStatus) -> LifecycleError {
        match self.store.find_by_id(id).await {
            Ok(Some(current)) => LifecycleError::stale(expected, current.status),
            Ok(None) => LifecycleError::NotFound("Help request"),
            Err(e) => e.into(),
        }
    }
}

impl std::fmt::Debug for HelpRequestLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpRequestLifecycle")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
