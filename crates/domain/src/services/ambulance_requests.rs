//! Ambulance request lifecycle.
//!
//! `pending -> dispatched -> completed`, or `pending -> rejected`.
//! A unit is taken when the request is submitted and given back when it is
//! completed or rejected.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::ledger::{AvailabilityLedger, DecrementOutcome};
use super::lifecycle::{compensate, return_unit, LedgerEffect, RequestPage, Transitioned};
use super::store::AmbulanceRequestStore;
use crate::error::{check_hospital_id, LifecycleError};
use crate::models::ambulance_request::SubmitAmbulanceRequestRequest;
use crate::models::{
    AmbulanceRequest, AmbulanceRequestStatus, NewAmbulanceRequest, RequestFilter, RequestKind,
};

const KIND: RequestKind = RequestKind::Ambulance;

#[derive(Clone)]
pub struct AmbulanceRequestLifecycle {
    store: Arc<dyn AmbulanceRequestStore>,
    ledger: AvailabilityLedger,
}

impl AmbulanceRequestLifecycle {
    pub fn new(store: Arc<dyn AmbulanceRequestStore>, ledger: AvailabilityLedger) -> Self {
        Self { store, ledger }
    }

    /// Takes a unit and records a pending request.
    ///
    /// The conditional decrement is the availability check: with no unit
    /// free nothing is written and the current ledger comes back in
    /// [`LifecycleError::NoUnitsAvailable`].
    pub async fn submit(
        &self,
        hospital_id: &str,
        user_id: Option<Uuid>,
        request: &SubmitAmbulanceRequestRequest,
    ) -> Result<Transitioned<AmbulanceRequest>, LifecycleError> {
        check_hospital_id(hospital_id)?;
        request.validate()?;

        let consumed = match self.ledger.decrement(hospital_id).await? {
            DecrementOutcome::Consumed(row) => row,
            DecrementOutcome::Refused(row) => {
                warn!(
                    hospital_id = %hospital_id,
                    "Ambulance request refused, no ambulances available"
                );
                return Err(LifecycleError::NoUnitsAvailable { availability: row });
            }
        };

        let new_request = NewAmbulanceRequest::from_submission(hospital_id, user_id, request);
        let created = match self.store.insert(new_request).await {
            Ok(created) => created,
            Err(e) => {
                compensate(&self.ledger, KIND, hospital_id, "submit insert failed").await;
                return Err(e.into());
            }
        };

        info!(
            hospital_id = %hospital_id,
            request_id = %created.id,
            guest = user_id.is_none(),
            available_count = consumed.available_count,
            "Ambulance request submitted"
        );

        Ok(Transitioned {
            request: created,
            ledger: LedgerEffect::Consumed(consumed),
        })
    }

    /// Marks a pending request dispatched. No ledger effect.
    pub async fn dispatch(
        &self,
        hospital_id: &str,
        id: Uuid,
    ) -> Result<Transitioned<AmbulanceRequest>, LifecycleError> {
        let request = self
            .advance(
                hospital_id,
                id,
                AmbulanceRequestStatus::Pending,
                AmbulanceRequestStatus::Dispatched,
            )
            .await?;

        info!(
            hospital_id = %hospital_id,
            request_id = %id,
            from = %AmbulanceRequestStatus::Pending,
            to = %AmbulanceRequestStatus::Dispatched,
            "Ambulance dispatched"
        );

        Ok(Transitioned::untouched(request))
    }

    /// Completes a dispatched request and gives its unit back.
    pub async fn complete(
        &self,
        hospital_id: &str,
        id: Uuid,
    ) -> Result<Transitioned<AmbulanceRequest>, LifecycleError> {
        let request = self
            .advance(
                hospital_id,
                id,
                AmbulanceRequestStatus::Dispatched,
                AmbulanceRequestStatus::Completed,
            )
            .await?;

        info!(
            hospital_id = %hospital_id,
            request_id = %id,
            from = %AmbulanceRequestStatus::Dispatched,
            to = %AmbulanceRequestStatus::Completed,
            "Ambulance request completed"
        );

        let ledger = return_unit(&self.ledger, KIND, hospital_id, id).await;
        Ok(Transitioned { request, ledger })
    }

    /// Rejects a pending request and gives back the unit taken at submission.
    pub async fn reject(
        &self,
        hospital_id: &str,
        id: Uuid,
        confirmed: bool,
    ) -> Result<Transitioned<AmbulanceRequest>, LifecycleError> {
        if !confirmed {
            return Err(LifecycleError::ConfirmationRequired);
        }

        let request = self
            .advance(
                hospital_id,
                id,
                AmbulanceRequestStatus::Pending,
                AmbulanceRequestStatus::Rejected,
            )
            .await?;

        info!(
            hospital_id = %hospital_id,
            request_id = %id,
            from = %AmbulanceRequestStatus::Pending,
            to = %AmbulanceRequestStatus::Rejected,
            "Ambulance request rejected"
        );

        let ledger = return_unit(&self.ledger, KIND, hospital_id, id).await;
        Ok(Transitioned { request, ledger })
    }

    /// Lists a hospital's requests newest first.
    pub async fn list(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<AmbulanceRequestStatus>,
    ) -> Result<RequestPage<AmbulanceRequest>, LifecycleError> {
        let data = self.store.list_for_hospital(hospital_id, filter).await?;
        let total = self
            .store
            .count_for_hospital(hospital_id, &filter.statuses)
            .await?;
        Ok(RequestPage { data, total })
    }

    async fn find(&self, hospital_id: &str, id: Uuid) -> Result<AmbulanceRequest, LifecycleError> {
        self.store
            .find_by_id(id)
            .await?
            .filter(|r| r.hospital_id == hospital_id)
            .ok_or(LifecycleError::NotFound("Ambulance request"))
    }

    async fn expect_status(
        &self,
        hospital_id: &str,
        id: Uuid,
        expected: AmbulanceRequestStatus,
    ) -> Result<AmbulanceRequest, LifecycleError> {
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
        from: AmbulanceRequestStatus,
        to: AmbulanceRequestStatus,
    ) -> Result<AmbulanceRequest, LifecycleError> {
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
    async fn stale(&self, id: Uuid, expected: AmbulanceRequestStatus) -> LifecycleError {
        match self.store.find_by_id(id).await {
            Ok(Some(current)) => LifecycleError::stale(expected, current.status),
            Ok(None) => LifecycleError::NotFound("Ambulance request"),
            Err(e) => e.into(),
        }
    }
}

impl std::fmt::Debug for AmbulanceRequestLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbulanceRequestLifecycle")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::{InMemoryStore, StoreOperation};
    use fake::faker::name::en::Name;
    use fake::Fake;

    const HOSPITAL: &str = "saniat-rmel";

    fn lifecycle(store: &InMemoryStore) -> AmbulanceRequestLifecycle {
        let ledger = AvailabilityLedger::new(Arc::new(store.clone()));
        AmbulanceRequestLifecycle::new(Arc::new(store.clone()), ledger)
    }

    fn submission() -> SubmitAmbulanceRequestRequest {
        SubmitAmbulanceRequestRequest {
            patient_name: Name().fake(),
            location: Some("Boulevard Zerktouni".to_string()),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_submit_consumes_unit() {
        let store = InMemoryStore::new();
        let outcome = lifecycle(&store)
            .submit(HOSPITAL, None, &submission())
            .await
            .unwrap();

        assert_eq!(outcome.request.status, AmbulanceRequestStatus::Pending);
        assert_eq!(outcome.ledger.availability().unwrap().available_count, 9);
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 9);
    }

    #[tokio::test]
    async fn test_submit_refused_returns_current_ledger() {
        let store = InMemoryStore::new();
        store.seed_ledger(HOSPITAL, 0, 10);

        let err = lifecycle(&store)
            .submit(HOSPITAL, None, &submission())
            .await
            .unwrap_err();
        match err {
            LifecycleError::NoUnitsAvailable { availability } => {
                assert_eq!(availability.available_count, 0);
                assert_eq!(availability.total_count, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let page = lifecycle(&store)
            .list(HOSPITAL, &RequestFilter::all(10, 0))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_submit_insert_failure_returns_unit() {
        let store = InMemoryStore::new();
        store.seed_ledger(HOSPITAL, 3, 10);
        store.fail_operation(StoreOperation::InsertAmbulanceRequest);

        let err = lifecycle(&store)
            .submit(HOSPITAL, None, &submission())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Store(_)));
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 3);
    }

    #[tokio::test]
    async fn test_submit_validation_takes_no_unit() {
        let store = InMemoryStore::new();
        store.seed_ledger(HOSPITAL, 3, 10);
        let request = SubmitAmbulanceRequestRequest {
            patient_name: String::new(),
            location: None,
            description: None,
        };
        let err = lifecycle(&store)
            .submit(HOSPITAL, None, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 3);
    }

    #[tokio::test]
    async fn test_last_unit_goes_to_one_of_two_submissions() {
        let store = InMemoryStore::new();
        store.seed_ledger(HOSPITAL, 1, 10);
        let lifecycle = lifecycle(&store);
        let (first, second) = (submission(), submission());

        let (a, b) = tokio::join!(
            lifecycle.submit(HOSPITAL, None, &first),
            lifecycle.submit(HOSPITAL, None, &second)
        );
        let refusals = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(LifecycleError::NoUnitsAvailable { .. })))
            .count();
        assert_eq!(refusals, 1);
        assert!(a.is_ok() || b.is_ok());
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 0);
    }

    #[tokio::test]
    async fn test_dispatch_then_complete_returns_unit() {
        let store = InMemoryStore::new();
        let lifecycle = lifecycle(&store);
        let submitted = lifecycle.submit(HOSPITAL, None, &submission()).await.unwrap();
        let id = submitted.request.id;

        let dispatched = lifecycle.dispatch(HOSPITAL, id).await.unwrap();
        assert_eq!(dispatched.request.status, AmbulanceRequestStatus::Dispatched);
        assert!(dispatched.request.dispatched_at.is_some());
        assert_eq!(dispatched.ledger, LedgerEffect::Untouched);
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 9);

        let completed = lifecycle.complete(HOSPITAL, id).await.unwrap();
        assert_eq!(completed.request.status, AmbulanceRequestStatus::Completed);
        assert!(completed.request.completed_at.is_some());
        assert!(completed.ledger.unit_returned());
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 10);
    }

    #[tokio::test]
    async fn test_complete_pending_is_stale() {
        let store = InMemoryStore::new();
        let lifecycle = lifecycle(&store);
        let submitted = lifecycle.submit(HOSPITAL, None, &submission()).await.unwrap();

        let err = lifecycle
            .complete(HOSPITAL, submitted.request.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::StaleTransition { .. }));
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 9);
    }

    #[tokio::test]
    async fn test_reject_returns_unit() {
        let store = InMemoryStore::new();
        let lifecycle = lifecycle(&store);
        let submitted = lifecycle.submit(HOSPITAL, None, &submission()).await.unwrap();

        assert!(matches!(
            lifecycle.reject(HOSPITAL, submitted.request.id, false).await,
            Err(LifecycleError::ConfirmationRequired)
        ));

        let rejected = lifecycle
            .reject(HOSPITAL, submitted.request.id, true)
            .await
            .unwrap();
        assert_eq!(rejected.request.status, AmbulanceRequestStatus::Rejected);
        assert!(rejected.ledger.unit_returned());
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 10);
    }

    #[tokio::test]
    async fn test_complete_with_failed_return_still_completes() {
        let store = InMemoryStore::new();
        let lifecycle = lifecycle(&store);
        let submitted = lifecycle.submit(HOSPITAL, None, &submission()).await.unwrap();
        let id = submitted.request.id;
        lifecycle.dispatch(HOSPITAL, id).await.unwrap();
        store.fail_operation(StoreOperation::IncrementClamped);

        let completed = lifecycle.complete(HOSPITAL, id).await.unwrap();
        assert_eq!(completed.request.status, AmbulanceRequestStatus::Completed);
        assert_eq!(completed.ledger, LedgerEffect::ReturnFailed);
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 9);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let store = InMemoryStore::new();
        let err = lifecycle(&store)
            .dispatch(HOSPITAL, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dispatch_twice_reports_current_status() {
        let store = InMemoryStore::new();
        let lifecycle = lifecycle(&store);
        let submitted = lifecycle.submit(HOSPITAL, None, &submission()).await.unwrap();
        let id = submitted.request.id;
        lifecycle.dispatch(HOSPITAL, id).await.unwrap();

        match lifecycle.dispatch(HOSPITAL, id).await.unwrap_err() {
            LifecycleError::StaleTransition { expected, actual } => {
                assert_eq!(expected, "pending");
                assert_eq!(actual, "dispatched");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Rejecting a dispatched request must not hand its unit back.
        let err = lifecycle.reject(HOSPITAL, id, true).await.unwrap_err();
        assert!(matches!(err, LifecycleError::StaleTransition { .. }));
        assert_eq!(store.ledger(HOSPITAL).unwrap().available_count, 9);
    }

    #[tokio::test]
    async fn test_other_hospital_request_is_not_found() {
        let store = InMemoryStore::new();
        let lifecycle = lifecycle(&store);
        let submitted = lifecycle.submit(HOSPITAL, None, &submission()).await.unwrap();

        let err = lifecycle
            .dispatch("mohammed-v", submitted.request.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound("Ambulance request")));
        assert_eq!(
            store.ambulance_request(submitted.request.id).unwrap().status,
            AmbulanceRequestStatus::Pending
        );
    }
}
