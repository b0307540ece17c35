//! Store ports.
//!
//! The ledger and lifecycle services talk to storage only through these
//! traits. Every mutation is a single atomic statement at the store: ledger
//! counts move by relative deltas and status changes are conditional on the
//! expected prior status, so no caller ever writes back a snapshot it read
//! earlier.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AmbulanceAvailability, AmbulanceRequest, AmbulanceRequestStatus, HelpRequest,
    HelpRequestStatus, NewAmbulanceRequest, NewHelpRequest, RequestFilter,
};

/// Errors reported by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An insert hit an existing key.
    #[error("Record already exists")]
    AlreadyExists,

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Per-hospital ambulance ledger storage.
#[async_trait::async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Reads the ledger row for a hospital.
    async fn find(&self, hospital_id: &str) -> StoreResult<Option<AmbulanceAvailability>>;

    /// Creates a full ledger row.
    ///
    /// Returns [`StoreError::AlreadyExists`] if another caller created it first.
    async fn insert_if_absent(
        &self,
        hospital_id: &str,
        fleet_size: i32,
    ) -> StoreResult<AmbulanceAvailability>;

    /// Applies `available_count - 1` only while `available_count > 0`.
    ///
    /// Returns `None` when the guard fails or the row does not exist.
    async fn try_decrement(&self, hospital_id: &str)
        -> StoreResult<Option<AmbulanceAvailability>>;

    /// Applies `min(total_count, available_count + 1)`.
    ///
    /// Returns `None` when the row does not exist.
    async fn increment_clamped(
        &self,
        hospital_id: &str,
    ) -> StoreResult<Option<AmbulanceAvailability>>;
}

/// Help request storage.
#[async_trait::async_trait]
pub trait HelpRequestStore: Send + Sync {
    async fn insert(&self, request: NewHelpRequest) -> StoreResult<HelpRequest>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<HelpRequest>>;

    /// Lists a hospital's requests, newest first.
    async fn list_for_hospital(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<HelpRequestStatus>,
    ) -> StoreResult<Vec<HelpRequest>>;

    async fn count_for_hospital(
        &self,
        hospital_id: &str,
        statuses: &[HelpRequestStatus],
    ) -> StoreResult<i64>;

    /// Moves a request from `from` to `to` if it is still in `from`.
    ///
    /// Stamps `resolved_at` when `to` is resolved. Returns `None` when no row
    /// matched `id`, `hospital_id` and `from` together.
    async fn transition(
        &self,
        id: Uuid,
        hospital_id: &str,
        from: HelpRequestStatus,
        to: HelpRequestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<HelpRequest>>;
}

/// Ambulance request storage.
#[async_trait::async_trait]
pub trait AmbulanceRequestStore: Send + Sync {
    async fn insert(&self, request: NewAmbulanceRequest) -> StoreResult<AmbulanceRequest>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AmbulanceRequest>>;

    /// Lists a hospital's requests, newest first.
    async fn list_for_hospital(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<AmbulanceRequestStatus>,
    ) -> StoreResult<Vec<AmbulanceRequest>>;

    async fn count_for_hospital(
        &self,
        hospital_id: &str,
        statuses: &[AmbulanceRequestStatus],
    ) -> StoreResult<i64>;

    /// Moves a request from `from` to `to` if it is still in `from`.
    ///
    /// Stamps `dispatched_at` or `completed_at` to match `to`.
    async fn transition(
        &self,
        id: Uuid,
        hospital_id: &str,
        from: AmbulanceRequestStatus,
        to: AmbulanceRequestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AmbulanceRequest>>;
}

/// Liveness probe for the backing store.
#[async_trait::async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Bundle of store handles wired into the services.
#[derive(Clone)]
pub struct Stores {
    pub availability: Arc<dyn AvailabilityStore>,
    pub help_requests: Arc<dyn HelpRequestStore>,
    pub ambulance_requests: Arc<dyn AmbulanceRequestStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
