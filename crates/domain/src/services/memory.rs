//! In-memory store.
//!
//! Backs the domain tests, the API integration tests and the `memory://`
//! demo mode. It honors the same contract as the PostgreSQL repositories:
//! every ledger mutation checks and applies under one lock, and status
//! transitions only match rows still in the expected prior status.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::change_feed::{ChangeEvent, ChangeFeed, ChangeOperation, ChangeTable};
use super::store::{
    AmbulanceRequestStore, AvailabilityStore, HelpRequestStore, StoreError, StoreHealth,
    StoreResult, Stores,
};
use crate::models::{
    AmbulanceAvailability, AmbulanceRequest, AmbulanceRequestStatus, HelpRequest,
    HelpRequestStatus, NewAmbulanceRequest, NewHelpRequest, RequestFilter,
};

/// Store operations that can be made to fail in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FindAvailability,
    InsertAvailability,
    TryDecrement,
    IncrementClamped,
    InsertHelpRequest,
    TransitionHelpRequest,
    InsertAmbulanceRequest,
    TransitionAmbulanceRequest,
    ListRequests,
    Ping,
}

#[derive(Debug, Default)]
struct State {
    ledgers: HashMap<String, AmbulanceAvailability>,
    help_requests: Vec<HelpRequest>,
    ambulance_requests: Vec<AmbulanceRequest>,
}

/// Mutex-guarded store shared by clones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    failures: Arc<Mutex<HashSet<StoreOperation>>>,
    feed: Option<ChangeFeed>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a change event after every successful mutation.
    pub fn with_change_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Makes every later call of `operation` fail with `Unavailable`.
    pub fn fail_operation(&self, operation: StoreOperation) {
        lock(&self.failures).insert(operation);
    }

    pub fn restore_operation(&self, operation: StoreOperation) {
        lock(&self.failures).remove(&operation);
    }

    /// Seeds a ledger row directly, bypassing `insert_if_absent`.
    pub fn seed_ledger(&self, hospital_id: &str, available_count: i32, total_count: i32) {
        let now = Utc::now();
        let mut row = AmbulanceAvailability::full(hospital_id, total_count, now);
        row.available_count = available_count.clamp(0, total_count);
        lock(&self.state).ledgers.insert(hospital_id.to_string(), row);
    }

    /// Current ledger row without touching failure injection.
    pub fn ledger(&self, hospital_id: &str) -> Option<AmbulanceAvailability> {
        lock(&self.state).ledgers.get(hospital_id).cloned()
    }

    pub fn help_request(&self, id: Uuid) -> Option<HelpRequest> {
        lock(&self.state)
            .help_requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn ambulance_request(&self, id: Uuid) -> Option<AmbulanceRequest> {
        lock(&self.state)
            .ambulance_requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Wraps clones of this store into the service bundle.
    pub fn stores(&self) -> Stores {
        Stores {
            availability: Arc::new(self.clone()),
            help_requests: Arc::new(self.clone()),
            ambulance_requests: Arc::new(self.clone()),
            health: Arc::new(self.clone()),
        }
    }

    fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        if lock(&self.failures).contains(&operation) {
            tracing::warn!(?operation, "In-memory store simulating failure");
            return Err(StoreError::Unavailable(format!(
                "simulated failure: {:?}",
                operation
            )));
        }
        Ok(())
    }

    fn notify(
        &self,
        table: ChangeTable,
        operation: ChangeOperation,
        hospital_id: &str,
        record_id: Option<String>,
    ) {
        if let Some(feed) = &self.feed {
            feed.publish(ChangeEvent::new(table, operation, hospital_id, record_id));
        }
    }
}

// A poisoned lock only means a test thread panicked mid-update; the data is
// still usable for the remaining assertions.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn newest_first<T, S: PartialEq + Copy>(
    rows: &[T],
    hospital_id: &str,
    statuses: &[S],
    key: impl Fn(&T) -> (&str, S, DateTime<Utc>),
) -> Vec<T>
where
    T: Clone,
{
    let mut matched: Vec<T> = rows
        .iter()
        .rev()
        .filter(|row| {
            let (hospital, status, _) = key(row);
            hospital == hospital_id && (statuses.is_empty() || statuses.contains(&status))
        })
        .cloned()
        .collect();
    matched.sort_by(|a, b| key(b).2.cmp(&key(a).2));
    matched
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait::async_trait]
impl AvailabilityStore for InMemoryStore {
    async fn find(&self, hospital_id: &str) -> StoreResult<Option<AmbulanceAvailability>> {
        self.check(StoreOperation::FindAvailability)?;
        Ok(lock(&self.state).ledgers.get(hospital_id).cloned())
    }

    async fn insert_if_absent(
        &self,
        hospital_id: &str,
        fleet_size: i32,
    ) -> StoreResult<AmbulanceAvailability> {
        self.check(StoreOperation::InsertAvailability)?;
        let row = {
            let mut state = lock(&self.state);
            if state.ledgers.contains_key(hospital_id) {
                return Err(StoreError::AlreadyExists);
            }
            let row = AmbulanceAvailability::full(hospital_id, fleet_size, Utc::now());
            state.ledgers.insert(hospital_id.to_string(), row.clone());
            row
        };
        self.notify(
            ChangeTable::AmbulanceAvailability,
            ChangeOperation::Insert,
            hospital_id,
            None,
        );
        Ok(row)
    }

    async fn try_decrement(
        &self,
        hospital_id: &str,
    ) -> StoreResult<Option<AmbulanceAvailability>> {
        self.check(StoreOperation::TryDecrement)?;
        let updated = {
            let mut state = lock(&self.state);
            match state.ledgers.get_mut(hospital_id) {
                Some(row) if row.available_count > 0 => {
                    row.available_count -= 1;
                    row.updated_at = Utc::now();
                    Some(row.clone())
                }
                _ => None,
            }
        };
        if updated.is_some() {
            self.notify(
                ChangeTable::AmbulanceAvailability,
                ChangeOperation::Update,
                hospital_id,
                None,
            );
        }
        Ok(updated)
    }

    async fn increment_clamped(
        &self,
        hospital_id: &str,
    ) -> StoreResult<Option<AmbulanceAvailability>> {
        self.check(StoreOperation::IncrementClamped)?;
        let updated = {
            let mut state = lock(&self.state);
            state.ledgers.get_mut(hospital_id).map(|row| {
                row.available_count = (row.available_count + 1).min(row.total_count);
                row.updated_at = Utc::now();
                row.clone()
            })
        };
        if updated.is_some() {
            self.notify(
                ChangeTable::AmbulanceAvailability,
                ChangeOperation::Update,
                hospital_id,
                None,
            );
        }
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl HelpRequestStore for InMemoryStore {
    async fn insert(&self, request: NewHelpRequest) -> StoreResult<HelpRequest> {
        self.check(StoreOperation::InsertHelpRequest)?;
        let now = Utc::now();
        let row = HelpRequest {
            id: Uuid::new_v4(),
            hospital_id: request.hospital_id,
            user_id: request.user_id,
            patient_name: request.patient_name,
            description: request.description,
            status: HelpRequestStatus::Pending,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };
        lock(&self.state).help_requests.push(row.clone());
        self.notify(
            ChangeTable::HelpRequests,
            ChangeOperation::Insert,
            &row.hospital_id,
            Some(row.id.to_string()),
        );
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<HelpRequest>> {
        Ok(self.help_request(id))
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<HelpRequestStatus>,
    ) -> StoreResult<Vec<HelpRequest>> {
        self.check(StoreOperation::ListRequests)?;
        let state = lock(&self.state);
        let rows = newest_first(&state.help_requests, hospital_id, &filter.statuses, |r| {
            (r.hospital_id.as_str(), r.status, r.created_at)
        });
        Ok(page(rows, filter.limit, filter.offset))
    }

    async fn count_for_hospital(
        &self,
        hospital_id: &str,
        statuses: &[HelpRequestStatus],
    ) -> StoreResult<i64> {
        self.check(StoreOperation::ListRequests)?;
        let state = lock(&self.state);
        Ok(state
            .help_requests
            .iter()
            .filter(|r| {
                r.hospital_id == hospital_id
                    && (statuses.is_empty() || statuses.contains(&r.status))
            })
            .count() as i64)
    }

    async fn transition(
        &self,
        id: Uuid,
        hospital_id: &str,
        from: HelpRequestStatus,
        to: HelpRequestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<HelpRequest>> {
        self.check(StoreOperation::TransitionHelpRequest)?;
        let updated = {
            let mut state = lock(&self.state);
            state
                .help_requests
                .iter_mut()
                .find(|r| r.id == id && r.hospital_id == hospital_id && r.status == from)
                .map(|row| {
                    row.status = to;
                    row.updated_at = at;
                    if to == HelpRequestStatus::Resolved {
                        row.resolved_at = Some(at);
                    }
                    row.clone()
                })
        };
        if updated.is_some() {
            self.notify(
                ChangeTable::HelpRequests,
                ChangeOperation::Update,
                hospital_id,
                Some(id.to_string()),
            );
        }
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl AmbulanceRequestStore for InMemoryStore {
    async fn insert(&self, request: NewAmbulanceRequest) -> StoreResult<AmbulanceRequest> {
        self.check(StoreOperation::InsertAmbulanceRequest)?;
        let now = Utc::now();
        let row = AmbulanceRequest {
            id: Uuid::new_v4(),
            hospital_id: request.hospital_id,
            user_id: request.user_id,
            patient_name: request.patient_name,
            location: request.location,
            description: request.description,
            status: AmbulanceRequestStatus::Pending,
            created_at: now,
            updated_at: now,
            dispatched_at: None,
            completed_at: None,
        };
        lock(&self.state).ambulance_requests.push(row.clone());
        self.notify(
            ChangeTable::AmbulanceRequests,
            ChangeOperation::Insert,
            &row.hospital_id,
            Some(row.id.to_string()),
        );
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AmbulanceRequest>> {
        Ok(self.ambulance_request(id))
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<AmbulanceRequestStatus>,
    ) -> StoreResult<Vec<AmbulanceRequest>> {
        self.check(StoreOperation::ListRequests)?;
        let state = lock(&self.state);
        let rows = newest_first(
            &state.ambulance_requests,
            hospital_id,
            &filter.statuses,
            |r| (r.hospital_id.as_str(), r.status, r.created_at),
        );
        Ok(page(rows, filter.limit, filter.offset))
    }

    async fn count_for_hospital(
        &self,
        hospital_id: &str,
        statuses: &[AmbulanceRequestStatus],
    ) -> StoreResult<i64> {
        self.check(StoreOperation::ListRequests)?;
        let state = lock(&self.state);
        Ok(state
            .ambulance_requests
            .iter()
            .filter(|r| {
                r.hospital_id == hospital_id
                    && (statuses.is_empty() || statuses.contains(&r.status))
            })
            .count() as i64)
    }

    async fn transition(
        &self,
        id: Uuid,
        hospital_id: &str,
        from: AmbulanceRequestStatus,
        to: AmbulanceRequestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AmbulanceRequest>> {
        self.check(StoreOperation::TransitionAmbulanceRequest)?;
        let updated = {
            let mut state = lock(&self.state);
            state
                .ambulance_requests
                .iter_mut()
                .find(|r| r.id == id && r.hospital_id == hospital_id && r.status == from)
                .map(|row| {
                    row.status = to;
                    row.updated_at = at;
                    match to {
                        AmbulanceRequestStatus::Dispatched => row.dispatched_at = Some(at),
                        AmbulanceRequestStatus::Completed => row.completed_at = Some(at),
                        _ => {}
                    }
                    row.clone()
                })
        };
        if updated.is_some() {
            self.notify(
                ChangeTable::AmbulanceRequests,
                ChangeOperation::Update,
                hospital_id,
                Some(id.to_string()),
            );
        }
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check(StoreOperation::Ping)
    }
}
