//! Ambulance availability ledger.
//!
//! Sole owner of `0 <= available_count <= total_count`. Rows are created
//! lazily with a full fleet and only ever move by one unit through the
//! store's atomic decrement and clamped increment.

use std::sync::Arc;

use tracing::{debug, info};

use super::store::{AvailabilityStore, StoreError, StoreResult};
use crate::models::availability::DEFAULT_FLEET_SIZE;
use crate::models::AmbulanceAvailability;

/// Result of asking the ledger for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// A unit was taken; carries the updated row.
    Consumed(AmbulanceAvailability),
    /// No unit was free; carries the unchanged row.
    Refused(AmbulanceAvailability),
}

#[derive(Clone)]
pub struct AvailabilityLedger {
    store: Arc<dyn AvailabilityStore>,
    fleet_size: i32,
}

impl AvailabilityLedger {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self::with_fleet_size(store, DEFAULT_FLEET_SIZE)
    }

    /// Uses `fleet_size` for rows created lazily.
    pub fn with_fleet_size(store: Arc<dyn AvailabilityStore>, fleet_size: i32) -> Self {
        Self {
            store,
            fleet_size: fleet_size.max(1),
        }
    }

    pub fn fleet_size(&self) -> i32 {
        self.fleet_size
    }

    /// Reads a hospital's ledger, creating a full one if absent.
    pub async fn get_or_init(&self, hospital_id: &str) -> StoreResult<AmbulanceAvailability> {
        if let Some(row) = self.store.find(hospital_id).await? {
            return Ok(row);
        }

        match self.store.insert_if_absent(hospital_id, self.fleet_size).await {
            Ok(row) => {
                info!(
                    hospital_id = %hospital_id,
                    total_count = row.total_count,
                    "Initialized ambulance availability"
                );
                Ok(row)
            }
            Err(StoreError::AlreadyExists) => {
                debug!(hospital_id = %hospital_id, "Ledger created concurrently, re-reading");
                self.store
                    .find(hospital_id)
                    .await?
                    .ok_or_else(|| StoreError::Query("ledger vanished after insert".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Takes one unit if any is free.
    pub async fn decrement(&self, hospital_id: &str) -> StoreResult<DecrementOutcome> {
        if let Some(row) = self.store.try_decrement(hospital_id).await? {
            return Ok(DecrementOutcome::Consumed(row));
        }

        // Either the row is missing or it is at zero. Initializing tells the
        // two apart; a row that now shows free units gets one more attempt.
        let row = self.get_or_init(hospital_id).await?;
        if !row.has_units() {
            return Ok(DecrementOutcome::Refused(row));
        }

        match self.store.try_decrement(hospital_id).await? {
            Some(row) => Ok(DecrementOutcome::Consumed(row)),
            None => {
                let current = self.get_or_init(hospital_id).await?;
                Ok(DecrementOutcome::Refused(current))
            }
        }
    }

    /// Returns one unit, never exceeding the fleet size.
    pub async fn increment(&self, hospital_id: &str) -> StoreResult<AmbulanceAvailability> {
        match self.store.increment_clamped(hospital_id).await? {
            Some(row) => Ok(row),
            // A freshly created row is already full.
            None => self.get_or_init(hospital_id).await,
        }
    }
}

impl std::fmt::Debug for AvailabilityLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityLedger")
            .field("fleet_size", &self.fleet_size)
            .finish_non_exhaustive()
    }
}
