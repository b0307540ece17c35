//! Pieces shared by the help and ambulance request lifecycles.
//!
//! Both lifecycles follow the same consume-then-advance protocol: take a
//! ledger unit, then move the request forward; if the move fails, give the
//! unit back. They differ only in when the unit is taken (on accept for help
//! requests, on submit for ambulance requests).

use tracing::{error, info};

use super::ledger::AvailabilityLedger;
use crate::models::{AmbulanceAvailability, RequestKind};

/// What a lifecycle operation did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEffect {
    /// The operation does not touch the ledger.
    Untouched,
    /// One unit was taken.
    Consumed(AmbulanceAvailability),
    /// One unit was given back.
    Returned(AmbulanceAvailability),
    /// Giving the unit back failed; the request still advanced.
    ReturnFailed,
}

impl LedgerEffect {
    /// Ledger row as of this operation, when one was read.
    pub fn availability(&self) -> Option<&AmbulanceAvailability> {
        match self {
            LedgerEffect::Consumed(row) | LedgerEffect::Returned(row) => Some(row),
            LedgerEffect::Untouched | LedgerEffect::ReturnFailed => None,
        }
    }

    pub fn unit_returned(&self) -> bool {
        matches!(self, LedgerEffect::Returned(_))
    }
}

/// A request after a lifecycle operation, with its ledger effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transitioned<R> {
    pub request: R,
    pub ledger: LedgerEffect,
}

impl<R> Transitioned<R> {
    pub fn untouched(request: R) -> Self {
        Self {
            request,
            ledger: LedgerEffect::Untouched,
        }
    }
}

/// One page of a hospital's requests plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPage<R> {
    pub data: Vec<R>,
    pub total: i64,
}

/// Gives a unit back after the request it was held for has advanced.
///
/// The return is a soft postcondition: a failure is logged and reported as
/// [`LedgerEffect::ReturnFailed`], never as an error.
pub(crate) async fn return_unit(
    ledger: &AvailabilityLedger,
    kind: RequestKind,
    hospital_id: &str,
    request_id: uuid::Uuid,
) -> LedgerEffect {
    match ledger.increment(hospital_id).await {
        Ok(row) => {
            info!(
                kind = %kind,
                hospital_id = %hospital_id,
                request_id = %request_id,
                available_count = row.available_count,
                total_count = row.total_count,
                "Ambulance unit returned"
            );
            LedgerEffect::Returned(row)
        }
        Err(e) => {
            error!(
                kind = %kind,
                hospital_id = %hospital_id,
                request_id = %request_id,
                error = %e,
                "Failed to return ambulance unit"
            );
            LedgerEffect::ReturnFailed
        }
    }
}

/// Gives back a unit taken for an operation that did not go through.
pub(crate) async fn compensate(
    ledger: &AvailabilityLedger,
    kind: RequestKind,
    hospital_id: &str,
    reason: &str,
) {
    match ledger.increment(hospital_id).await {
        Ok(row) => info!(
            kind = %kind,
            hospital_id = %hospital_id,
            reason = %reason,
            available_count = row.available_count,
            "Returned unit taken for failed operation"
        ),
        Err(e) => error!(
            kind = %kind,
            hospital_id = %hospital_id,
            reason = %reason,
            error = %e,
            "Failed to return unit taken for failed operation"
        ),
    }
}
