//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod ambulance_request;
pub mod availability;
pub mod help_request;

pub use ambulance_request::{AmbulanceRequestEntity, AmbulanceRequestStatusDb};
pub use availability::AmbulanceAvailabilityEntity;
pub use help_request::{HelpRequestEntity, HelpRequestStatusDb};
