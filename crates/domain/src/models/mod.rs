//! Domain models for the hospital portal.

pub mod activity;
pub mod ambulance_request;
pub mod availability;
pub mod help_request;
pub mod request;

pub use activity::ActivityItem;
pub use ambulance_request::{AmbulanceRequest, AmbulanceRequestStatus, NewAmbulanceRequest};
pub use availability::{AmbulanceAvailability, AvailabilityLevel, AvailabilityResponse};
pub use help_request::{HelpRequest, HelpRequestStatus, NewHelpRequest};
pub use request::{Pagination, RequestFilter, RequestKind};
