//! Domain services for the hospital portal.
//!
//! Services hold the ledger and request lifecycle rules and reach storage
//! only through the ports in [`store`].

pub mod activity;
pub mod ambulance_requests;
pub mod change_feed;
pub mod help_requests;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod store;

pub use activity::ActivityService;
pub use ambulance_requests::AmbulanceRequestLifecycle;
pub use change_feed::{ChangeEvent, ChangeFeed, ChangeOperation, ChangeTable};
pub use help_requests::HelpRequestLifecycle;
pub use ledger::{AvailabilityLedger, DecrementOutcome};
pub use lifecycle::{LedgerEffect, RequestPage, Transitioned};
pub use memory::{InMemoryStore, StoreOperation};
pub use store::{
    AmbulanceRequestStore, AvailabilityStore, HelpRequestStore, StoreError, StoreHealth,
    StoreResult, Stores,
};
