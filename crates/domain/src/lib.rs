//! Domain layer for the hospital portal backend.
//!
//! This crate contains:
//! - Domain models (ledger rows, help and ambulance requests, activity)
//! - The availability ledger and request lifecycle services
//! - Store ports with an in-memory implementation
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::LifecycleError;
