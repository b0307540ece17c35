//! Persistence layer for the hospital portal backend.
//!
//! This crate contains:
//! - Database connection management and embedded migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations of the domain store ports
//! - The change notification listener

pub mod db;
pub mod entities;
pub mod error;
pub mod listener;
pub mod metrics;
pub mod repositories;
