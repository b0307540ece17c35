//! Shared utilities and common types for the hospital portal backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Input validation and normalization
//! - Identity-provider token verification

pub mod jwt;
pub mod validation;
