//! HTTP service for the hospital portal: patient submissions, admin request
//! handling and the ambulance availability ledger.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
