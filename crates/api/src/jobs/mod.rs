//! Background jobs run alongside the HTTP server.

mod rate_limit_prune;
mod store_probe;
mod scheduler;

pub use rate_limit_prune::RateLimitPruneJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use store_probe::StoreProbeJob;
