//! Store metrics.
//!
//! Query durations are recorded per named query with an `outcome` label, and
//! pool gauges are sampled by a periodic job in the API crate.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Records a query's duration.
pub fn record_query_duration(query_name: &'static str, outcome: &'static str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name,
        "outcome" => outcome
    )
    .record(duration_secs);
}

/// Samples connection pool gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one query.
///
/// ```ignore
/// let timer = QueryTimer::new("try_decrement_availability");
/// let result = sqlx::query_as::<_, AmbulanceAvailabilityEntity>(...).fetch_optional(&pool).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time, labelled by whether `result` succeeded.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        record_query_duration(self.query_name, outcome, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("find_availability");
        assert_eq!(timer.query_name, "find_availability");
    }

    #[test]
    fn test_finish_without_recorder_is_noop() {
        let timer = QueryTimer::new("insert_help_request");
        let result: Result<(), String> = Err("boom".to_string());
        timer.finish(&result);
    }
}
