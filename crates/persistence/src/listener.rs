//! Forwards PostgreSQL change notifications into the change feed.
//!
//! Table triggers call `pg_notify` with a JSON payload on every insert and
//! update; this listener parses each payload and republishes it.

use std::time::Duration;

use domain::services::{ChangeEvent, ChangeFeed};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Channel the schema triggers notify on.
pub const DEFAULT_CHANNEL: &str = "portal_changes";

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

pub struct ChangeListener {
    pool: PgPool,
    channel: String,
    feed: ChangeFeed,
}

impl ChangeListener {
    pub fn new(pool: PgPool, channel: impl Into<String>, feed: ChangeFeed) -> Self {
        Self {
            pool,
            channel: channel.into(),
            feed,
        }
    }

    /// Runs the listener on a background task until `shutdown` fires.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.run(&shutdown).await {
                    Ok(()) => break,
                    Err(e) => {
                        error!(error = %e, channel = %self.channel, "Change listener failed");
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        }
                    }
                }
            }
            info!(channel = %self.channel, "Change listener stopped");
        })
    }

    async fn run(&self, shutdown: &CancellationToken) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;
        info!(channel = %self.channel, "Listening for change notifications");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                notification = listener.recv() => {
                    let notification = notification?;
                    self.forward(notification.payload());
                }
            }
        }
    }

    fn forward(&self, payload: &str) {
        match parse_payload(payload) {
            Some(event) => {
                let receivers = self.feed.publish(event);
                debug!(receivers, "Forwarded change notification");
            }
            None => warn!(payload = %payload, "Ignoring malformed change notification"),
        }
    }
}

fn parse_payload(payload: &str) -> Option<ChangeEvent> {
    serde_json::from_str(payload).ok()
}
