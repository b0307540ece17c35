//! Change notifications for the portal tables.
//!
//! Events only tell subscribers that something changed; clients re-read
//! through the API. Nothing in the request lifecycle waits on the feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Table a change happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    AmbulanceAvailability,
    HelpRequests,
    AmbulanceRequests,
}

impl ChangeTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeTable::AmbulanceAvailability => "ambulance_availability",
            ChangeTable::HelpRequests => "help_requests",
            ChangeTable::AmbulanceRequests => "ambulance_requests",
        }
    }
}

impl std::fmt::Display for ChangeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// A single row change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub operation: ChangeOperation,
    pub hospital_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(
        table: ChangeTable,
        operation: ChangeOperation,
        hospital_id: impl Into<String>,
        record_id: Option<String>,
    ) -> Self {
        Self {
            table,
            operation,
            hospital_id: hospital_id.into(),
            record_id,
            at: Utc::now(),
        }
    }

    pub fn is_for_hospital(&self, hospital_id: &str) -> bool {
        self.hospital_id == hospital_id
    }
}

/// Broadcast fan-out of change events.
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Returns the number of subscribers reached.
    ///
    /// Never fails; with no subscribers the event is dropped.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => 0,
        }
    }

    /// Subscribes to events published after this call.
    ///
    /// A subscriber that falls more than the channel capacity behind loses
    /// the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
