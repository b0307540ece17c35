//! Ambulance availability ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fleet size given to a hospital whose ledger row is created lazily.
pub const DEFAULT_FLEET_SIZE: i32 = 10;

/// At or below this many free units the ledger reports `low` availability.
pub const DEFAULT_LOW_AVAILABILITY_THRESHOLD: i32 = 3;

/// Per-hospital count of free and total ambulances.
///
/// Holds `0 <= available_count <= total_count` for every row the stores
/// hand out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AmbulanceAvailability {
    pub hospital_id: String,
    pub available_count: i32,
    pub total_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AmbulanceAvailability {
    /// Creates a full ledger (every unit free) for a hospital.
    pub fn full(hospital_id: impl Into<String>, fleet_size: i32, now: DateTime<Utc>) -> Self {
        Self {
            hospital_id: hospital_id.into(),
            available_count: fleet_size,
            total_count: fleet_size,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if at least one unit is free.
    pub fn has_units(&self) -> bool {
        self.available_count > 0
    }

    /// Units currently out on a call.
    pub fn in_use(&self) -> i32 {
        self.total_count - self.available_count
    }

    /// Classifies the free-unit count.
    pub fn level(&self, low_threshold: i32) -> AvailabilityLevel {
        AvailabilityLevel::classify(self.available_count, low_threshold)
    }

    /// Builds the response payload for this ledger.
    pub fn to_response(&self, low_threshold: i32) -> AvailabilityResponse {
        AvailabilityResponse {
            hospital_id: self.hospital_id.clone(),
            available_count: self.available_count,
            total_count: self.total_count,
            in_use: self.in_use(),
            level: self.level(low_threshold),
            updated_at: self.updated_at,
        }
    }
}

/// Coarse availability indicator shown next to the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityLevel {
    /// No free units.
    None,
    /// At or below the low threshold.
    Low,
    Normal,
}

impl AvailabilityLevel {
    pub fn classify(available_count: i32, low_threshold: i32) -> Self {
        if available_count <= 0 {
            AvailabilityLevel::None
        } else if available_count <= low_threshold {
            AvailabilityLevel::Low
        } else {
            AvailabilityLevel::Normal
        }
    }
}

impl std::fmt::Display for AvailabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityLevel::None => write!(f, "none"),
            AvailabilityLevel::Low => write!(f, "low"),
            AvailabilityLevel::Normal => write!(f, "normal"),
        }
    }
}

/// Ledger as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AvailabilityResponse {
    pub hospital_id: String,
    pub available_count: i32,
    pub total_count: i32,
    pub in_use: i32,
    pub level: AvailabilityLevel,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(available: i32, total: i32) -> AmbulanceAvailability {
        let mut row = AmbulanceAvailability::full("saniat-rmel", total, Utc::now());
        row.available_count = available;
        row
    }

    #[test]
    fn test_full_ledger() {
        let row = AmbulanceAvailability::full("saniat-rmel", DEFAULT_FLEET_SIZE, Utc::now());
        assert_eq!(row.available_count, 10);
        assert_eq!(row.total_count, 10);
        assert_eq!(row.created_at, row.updated_at);
        assert_eq!(row.in_use(), 0);
    }

    #[test]
    fn test_has_units() {
        assert!(ledger(1, 10).has_units());
        assert!(!ledger(0, 10).has_units());
    }

    #[test]
    fn test_level_classification() {
        assert_eq!(ledger(0, 10).level(3), AvailabilityLevel::None);
        assert_eq!(ledger(1, 10).level(3), AvailabilityLevel::Low);
        assert_eq!(ledger(3, 10).level(3), AvailabilityLevel::Low);
        assert_eq!(ledger(4, 10).level(3), AvailabilityLevel::Normal);
        assert_eq!(ledger(10, 10).level(3), AvailabilityLevel::Normal);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(AvailabilityLevel::None.to_string(), "none");
        assert_eq!(AvailabilityLevel::Low.to_string(), "low");
        assert_eq!(AvailabilityLevel::Normal.to_string(), "normal");
    }

    #[test]
    fn test_response_serialization() {
        let response = ledger(2, 10).to_response(DEFAULT_LOW_AVAILABILITY_THRESHOLD);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["hospital_id"], "saniat-rmel");
        assert_eq!(json["available_count"], 2);
        assert_eq!(json["total_count"], 10);
        assert_eq!(json["in_use"], 8);
        assert_eq!(json["level"], "low");
    }
}
