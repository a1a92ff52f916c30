use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-issued itinerary. Superseded by every fresh poll.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FlightPlan {
    pub id: String,
    #[serde(rename = "shipId")]
    pub ship_id: String,
    pub departure: String,
    pub destination: String,
    pub distance: i32,
    #[serde(rename = "fuelConsumed")]
    pub fuel_consumed: i32,
    #[serde(rename = "fuelRemaining")]
    pub fuel_remaining: i32,
    #[serde(rename = "timeRemainingInSeconds")]
    pub time_remaining_in_seconds: i64,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "arrivesAt")]
    pub arrives_at: Option<DateTime<Utc>>,
    #[serde(rename = "terminatedAt")]
    pub terminated_at: Option<DateTime<Utc>>,
}

impl FlightPlan {
    pub fn time_remaining(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.time_remaining_in_seconds.max(0) as u64)
    }
}
