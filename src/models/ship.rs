use serde::{Deserialize, Serialize};

use crate::models::ServerError;

/// Ship details as reported by the game.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ShipDetails {
    pub id: String,
    #[serde(rename = "flightPlanId")]
    pub flight_plan_id: Option<String>,
    pub location: Option<String>,
    pub x: i32,
    pub y: i32,
    pub cargo: Vec<ShipCargo>,
    #[serde(rename = "spaceAvailable")]
    pub space_available: i32,
    #[serde(rename = "type")]
    pub ship_type: String,
    pub class: String,
    #[serde(rename = "maxCargo")]
    pub max_cargo: i32,
    #[serde(rename = "loadingSpeed")]
    pub loading_speed: i32,
    pub speed: i32,
    pub manufacturer: String,
    pub plating: i32,
    pub weapons: i32,
}

/// One line of held inventory. Fuel is carried as cargo too.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ShipCargo {
    pub good: String,
    pub quantity: i32,
    #[serde(rename = "totalVolume")]
    pub total_volume: i32,
}

impl ShipDetails {
    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or_default()
    }

    /// The active flight plan, treating an empty id as "not in flight".
    pub fn active_flight_plan(&self) -> Option<&str> {
        self.flight_plan_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_in_flight(&self) -> bool {
        self.active_flight_plan().is_some()
    }

    pub fn cargo_line(&self, good: &str) -> Option<&ShipCargo> {
        self.cargo.iter().find(|line| line.good == good)
    }

    pub fn held_quantity(&self, good: &str) -> i32 {
        self.cargo_line(good).map(|line| line.quantity).unwrap_or(0)
    }
}

/// Live view of the ship, owned by the control loop and replaced on each refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipState {
    pub details: ShipDetails,
    pub last_error: ServerError,
}

impl ShipState {
    pub fn new(id: &str) -> Self {
        Self {
            details: ShipDetails {
                id: id.to_string(),
                ..ShipDetails::default()
            },
            last_error: ServerError::unset(),
        }
    }
}
