use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraderError};
use crate::models::{FlightPlan, Product, ShipDetails, TradeOrder};

/// Application-level failure embedded in an otherwise successful response.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ServerError {
    pub message: String,
    pub code: i32,
}

impl ServerError {
    /// Sentinel stored in the ship state before a refresh is decoded.
    pub fn unset() -> Self {
        Self {
            message: String::new(),
            code: -1,
        }
    }

    pub fn is_present(&self) -> bool {
        !self.message.is_empty() || self.code > 0
    }

    /// Extra fuel units demanded by an "insufficient fuel ... require N more" rejection.
    pub fn required_fuel(&self) -> Option<i32> {
        if self.code <= 0 || !self.message.to_lowercase().contains("insufficient fuel") {
            return None;
        }

        let words: Vec<&str> = self.message.split_whitespace().collect();
        words.windows(3).find_map(|w| {
            if w[0].eq_ignore_ascii_case("require") && w[2].eq_ignore_ascii_case("more") {
                w[1].parse::<i32>().ok().filter(|n| *n > 0)
            } else {
                None
            }
        })
    }

    pub fn into_error(self) -> TraderError {
        TraderError::ServerApplication {
            code: self.code,
            message: self.message,
        }
    }
}

/// Every payload may carry an `error` envelope that must be checked before use.
pub trait Envelope {
    fn server_error(&self) -> Option<&ServerError>;
}

/// Decodes a payload and rejects it when the embedded envelope reports a failure.
pub fn decode_checked<T: DeserializeOwned + Envelope>(payload: &str) -> Result<T> {
    let decoded: T = serde_json::from_str(payload)?;
    if let Some(err) = decoded.server_error().filter(|e| e.is_present()) {
        return Err(err.clone().into_error());
    }
    Ok(decoded)
}

#[derive(Debug, Deserialize, Default)]
pub struct ShipResponse {
    pub ship: Option<ShipDetails>,
    pub error: Option<ServerError>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FlightPlanResponse {
    #[serde(rename = "flightPlan")]
    pub flight_plan: Option<FlightPlan>,
    pub error: Option<ServerError>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MarketplaceResponse {
    #[serde(default)]
    pub marketplace: Vec<Product>,
    pub error: Option<ServerError>,
}

/// Result of a buy or sell order.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TradeResponse {
    #[serde(default)]
    pub credits: i64,
    pub order: Option<TradeOrder>,
    pub ship: Option<ShipDetails>,
    pub error: Option<ServerError>,
}

impl Envelope for ShipResponse {
    fn server_error(&self) -> Option<&ServerError> {
        self.error.as_ref()
    }
}

impl Envelope for FlightPlanResponse {
    fn server_error(&self) -> Option<&ServerError> {
        self.error.as_ref()
    }
}

impl Envelope for MarketplaceResponse {
    fn server_error(&self) -> Option<&ServerError> {
        self.error.as_ref()
    }
}

impl Envelope for TradeResponse {
    fn server_error(&self) -> Option<&ServerError> {
        self.error.as_ref()
    }
}
