use std::fmt;

use async_trait::async_trait;

use crate::error::TransportError;

/// The six request/response exchanges the control loop needs from the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ShipDetails,
    Marketplace { location: String },
    NewFlightPlan { destination: String },
    FlightPlan { plan_id: String },
    Buy { good: String, quantity: i32 },
    Sell { good: String, quantity: i32 },
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::ShipDetails => write!(f, "get-ship-details"),
            Request::Marketplace { location } => write!(f, "get-marketplace({})", location),
            Request::NewFlightPlan { destination } => {
                write!(f, "set-flight-plan({})", destination)
            }
            Request::FlightPlan { plan_id } => write!(f, "get-flight-plan({})", plan_id),
            Request::Buy { good, quantity } => write!(f, "buy-good({}, {})", good, quantity),
            Request::Sell { good, quantity } => write!(f, "sell-good({}, {})", good, quantity),
        }
    }
}

/// Request/response channel to the game server.
///
/// Implementations own their retry policy: a call either yields the raw
/// payload or a [`TransportError`] once retries are exhausted or a failure
/// is not worth retrying. The payload may still carry an application-level
/// `error` envelope; callers must check it before trusting the data.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(&self, request: Request) -> Result<String, TransportError>;

    async fn get_ship_details(&self) -> Result<String, TransportError> {
        self.exchange(Request::ShipDetails).await
    }

    async fn get_marketplace(&self, location: &str) -> Result<String, TransportError> {
        self.exchange(Request::Marketplace {
            location: location.to_string(),
        })
        .await
    }

    async fn set_flight_plan(&self, destination: &str) -> Result<String, TransportError> {
        self.exchange(Request::NewFlightPlan {
            destination: destination.to_string(),
        })
        .await
    }

    async fn get_flight_plan(&self, plan_id: &str) -> Result<String, TransportError> {
        self.exchange(Request::FlightPlan {
            plan_id: plan_id.to_string(),
        })
        .await
    }

    async fn buy_good(&self, good: &str, quantity: i32) -> Result<String, TransportError> {
        self.exchange(Request::Buy {
            good: good.to_string(),
            quantity,
        })
        .await
    }

    async fn sell_good(&self, good: &str, quantity: i32) -> Result<String, TransportError> {
        self.exchange(Request::Sell {
            good: good.to_string(),
            quantity,
        })
        .await
    }
}
