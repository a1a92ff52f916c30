// SpaceTraders Ship Library
// Autonomous trading and fuel resupply for a single ship

pub mod models;
pub mod client;
pub mod operations;
pub mod config;
pub mod error;
pub mod shutdown;
pub mod telemetry;

// Re-export commonly used types
pub use models::{
    ship::{ShipCargo, ShipDetails, ShipState},
    market::{MarketSnapshot, Product},
    navigation::FlightPlan,
    route::{Route, RouteFile, RouteSource, RouteStop, SELL_ALL},
    responses::*,
};

pub use client::{HttpTransport, QueueTransport, Request, Transport};
pub use config::{Backend, FlightFailurePolicy, ReliefAccounting, TraderConfig};
pub use error::{Result, TraderError, TransportError};
pub use operations::{RouteDriver, Ship};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use telemetry::{TradeCounters, TradeObserver};

// Constants
pub const API_BASE_URL: &str = "https://api.spacetraders.io";
pub const DEFAULT_CONFIG_FILE: &str = "spacetraders_ship.toml";
