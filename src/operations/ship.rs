// Ship controller - owns the live ship state and the handles every operation needs
use std::sync::Arc;

use serde::de::Error as _;
use tracing::{debug, warn};

use crate::client::Transport;
use crate::config::{FlightConfig, FuelConfig};
use crate::error::{Result, TraderError};
use crate::models::*;
use crate::shutdown::Shutdown;
use crate::telemetry::{NoopObserver, TradeObserver};

/// One autonomous trading ship.
///
/// Flight, market, commerce and fuel operations live in sibling modules as
/// further `impl Ship` blocks. All of them read and replace the same
/// [`ShipState`]; nothing else may mutate it.
pub struct Ship {
    pub(crate) state: ShipState,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) observer: Arc<dyn TradeObserver>,
    pub(crate) flight: FlightConfig,
    pub(crate) fuel: FuelConfig,
    pub(crate) shutdown: Shutdown,
}

impl Ship {
    pub fn new(id: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            state: ShipState::new(id),
            transport,
            observer: Arc::new(NoopObserver),
            flight: FlightConfig::default(),
            fuel: FuelConfig::default(),
            shutdown: Shutdown::never(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TradeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_flight_config(mut self, flight: FlightConfig) -> Self {
        self.flight = flight;
        self
    }

    pub fn with_fuel_config(mut self, fuel: FuelConfig) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn id(&self) -> &str {
        &self.state.details.id
    }

    pub fn state(&self) -> &ShipState {
        &self.state
    }

    pub fn details(&self) -> &ShipDetails {
        &self.state.details
    }

    pub fn flight_config(&self) -> &FlightConfig {
        &self.flight
    }

    /// Refreshes the ship state from the server, replacing it wholesale.
    pub async fn get_details(&mut self) -> Result<&ShipDetails> {
        let payload = self.transport.get_ship_details().await?;

        self.state.last_error = ServerError::unset();
        let response: ShipResponse = serde_json::from_str(&payload)?;

        if let Some(err) = response.error.filter(|e| e.is_present()) {
            warn!(ship = %self.id(), code = err.code, message = %err.message, "Ship details rejected");
            self.state.last_error = err.clone();
            return Err(err.into_error());
        }

        let details = response.ship.ok_or_else(|| missing_field("ship"))?;
        debug!(
            ship = %details.id,
            location = %details.location(),
            flight_plan = ?details.active_flight_plan(),
            space = details.space_available,
            "Ship details refreshed"
        );
        self.state.details = details;
        Ok(&self.state.details)
    }
}

/// Decode failure for a payload that parsed but lacks the data it should carry.
pub(crate) fn missing_field(field: &'static str) -> TraderError {
    TraderError::Decode(serde_json::Error::missing_field(field))
}
