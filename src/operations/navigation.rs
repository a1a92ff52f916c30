// Flight operations - flight plans, arrival waits and insufficient-fuel recovery

use tracing::{debug, info, warn};

use crate::error::{Result, TraderError};
use crate::models::*;
use crate::operations::ship::{missing_field, Ship};

impl Ship {
    /// Requests a flight plan to `destination`.
    ///
    /// An "insufficient fuel ... require N more" rejection buys N fuel and asks
    /// again, up to `flight.max_plan_attempts` requests in total. Any other
    /// rejection is returned as is.
    pub async fn new_flight_plan(&mut self, destination: &str) -> Result<FlightPlan> {
        let max_attempts = self.flight.max_plan_attempts.max(1);

        for attempt in 1..=max_attempts {
            let payload = self.transport.set_flight_plan(destination).await?;
            let response: FlightPlanResponse = serde_json::from_str(&payload)?;

            let Some(err) = response.error.filter(|e| e.is_present()) else {
                let plan = response.flight_plan.ok_or_else(|| missing_field("flightPlan"))?;
                info!(
                    ship = %self.id(),
                    destination = destination,
                    plan = %plan.id,
                    eta_seconds = plan.time_remaining_in_seconds,
                    fuel = plan.fuel_consumed,
                    "Flight plan accepted"
                );
                return Ok(plan);
            };

            self.state.last_error = err.clone();
            let Some(required) = err.required_fuel() else {
                warn!(ship = %self.id(), destination = destination, code = err.code, message = %err.message, "Flight plan rejected");
                return Err(err.into_error());
            };

            warn!(
                ship = %self.id(),
                destination = destination,
                required = required,
                attempt = attempt,
                "Insufficient fuel for flight plan"
            );
            if attempt == max_attempts {
                break;
            }
            self.force_buy_fuel(required).await?;
        }

        Err(TraderError::FlightPlanRejected {
            destination: destination.to_string(),
            attempts: max_attempts,
        })
    }

    /// Flies to `destination` and returns once the ship reports no active flight plan.
    pub async fn fly(&mut self, destination: &str) -> Result<FlightPlan> {
        info!(ship = %self.id(), from = %self.details().location(), to = destination, "Departing");
        let plan = self.new_flight_plan(destination).await?;
        self.observer.fuel_consumed(self.id(), plan.fuel_consumed);

        self.shutdown
            .sleep(plan.time_remaining() + self.flight.arrival_grace())
            .await?;
        self.get_details().await?;
        self.wait_while_in_flight().await?;

        info!(ship = %self.id(), location = %self.details().location(), "Arrived");
        Ok(plan)
    }

    /// The plan the ship is currently flying, if any.
    pub async fn get_flight_plan(&mut self) -> Result<Option<FlightPlan>> {
        let Some(plan_id) = self.details().active_flight_plan().map(str::to_string) else {
            return Ok(None);
        };
        self.fetch_flight_plan(&plan_id).await.map(Some)
    }

    /// Waits out a flight that was already under way, e.g. at start-up.
    pub async fn await_arrival(&mut self) -> Result<()> {
        self.get_details().await?;
        if let Some(plan) = self.get_flight_plan().await? {
            info!(
                ship = %self.id(),
                destination = %plan.destination,
                eta_seconds = plan.time_remaining_in_seconds,
                "Ship is en route"
            );
        }
        self.wait_while_in_flight().await
    }

    async fn fetch_flight_plan(&mut self, plan_id: &str) -> Result<FlightPlan> {
        let payload = self.transport.get_flight_plan(plan_id).await?;
        let response: FlightPlanResponse = decode_checked(&payload)?;
        response.flight_plan.ok_or_else(|| missing_field("flightPlan"))
    }

    async fn wait_while_in_flight(&mut self) -> Result<()> {
        while let Some(plan_id) = self.details().active_flight_plan().map(str::to_string) {
            let plan = self.fetch_flight_plan(&plan_id).await?;
            let remaining = plan.time_remaining();
            let wait = if remaining.is_zero() {
                self.flight.idle_poll()
            } else {
                remaining
            };
            debug!(ship = %self.id(), plan = %plan_id, wait_seconds = wait.as_secs(), "Still in flight");
            self.shutdown.sleep(wait).await?;
            self.get_details().await?;
        }
        Ok(())
    }
}
