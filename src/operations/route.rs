// Route driver - cycles through the configured stops, flying and trading at each

use tracing::{error, info, warn};

use std::time::Duration;

use crate::config::FlightFailurePolicy;
use crate::error::Result;
use crate::models::*;
use crate::operations::ship::Ship;

pub struct RouteDriver<S: RouteSource> {
    ship: Ship,
    source: S,
    policy: FlightFailurePolicy,
    idle_backoff: Duration,
    current: Option<Route>,
}

impl<S: RouteSource> RouteDriver<S> {
    pub fn new(ship: Ship, source: S) -> Self {
        let policy = ship.flight_config().failure_policy;
        let idle_backoff = ship.flight_config().failed_cycle_backoff();
        Self {
            ship,
            source,
            policy,
            idle_backoff,
            current: None,
        }
    }

    pub fn with_failure_policy(mut self, policy: FlightFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    pub fn into_ship(self) -> Ship {
        self.ship
    }

    /// Runs trade cycles until shutdown. Returns `Ok` on a clean stop.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            if self.ship.shutdown.is_triggered() {
                info!(ship = %self.ship.id(), "Shutdown requested, leaving route");
                return Ok(());
            }
            if self.cycle_or_stop().await? {
                return Ok(());
            }
        }
    }

    /// Runs at most `cycles` full trade cycles.
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<()> {
        for _ in 0..cycles {
            if self.ship.shutdown.is_triggered() || self.cycle_or_stop().await? {
                break;
            }
        }
        Ok(())
    }

    /// `Ok(true)` when the cycle was interrupted by shutdown.
    async fn cycle_or_stop(&mut self) -> Result<bool> {
        match self.run_cycle().await {
            Ok(()) => Ok(false),
            Err(e) if e.is_cancelled() => {
                info!(ship = %self.ship.id(), "Route interrupted by shutdown");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    async fn run_cycle(&mut self) -> Result<()> {
        let route = self.load_route()?;
        info!(ship = %self.ship.id(), stops = route.len(), "Starting trade cycle");

        let mut traded = 0;
        for (idx, stop) in route.route.iter().enumerate() {
            info!(ship = %self.ship.id(), step = idx + 1, total = route.len(), station = %stop.station, "Route step");
            if self.visit(stop).await? {
                traded += 1;
            }
        }

        if traded > 0 {
            info!(ship = %self.ship.id(), traded, "Trade cycle finished");
            self.ship.observer.cycle_completed(self.ship.id());
            return Ok(());
        }

        warn!(
            ship = %self.ship.id(),
            backoff_secs = self.idle_backoff.as_secs(),
            "No stop traded this cycle, backing off"
        );
        self.ship.shutdown.sleep(self.idle_backoff).await?;
        Ok(())
    }

    /// Re-reads the route, keeping the last good one when the source breaks.
    fn load_route(&mut self) -> Result<Route> {
        match self.source.load() {
            Ok(route) => {
                self.current = Some(route.clone());
                Ok(route)
            }
            Err(e) => match &self.current {
                Some(previous) => {
                    warn!(error = %e, "Route reload failed, keeping previous route");
                    Ok(previous.clone())
                }
                None => Err(e),
            },
        }
    }

    /// `Ok(true)` when commerce completed at the stop.
    async fn visit(&mut self, stop: &RouteStop) -> Result<bool> {
        if let Err(e) = self.ship.get_details().await {
            if e.is_cancelled() {
                return Err(e);
            }
            warn!(ship = %self.ship.id(), error = %e, "Could not refresh ship details");
        }

        if self.ship.details().location() != stop.station {
            if let Err(e) = self.ship.fly(&stop.station).await {
                if e.is_cancelled() {
                    return Err(e);
                }
                match self.policy {
                    FlightFailurePolicy::SkipStop => {
                        error!(ship = %self.ship.id(), station = %stop.station, error = %e, "Flight failed, skipping stop");
                        return Ok(false);
                    }
                    FlightFailurePolicy::Escalate => {
                        error!(ship = %self.ship.id(), station = %stop.station, error = %e, "Flight failed");
                        return Err(e);
                    }
                }
            }
        }

        if self.ship.details().location() != stop.station {
            warn!(
                ship = %self.ship.id(),
                station = %stop.station,
                location = %self.ship.details().location(),
                "Not at station, skipping commerce"
            );
            return Ok(false);
        }

        match self.ship.do_commerce(&stop.sell, &stop.buy).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(ship = %self.ship.id(), station = %stop.station, error = %e, "Commerce failed");
                Ok(false)
            }
        }
    }
}
