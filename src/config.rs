use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::client::RetryConfig;
use crate::error::{Result, TraderError};
use crate::API_BASE_URL;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TraderConfig {
    pub ship: ShipConfig,
    pub transport: TransportConfig,
    pub retry: RetryConfig,
    pub flight: FlightConfig,
    pub fuel: FuelConfig,
    pub route: RouteConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ShipConfig {
    /// Ship to control. Usually supplied through `SHIP_ID`.
    pub id: String,
    /// Account token. Usually supplied through `USER_TOKEN`.
    pub token: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Http,
    Queue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    pub backend: Backend,
    pub base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout_seconds: u64,
    /// TCP address of the queue bridge
    pub queue_addr: String,
    /// How long one queue poll waits for a message
    pub poll_interval_ms: u64,
    /// How long to wait for the correlated response before retrying
    pub response_timeout_seconds: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            base_url: API_BASE_URL.to_string(),
            request_timeout_seconds: 30,
            queue_addr: "127.0.0.1:9093".to_string(),
            poll_interval_ms: 500,
            response_timeout_seconds: 30,
        }
    }
}

impl TransportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_seconds)
    }
}

/// What the route driver does when a ship cannot reach a stop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FlightFailurePolicy {
    /// Log the failure and continue with the next stop.
    #[default]
    SkipStop,
    /// Stop the driver and hand the error to the caller.
    Escalate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlightConfig {
    /// Added to every arrival wait
    pub arrival_grace_seconds: u64,
    /// Flight plan requests per destination, fuel resupplies included
    pub max_plan_attempts: u32,
    /// Wait used while still in flight with nothing left on the clock
    pub idle_poll_seconds: u64,
    pub failure_policy: FlightFailurePolicy,
    /// Pause after a route cycle in which no stop traded. 0 disables it.
    pub failed_cycle_backoff_seconds: u64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            arrival_grace_seconds: 5,
            max_plan_attempts: 3,
            idle_poll_seconds: 1,
            failure_policy: FlightFailurePolicy::SkipStop,
            failed_cycle_backoff_seconds: 30,
        }
    }
}

impl FlightConfig {
    pub fn arrival_grace(&self) -> Duration {
        Duration::from_secs(self.arrival_grace_seconds)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_secs(self.idle_poll_seconds)
    }

    pub fn failed_cycle_backoff(&self) -> Duration {
        Duration::from_secs(self.failed_cycle_backoff_seconds)
    }
}

/// How freed cargo counts against an outstanding fuel requirement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReliefAccounting {
    /// Decrement by volume freed; partial sells round up.
    #[default]
    Volume,
    /// Decrement by units sold; partial sells round down.
    Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FuelConfig {
    pub fuel_good: String,
    pub relief_accounting: ReliefAccounting,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            fuel_good: "FUEL".to_string(),
            relief_accounting: ReliefAccounting::Volume,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouteConfig {
    pub path: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            path: "route.toml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Installs the global subscriber. `RUST_LOG` wins over `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                let _ = fmt().json().with_env_filter(filter).try_init();
            }
            _ => {
                let _ = fmt().with_env_filter(filter).try_init();
            }
        }
    }
}

impl TraderConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create(config_path: &str) -> Result<Self> {
        if Path::new(config_path).exists() {
            info!(path = config_path, "Loading configuration");
            let config_str = fs::read_to_string(config_path)?;
            let config: TraderConfig = toml::from_str(&config_str)?;
            Ok(config)
        } else {
            info!(path = config_path, "Creating default configuration");
            let config = TraderConfig::default();
            config.save(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &str) -> Result<()> {
        if let Some(parent) = Path::new(config_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let config_str = toml::to_string_pretty(self)?;
        fs::write(config_path, config_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ship.id.trim().is_empty() {
            return Err(TraderError::Config("ship id must be set (SHIP_ID)".to_string()));
        }
        if self.transport.backend == Backend::Http && self.transport.base_url.trim().is_empty() {
            return Err(TraderError::Config("base_url cannot be empty".to_string()));
        }
        if self.transport.backend == Backend::Queue && self.transport.queue_addr.trim().is_empty() {
            return Err(TraderError::Config("queue_addr cannot be empty".to_string()));
        }
        if self.transport.poll_interval_ms == 0 {
            return Err(TraderError::Config("poll_interval_ms must be greater than 0".to_string()));
        }
        if self.transport.response_timeout_seconds == 0 {
            return Err(TraderError::Config(
                "response_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(TraderError::Config("max_attempts must be greater than 0".to_string()));
        }
        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            return Err(TraderError::Config("backoff_factor must be at least 1.0".to_string()));
        }
        if self.flight.max_plan_attempts == 0 {
            return Err(TraderError::Config(
                "max_plan_attempts must be greater than 0".to_string(),
            ));
        }
        if self.flight.idle_poll_seconds == 0 {
            return Err(TraderError::Config("idle_poll_seconds must be greater than 0".to_string()));
        }
        if self.fuel.fuel_good.trim().is_empty() {
            return Err(TraderError::Config("fuel_good cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        info!(
            ship = %self.ship.id,
            backend = ?self.transport.backend,
            route = %self.route.path,
            "Configuration summary"
        );
        info!(
            max_attempts = self.retry.max_attempts,
            rate_limit_grace = self.retry.rate_limit_grace_seconds,
            transient_delay = self.retry.transient_delay_seconds,
            "Retry policy"
        );
        info!(
            arrival_grace = self.flight.arrival_grace_seconds,
            max_plan_attempts = self.flight.max_plan_attempts,
            failure_policy = ?self.flight.failure_policy,
            failed_cycle_backoff = self.flight.failed_cycle_backoff_seconds,
            relief_accounting = ?self.fuel.relief_accounting,
            "Flight and fuel policy"
        );
    }
}
