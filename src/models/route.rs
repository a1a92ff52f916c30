use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraderError};

/// Sell intent meaning "sell everything currently held of this good".
pub const SELL_ALL: i32 = -1;

/// Ordered, cyclic list of stops.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Route {
    #[serde(default)]
    pub route: Vec<RouteStop>,
}

/// One station with what to sell and what to end up holding.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RouteStop {
    pub station: String,
    #[serde(default)]
    pub buy: BTreeMap<String, i32>,
    #[serde(default)]
    pub sell: BTreeMap<String, i32>,
}

impl Route {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let route: Route =
            toml::from_str(text).map_err(|e| TraderError::Route(e.to_string()))?;
        route.validate()?;
        Ok(route)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            TraderError::Route(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TraderError::Route(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.route.is_empty() {
            return Err(TraderError::Route("route has no stops".to_string()));
        }

        for (idx, stop) in self.route.iter().enumerate() {
            if stop.station.trim().is_empty() {
                return Err(TraderError::Route(format!("stop {} has no station", idx + 1)));
            }
            if let Some((good, qty)) = stop.buy.iter().find(|(_, qty)| **qty < 0) {
                return Err(TraderError::Route(format!(
                    "stop {} ({}): buy quantity for {} must not be negative, got {}",
                    idx + 1,
                    stop.station,
                    good,
                    qty
                )));
            }
            if let Some((good, qty)) = stop.sell.iter().find(|(_, qty)| **qty < SELL_ALL) {
                return Err(TraderError::Route(format!(
                    "stop {} ({}): sell quantity for {} must be {} or more, got {}",
                    idx + 1,
                    stop.station,
                    good,
                    SELL_ALL,
                    qty
                )));
            }
        }
        Ok(())
    }
}

/// Where the driver gets its route from at the start of every cycle.
pub trait RouteSource: Send + Sync {
    fn load(&self) -> Result<Route>;
}

/// Route file re-read each cycle so edits take effect between cycles.
#[derive(Debug, Clone)]
pub struct RouteFile {
    path: std::path::PathBuf,
}

impl RouteFile {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RouteSource for RouteFile {
    fn load(&self) -> Result<Route> {
        Route::load(&self.path)
    }
}

impl RouteSource for Route {
    fn load(&self) -> Result<Route> {
        Ok(self.clone())
    }
}
