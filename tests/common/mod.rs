// Shared fixtures: a scripted in-memory transport and payload builders
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use spacetraders_ship::{Request, Ship, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    ShipDetails,
    Marketplace,
    NewFlightPlan,
    FlightPlan,
    Buy,
    Sell,
}

impl Kind {
    fn of(request: &Request) -> Kind {
        match request {
            Request::ShipDetails => Kind::ShipDetails,
            Request::Marketplace { .. } => Kind::Marketplace,
            Request::NewFlightPlan { .. } => Kind::NewFlightPlan,
            Request::FlightPlan { .. } => Kind::FlightPlan,
            Request::Buy { .. } => Kind::Buy,
            Request::Sell { .. } => Kind::Sell,
        }
    }
}

/// Replays scripted payloads per request kind. The last payload of each
/// kind repeats once the script runs out.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<Kind, VecDeque<String>>>,
    calls: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, kind: Kind, payload: impl Into<String>) -> &Self {
        self.scripts
            .lock()
            .entry(kind)
            .or_default()
            .push_back(payload.into());
        self
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().clone()
    }

    pub fn count(&self, kind: Kind) -> usize {
        self.calls.lock().iter().filter(|r| Kind::of(r) == kind).count()
    }

    pub fn sells(&self) -> Vec<(String, i32)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|r| match r {
                Request::Sell { good, quantity } => Some((good.clone(), *quantity)),
                _ => None,
            })
            .collect()
    }

    pub fn buys(&self) -> Vec<(String, i32)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|r| match r {
                Request::Buy { good, quantity } => Some((good.clone(), *quantity)),
                _ => None,
            })
            .collect()
    }

    /// Trade kinds only, in call order, e.g. `["sell", "buy"]`.
    pub fn trade_sequence(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .iter()
            .filter_map(|r| match r {
                Request::Buy { .. } => Some("buy"),
                Request::Sell { .. } => Some("sell"),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exchange(&self, request: Request) -> Result<String, TransportError> {
        let kind = Kind::of(&request);
        self.calls.lock().push(request.clone());

        let mut scripts = self.scripts.lock();
        let queue = scripts.get_mut(&kind).ok_or_else(|| {
            TransportError::Network(format!("no scripted response for {}", request))
        })?;
        let payload = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        payload.ok_or_else(|| TransportError::Network(format!("script exhausted for {}", request)))
    }
}

pub fn ship_for(transport: &Arc<MockTransport>) -> Ship {
    Ship::new("ship-1", transport.clone())
}

/// Cargo line as (good, quantity, total volume).
pub type Line<'a> = (&'a str, i32, i32);

pub fn ship_json(location: &str, space: i32, cargo: &[Line], flight_plan: Option<&str>) -> String {
    let cargo: Vec<Value> = cargo
        .iter()
        .map(|(good, quantity, volume)| {
            json!({ "good": good, "quantity": quantity, "totalVolume": volume })
        })
        .collect();
    json!({
        "ship": {
            "id": "ship-1",
            "location": location,
            "x": 0,
            "y": 0,
            "cargo": cargo,
            "spaceAvailable": space,
            "flightPlanId": flight_plan,
            "type": "JW-MK-I",
            "class": "MK-I",
            "maxCargo": 300,
            "loadingSpeed": 25,
            "speed": 1,
            "manufacturer": "Jackshaw",
            "plating": 5,
            "weapons": 5
        }
    })
    .to_string()
}

/// Products as (symbol, volume per unit).
pub fn market_json(products: &[(&str, i32)]) -> String {
    let products: Vec<Value> = products
        .iter()
        .map(|(symbol, volume)| {
            json!({
                "symbol": symbol,
                "pricePerUnit": 10,
                "purchasePricePerUnit": 11,
                "sellPricePerUnit": 9,
                "spread": 2,
                "quantityAvailable": 10000,
                "volumePerUnit": volume
            })
        })
        .collect();
    json!({ "marketplace": products }).to_string()
}

pub fn trade_json(good: &str, quantity: i32) -> String {
    json!({
        "credits": 100000,
        "order": {
            "good": good,
            "pricePerUnit": 10,
            "quantity": quantity,
            "total": 10 * quantity as i64
        }
    })
    .to_string()
}

pub fn flight_plan_json(id: &str, destination: &str, remaining: i64, fuel: i32) -> String {
    json!({
        "flightPlan": {
            "id": id,
            "shipId": "ship-1",
            "departure": "OE-PM",
            "destination": destination,
            "distance": 20,
            "fuelConsumed": fuel,
            "fuelRemaining": 10,
            "timeRemainingInSeconds": remaining,
            "createdAt": "2021-05-01T10:00:00Z",
            "arrivesAt": "2021-05-01T10:01:00Z",
            "terminatedAt": null
        }
    })
    .to_string()
}

pub fn error_json(code: i32, message: &str) -> String {
    json!({ "error": { "code": code, "message": message } }).to_string()
}

pub fn insufficient_fuel_json(required: i32) -> String {
    error_json(
        3001,
        &format!(
            "Ship has insufficient fuel for flight plan. You require {} more FUEL",
            required
        ),
    )
}

pub fn intents(entries: &[(&str, i32)]) -> std::collections::BTreeMap<String, i32> {
    entries
        .iter()
        .map(|(good, qty)| (good.to_string(), *qty))
        .collect()
}
