//! Trade observability sink.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::info;

use crate::models::TradeKind;

/// Receives trading events from the control loop.
pub trait TradeObserver: Send + Sync {
    fn trade_completed(
        &self,
        kind: TradeKind,
        ship: &str,
        good: &str,
        location: &str,
        quantity: i32,
        total: i64,
    );

    fn fuel_consumed(&self, ship: &str, amount: i32);

    fn cycle_completed(&self, ship: &str);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TradeObserver for NoopObserver {
    fn trade_completed(&self, _: TradeKind, _: &str, _: &str, _: &str, _: i32, _: i64) {}
    fn fuel_consumed(&self, _: &str, _: i32) {}
    fn cycle_completed(&self, _: &str) {}
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TradeTotals {
    pub trade_cycles: HashMap<String, u64>,
    pub fuel_consumed: HashMap<String, i64>,
    /// Keyed by (ship, good).
    pub money_spent: HashMap<(String, String), i64>,
    pub money_earned: HashMap<(String, String), i64>,
    /// Keyed by (ship, good, location).
    pub goods_bought: HashMap<(String, String, String), i64>,
    pub goods_sold: HashMap<(String, String, String), i64>,
}

/// In-process counters, also reported through `tracing`.
#[derive(Debug, Default)]
pub struct TradeCounters {
    totals: Mutex<TradeTotals>,
}

impl TradeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TradeTotals {
        self.totals.lock().clone()
    }
}

impl TradeObserver for TradeCounters {
    fn trade_completed(
        &self,
        kind: TradeKind,
        ship: &str,
        good: &str,
        location: &str,
        quantity: i32,
        total: i64,
    ) {
        let money_key = (ship.to_string(), good.to_string());
        let units_key = (ship.to_string(), good.to_string(), location.to_string());
        {
            let mut totals = self.totals.lock();
            match kind {
                TradeKind::Buy => {
                    *totals.money_spent.entry(money_key).or_default() += total;
                    *totals.goods_bought.entry(units_key).or_default() += quantity as i64;
                }
                TradeKind::Sell => {
                    *totals.money_earned.entry(money_key).or_default() += total;
                    *totals.goods_sold.entry(units_key).or_default() += quantity as i64;
                }
            }
        }
        info!(
            ship = ship,
            kind = %kind,
            good = good,
            location = location,
            quantity = quantity,
            total = total,
            "Trade recorded"
        );
    }

    fn fuel_consumed(&self, ship: &str, amount: i32) {
        *self
            .totals
            .lock()
            .fuel_consumed
            .entry(ship.to_string())
            .or_default() += amount as i64;
        info!(ship = ship, fuel = amount, "Fuel consumed");
    }

    fn cycle_completed(&self, ship: &str) {
        let cycles = {
            let mut totals = self.totals.lock();
            let entry = totals.trade_cycles.entry(ship.to_string()).or_default();
            *entry += 1;
            *entry
        };
        info!(ship = ship, cycles = cycles, "Trade cycle completed");
    }
}
