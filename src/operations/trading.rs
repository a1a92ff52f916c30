// Trading operations module
use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::{Result, TraderError};
use crate::models::*;
use crate::operations::ship::Ship;

impl Ship {
    /// Sells, then buys, at the current station.
    ///
    /// `sell` quantities are units to sell (`SELL_ALL` for everything held);
    /// `buy` quantities are the totals the ship should hold afterwards. Both
    /// maps are copied, never modified.
    pub async fn do_commerce(
        &mut self,
        sell: &BTreeMap<String, i32>,
        buy: &BTreeMap<String, i32>,
    ) -> Result<()> {
        let market = self.get_marketplace_products().await?;

        let mut sell_orders = sell.clone();
        for line in &self.state.details.cargo {
            if !market.is_tradeable(&line.good) {
                continue;
            }
            if let Some(qty) = sell_orders.get_mut(&line.good) {
                if *qty == SELL_ALL {
                    info!(ship = %self.state.details.id, good = %line.good, quantity = line.quantity, "Selling the whole lot");
                    *qty = line.quantity;
                }
            }
        }

        self.sell_all(&sell_orders, &market).await?;
        self.get_details().await?;

        let mut buy_orders = buy.clone();
        for (good, target) in buy_orders.iter_mut() {
            let held = self.state.details.held_quantity(good);
            if held > 0 {
                debug!(good = %good, held = held, target = *target, "Completing lot");
                *target -= held;
            }
        }

        self.buy_all(&buy_orders, &market).await
    }

    /// Sells every positive intent tradeable here. Only cancellation aborts the batch.
    pub async fn sell_all(
        &mut self,
        sell: &BTreeMap<String, i32>,
        market: &MarketSnapshot,
    ) -> Result<()> {
        for (good, &quantity) in sell {
            if quantity <= 0 {
                continue;
            }
            if !market.is_tradeable(good) {
                debug!(ship = %self.id(), good = %good, location = %market.location, "Cannot sell here, skipping");
                continue;
            }

            match self.sell(good, quantity).await {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => warn!(ship = %self.id(), good = %good, quantity = quantity, error = %e, "Sell failed"),
            }
        }
        Ok(())
    }

    /// Buys every outstanding intent tradeable here, clamped to free cargo space.
    /// Fuel goes through the resupply planner. Only cancellation aborts the batch.
    pub async fn buy_all(
        &mut self,
        buy: &BTreeMap<String, i32>,
        market: &MarketSnapshot,
    ) -> Result<()> {
        // Room left in the bay, tracked across the batch.
        let mut space = self.details().space_available;

        for (good, &quantity) in buy {
            let Some(product) = market.get(good) else {
                debug!(ship = %self.id(), good = %good, location = %market.location, "Cannot buy here, skipping");
                continue;
            };
            if quantity <= 0 {
                continue;
            }
            let volume = product.volume_per_unit.max(0);

            let result = if *good == self.fuel.fuel_good {
                info!(ship = %self.id(), quantity = quantity, "Priority fuel purchase");
                self.force_buy_fuel(quantity)
                    .await
                    .map(|()| quantity * volume)
            } else {
                let amount = clamp_to_space(quantity, space, product.volume_per_unit);
                if amount < quantity {
                    info!(
                        ship = %self.id(),
                        good = %good,
                        wanted = quantity,
                        buying = amount,
                        space = space,
                        volume_per_unit = product.volume_per_unit,
                        "Low cargo space"
                    );
                }
                if amount <= 0 {
                    continue;
                }
                self.buy(good, amount).await.map(|_| amount * volume)
            };

            match result {
                Ok(used) => space = (space - used).max(0),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => warn!(ship = %self.id(), good = %good, quantity = quantity, error = %e, "Buy failed"),
            }
        }
        Ok(())
    }

    pub async fn sell(&mut self, good: &str, quantity: i32) -> Result<TradeResponse> {
        self.trade(TradeKind::Sell, good, quantity).await
    }

    pub async fn buy(&mut self, good: &str, quantity: i32) -> Result<TradeResponse> {
        self.trade(TradeKind::Buy, good, quantity).await
    }

    /// Sends one order and reports it to the observer on success.
    pub async fn trade(&mut self, kind: TradeKind, good: &str, quantity: i32) -> Result<TradeResponse> {
        if quantity <= 0 {
            return Err(TraderError::InvalidTrade {
                kind: kind.to_string(),
                good: good.to_string(),
                quantity,
            });
        }

        info!(ship = %self.id(), kind = %kind, good = good, quantity = quantity, "Placing order");
        let payload = match kind {
            TradeKind::Buy => self.transport.buy_good(good, quantity).await?,
            TradeKind::Sell => self.transport.sell_good(good, quantity).await?,
        };
        let response: TradeResponse = decode_checked(&payload)?;

        let order = response.order.clone().unwrap_or_else(|| TradeOrder {
            good: good.to_string(),
            quantity,
            ..TradeOrder::default()
        });
        let location = response
            .ship
            .as_ref()
            .and_then(|ship| ship.location.clone())
            .unwrap_or_else(|| self.details().location().to_string());

        self.observer
            .trade_completed(kind, self.id(), &order.good, &location, order.quantity, order.total);

        if let Some(ship) = &response.ship {
            let mut details = ship.clone();
            if details.id.is_empty() {
                details.id = self.id().to_string();
            }
            self.state.details = details;
        }
        Ok(response)
    }
}

/// Largest amount up to `quantity` that fits in `space` at `volume_per_unit` each.
pub fn clamp_to_space(quantity: i32, space: i32, volume_per_unit: i32) -> i32 {
    if volume_per_unit <= 0 {
        return quantity;
    }
    quantity.min(space.max(0) / volume_per_unit)
}
