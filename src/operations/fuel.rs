// Fuel resupply - makes room in the cargo bay and buys emergency fuel

use tracing::{info, warn};

use crate::config::ReliefAccounting;
use crate::error::{Result, TraderError};
use crate::operations::ship::Ship;

impl Ship {
    /// Buys `required` units of fuel, selling other cargo first if the bay is too full.
    pub async fn force_buy_fuel(&mut self, required: i32) -> Result<()> {
        let fuel_good = self.fuel.fuel_good.clone();

        if self.details().space_available > required {
            self.buy(&fuel_good, required).await?;
            return Ok(());
        }

        let market = self.get_marketplace_products().await?;
        info!(ship = %self.id(), required = required, "Priority fuel purchase issued");

        if self.details().space_available > required {
            self.buy(&fuel_good, required).await?;
            return Ok(());
        }

        warn!(
            ship = %self.id(),
            required = required,
            space = self.details().space_available,
            "Not enough room for fuel, selling cargo"
        );

        let accounting = self.fuel.relief_accounting;
        let mut outstanding = required;
        let cargo = self.details().cargo.clone();

        for line in cargo.iter().filter(|line| line.good != fuel_good) {
            let Some(product) = market.get(&line.good) else {
                continue;
            };

            if line.total_volume > outstanding {
                let units = partial_units(accounting, outstanding, product.volume_per_unit)
                    .min(line.quantity);
                info!(ship = %self.id(), good = %line.good, units = units, outstanding = outstanding, "Selling part of lot for fuel");
                if units > 0 {
                    self.sell(&line.good, units).await?;
                }
                self.buy(&fuel_good, required).await?;
                info!(ship = %self.id(), fuel = required, "Ship is refueled");
                return Ok(());
            }

            if line.quantity > 0 {
                info!(ship = %self.id(), good = %line.good, units = line.quantity, outstanding = outstanding, "Selling whole lot for fuel");
                self.sell(&line.good, line.quantity).await?;
            }
            outstanding -= relief(accounting, line.quantity, line.total_volume);
        }

        warn!(ship = %self.id(), required = required, "No cargo left to free room for fuel");
        Err(TraderError::ResourceExhausted {
            required,
            location: self.details().location().to_string(),
        })
    }
}

/// Units of a good to sell to free `outstanding` room.
pub fn partial_units(accounting: ReliefAccounting, outstanding: i32, volume_per_unit: i32) -> i32 {
    let volume = volume_per_unit.max(1);
    match accounting {
        ReliefAccounting::Volume => (outstanding + volume - 1) / volume,
        ReliefAccounting::Quantity => outstanding / volume,
    }
}

/// How much a fully sold line counts against the outstanding requirement.
pub fn relief(accounting: ReliefAccounting, quantity: i32, total_volume: i32) -> i32 {
    match accounting {
        ReliefAccounting::Volume => total_volume,
        ReliefAccounting::Quantity => quantity,
    }
}
