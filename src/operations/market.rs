use tracing::debug;

use crate::error::Result;
use crate::models::*;
use crate::operations::ship::Ship;

impl Ship {
    /// Snapshot of what can be traded where the ship is right now.
    pub async fn get_marketplace_products(&mut self) -> Result<MarketSnapshot> {
        self.get_details().await?;
        let location = self.details().location().to_string();

        let payload = self.transport.get_marketplace(&location).await?;
        let response: MarketplaceResponse = decode_checked(&payload)?;

        debug!(ship = %self.id(), location = %location, products = response.marketplace.len(), "Marketplace fetched");
        Ok(MarketSnapshot::new(location, response.marketplace))
    }
}
