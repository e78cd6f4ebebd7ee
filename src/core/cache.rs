use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    core::{point::PriceTable, source::PriceSource},
    prelude::*,
};

/// Latest successfully fetched price table.
///
/// Readers get their own [`Arc`] snapshot, and a refresh swaps in a brand new table,
/// so a reader never sees a refresh half-way.
#[derive(Default)]
pub struct PriceCache(RwLock<Arc<PriceTable>>);

impl PriceCache {
    #[must_use]
    pub fn current(&self) -> Arc<PriceTable> {
        Arc::clone(&self.0.read())
    }

    pub fn replace(&self, table: PriceTable) {
        let table = Arc::new(table);
        *self.0.write() = table;
    }

    /// Fetch the prices and replace the table.
    ///
    /// On failure, the current table stays in effect.
    #[instrument(skip_all)]
    pub async fn refresh(&self, source: &dyn PriceSource) -> Result<usize> {
        info!("refreshing the prices…");
        match source.fetch_prices().await {
            Ok(table) => {
                let n_points = table.len();
                self.replace(table);
                info!(n_points, "refreshed");
                Ok(n_points)
            }
            Err(error) => {
                error!("failed to refresh the prices, keeping the old ones: {error:#}");
                Err(error)
            }
        }
    }
}
