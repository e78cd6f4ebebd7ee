use async_trait::async_trait;

use crate::{core::point::PriceTable, prelude::*};

/// Upstream provider of the hourly prices.
///
/// Implementations enforce their own timeouts, a timed out fetch is just another error.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self) -> Result<PriceTable>;
}
