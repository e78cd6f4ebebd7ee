use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::quantity::rate::KilowattHourRate;

/// Energy price of the one-hour interval which begins at [`PricePoint::starts_at`].
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, derive_more::Constructor,
)]
#[must_use]
pub struct PricePoint {
    pub total: KilowattHourRate,

    /// The provider's offset is kept as is, so that the point serializes back unchanged.
    #[serde(rename = "startsAt")]
    pub starts_at: DateTime<FixedOffset>,
}

/// All the currently known hourly prices: today and, once published, tomorrow.
pub type PriceTable = Vec<PricePoint>;
