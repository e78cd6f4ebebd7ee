use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// All-in energy price per kilowatt-hour, as quoted by the provider.
#[repr(transparent)]
#[derive(Copy, Clone, Serialize, Deserialize, derive_more::From)]
pub struct KilowattHourRate(pub f64);

impl KilowattHourRate {
    pub const ZERO: Self = Self(0.0);
}

impl Display for KilowattHourRate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} /kWh", self.0)
    }
}

impl Debug for KilowattHourRate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{:?}/kWh", self.0)
    }
}

/// Total ordering, so that the rates can be sorted and compared for equality.
impl Ord for KilowattHourRate {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.0).cmp(&OrderedFloat(other.0))
    }
}

impl PartialOrd for KilowattHourRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KilowattHourRate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KilowattHourRate {}
