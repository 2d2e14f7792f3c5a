#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The cost of a resource expressed over several billing periods.
///
/// Every rate is derived from the same unrounded hourly price and rounded
/// independently, so `daily_rate` is never `hourly_rate * 24` when the hourly
/// price carries more than four decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CostBreakdown {
    pub hourly_rate: f64,
    pub daily_rate: f64,
    pub monthly_rate: f64,
    pub yearly_rate: f64,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub hours_running: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub lifetime: Option<f64>,
}
