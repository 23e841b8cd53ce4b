//! Aggregate sales statistics.
//!
//! Monetary fields are accumulated as integer minor units and converted to
//! two-decimal values only when the window is finalised for output.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use verdant_core::types::money::{MINOR_UNIT_SCALE, to_major_units};

/// Per-day rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub count: u64,
    /// Revenue from paid orders created that day.
    pub revenue: Decimal,
}

/// Statistics over a window of orders. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsWindow {
    /// All orders in the window, whatever their payment state.
    pub total_orders: u64,
    /// Sum of paid orders only.
    pub revenue_total: Decimal,
    /// `revenue_total / total_orders`, or zero for an empty window.
    pub average_order_value: Decimal,
    /// Counts by fulfilment status, keyed by the literal stored label.
    pub status_counts: BTreeMap<String, u64>,
    /// Counts by payment status, keyed by the literal stored label.
    pub payment_status_counts: BTreeMap<String, u64>,
    /// Calendar days in the reporting time zone.
    pub daily_buckets: BTreeMap<NaiveDate, DailyBucket>,
    /// Orders created in the 24 hours before the request, regardless of window.
    pub recent_orders: u64,
    /// Inclusive lower bound of the window; `None` for all time.
    pub window_start: Option<DateTime<Utc>>,
    /// IANA name of the zone used for daily buckets.
    pub reporting_time_zone: String,
}

/// Integer-valued accumulator behind a [`StatsWindow`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsTally {
    pub total_orders: u64,
    pub revenue_minor: i64,
    pub status_counts: BTreeMap<String, u64>,
    pub payment_status_counts: BTreeMap<String, u64>,
    pub daily: BTreeMap<NaiveDate, DayTally>,
    pub recent_orders: u64,
}

/// Per-day integer accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayTally {
    pub count: u64,
    pub revenue_minor: i64,
}

impl StatsTally {
    /// Convert to presentation precision.
    #[must_use]
    pub fn finish(
        self,
        window_start: Option<DateTime<Utc>>,
        reporting_time_zone: String,
    ) -> StatsWindow {
        StatsWindow {
            total_orders: self.total_orders,
            revenue_total: to_major_units(self.revenue_minor),
            average_order_value: average_order_value(self.revenue_minor, self.total_orders),
            status_counts: self.status_counts,
            payment_status_counts: self.payment_status_counts,
            daily_buckets: self
                .daily
                .into_iter()
                .map(|(day, tally)| {
                    (
                        day,
                        DailyBucket {
                            count: tally.count,
                            revenue: to_major_units(tally.revenue_minor),
                        },
                    )
                })
                .collect(),
            recent_orders: self.recent_orders,
            window_start,
            reporting_time_zone,
        }
    }
}

/// Mean order value at two decimals, rounding half away from zero.
#[must_use]
pub fn average_order_value(revenue_minor: i64, total_orders: u64) -> Decimal {
    if total_orders == 0 {
        return to_major_units(0);
    }
    let mean = to_major_units(revenue_minor) / Decimal::from(total_orders);
    let mut rounded =
        mean.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MINOR_UNIT_SCALE);
    rounded
}
