//! Sales statistics over the order table.
//!
//! The constituent reads (totals, breakdowns, rollup rows, recent count) are
//! separate statements without a shared snapshot. Under concurrent writes
//! they may disagree by the orders committed in between; callers accept that
//! skew.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::db::{OrderRepository, RepositoryError};
use crate::models::StatsWindow;
use crate::models::stats::{DayTally, StatsTally};

/// Width of the rolling `recentOrders` window.
pub const RECENT_WINDOW: TimeDelta = TimeDelta::hours(24);

/// Which orders a statistics request covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum StatsRange {
    /// The 24 hours before the request.
    #[serde(rename = "24h")]
    Last24Hours,
    /// Today and the 6 calendar days before it.
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    /// Every order ever recorded.
    #[default]
    #[serde(rename = "all")]
    All,
}

#[derive(Debug, Error)]
#[error("unknown stats range '{0}' (expected 24h, 7d, 30d, 90d or all)")]
pub struct UnknownRange(String);

impl FromStr for StatsRange {
    type Err = UnknownRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" | "1d" => Ok(Self::Last24Hours),
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            "all" | "" => Ok(Self::All),
            other => Err(UnknownRange(other.to_string())),
        }
    }
}

impl StatsRange {
    const fn calendar_days(self) -> Option<u64> {
        match self {
            Self::Last7Days => Some(7),
            Self::Last30Days => Some(30),
            Self::Last90Days => Some(90),
            Self::Last24Hours | Self::All => None,
        }
    }

    /// Inclusive lower bound on `created_at`, or `None` for all time.
    ///
    /// Day ranges start at local midnight in `tz`, so the first daily bucket
    /// is a whole day.
    #[must_use]
    pub fn window_start(self, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        match self {
            Self::All => None,
            Self::Last24Hours => Some(now - RECENT_WINDOW),
            days => {
                let today = now.with_timezone(&tz).date_naive();
                let back = days.calendar_days().unwrap_or(1).saturating_sub(1);
                let first = today.checked_sub_days(Days::new(back)).unwrap_or(today);
                Some(local_midnight(first, tz))
            }
        }
    }
}

/// The first instant of `day` in `tz`.
fn local_midnight(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        // Midnight skipped by a DST jump: the day starts at the jump.
        .or_else(|| {
            tz.from_local_datetime(&(naive + TimeDelta::hours(1)))
                .earliest()
        })
        .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
}

/// Computes [`StatsWindow`]s in a fixed reporting time zone.
#[derive(Clone)]
pub struct StatsAggregator {
    orders: Arc<dyn OrderRepository>,
    tz: Tz,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>, tz: Tz) -> Self {
        Self { orders, tz }
    }

    /// The zone daily buckets are cut in.
    #[must_use]
    pub const fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Compute statistics for `range` as of `now`.
    ///
    /// `recent_orders` always covers the 24 hours before `now`, while daily
    /// buckets follow calendar days; the two can disagree about an order
    /// placed yesterday evening.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any read fails.
    #[instrument(skip(self), fields(tz = %self.tz))]
    pub async fn compute(
        &self,
        range: StatsRange,
        now: DateTime<Utc>,
    ) -> Result<StatsWindow, RepositoryError> {
        let since = range.window_start(now, self.tz);

        let totals = self.orders.totals(since).await?;
        let status_counts = self.orders.order_status_counts(since).await?;
        let payment_status_counts = self.orders.payment_status_counts(since).await?;
        let snapshots = self.orders.snapshots(since).await?;
        let recent_orders = self.orders.count_created_since(now - RECENT_WINDOW).await?;

        let mut tally = StatsTally {
            total_orders: totals.total_orders,
            revenue_minor: totals.paid_revenue,
            status_counts: status_counts.into_iter().collect(),
            payment_status_counts: payment_status_counts.into_iter().collect(),
            recent_orders,
            ..StatsTally::default()
        };

        if let Some(start) = since {
            let mut day = start.with_timezone(&self.tz).date_naive();
            let last = now.with_timezone(&self.tz).date_naive();
            while day <= last {
                tally.daily.insert(day, DayTally::default());
                match day.succ_opt() {
                    Some(next) => day = next,
                    None => break,
                }
            }
        }

        for snapshot in snapshots {
            let day = snapshot.created_at.with_timezone(&self.tz).date_naive();
            let bucket = tally.daily.entry(day).or_default();
            bucket.count += 1;
            if snapshot.payment_status.counts_as_revenue() {
                bucket.revenue_minor = bucket.revenue_minor.saturating_add(snapshot.total_amount);
            }
        }

        tracing::debug!(
            total_orders = tally.total_orders,
            days = tally.daily.len(),
            "Stats computed"
        );

        Ok(tally.finish(since, self.tz.name().to_string()))
    }
}
