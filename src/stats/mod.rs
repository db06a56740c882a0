//! Reporting queries over the hit log
//!
//! Every query takes the reference instant from the caller. "This month" and
//! "last month" are calendar months in the service time zone.

mod active;
mod snapshot;

pub use active::ActiveRedirectSelector;
pub use snapshot::StatisticsSnapshot;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::calendar::Calendar;
use crate::error::{StatsError, StatsResult};
use crate::models::{CrawlerHits, DailyHits, HitEvent, MonthlyHits, RedirectHits};
use crate::storage::Storage;

/// Number of daily buckets returned by [`HitStatistics::hits_per_day`]
pub const DAILY_BUCKETS: i64 = 365;
/// Number of monthly buckets returned by [`HitStatistics::hits_per_month`]
pub const MONTHLY_BUCKETS: i64 = 12;
pub const TOP_CRAWLERS: i64 = 10;
pub const DEFAULT_TOP_REDIRECTS: i64 = 10;
/// Look-back window of a sparkline, in calendar months
pub const SPARKLINE_MONTHS: u32 = 1;

pub struct HitStatistics {
    storage: Arc<dyn Storage>,
    calendar: Calendar,
}

impl HitStatistics {
    pub fn new(storage: Arc<dyn Storage>, calendar: Calendar) -> Self {
        Self { storage, calendar }
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Every hit ever recorded
    pub async fn total_served(&self) -> StatsResult<i64> {
        Ok(self.storage.count_hits().await?)
    }

    pub async fn total_this_month(&self, now: DateTime<Utc>) -> StatsResult<i64> {
        let parts = self.calendar.parts(now);
        Ok(self
            .storage
            .count_hits_in_month(parts.month, parts.year)
            .await?)
    }

    /// Hits in the calendar month before the one containing `now`
    pub async fn total_last_month(&self, now: DateTime<Utc>) -> StatsResult<i64> {
        let previous = self.calendar.previous_month(now);
        Ok(self
            .storage
            .count_hits_in_month(previous.month, previous.year)
            .await?)
    }

    /// Daily human (`is_crawler == false`) or crawler hit counts.
    ///
    /// Only populated days are returned: the most recent [`DAILY_BUCKETS`]
    /// in the whole log, oldest first. `now` does not bound the series.
    pub async fn hits_per_day(
        &self,
        _now: DateTime<Utc>,
        is_crawler: bool,
    ) -> StatsResult<Vec<DailyHits>> {
        Ok(self
            .storage
            .hits_per_day(is_crawler, DAILY_BUCKETS)
            .await?)
    }

    /// Per-day hit counts of one redirect over the last month, oldest first.
    /// Days without hits are skipped.
    pub async fn sparkline(&self, redirect_id: i64, now: DateTime<Utc>) -> StatsResult<Vec<i64>> {
        let since = self.calendar.months_before(now, SPARKLINE_MONTHS);
        Ok(self
            .storage
            .daily_counts_for_redirect(redirect_id, since.timestamp())
            .await?)
    }

    /// The most recent [`MONTHLY_BUCKETS`] populated months of the whole log,
    /// newest first
    pub async fn hits_per_month(&self, _now: DateTime<Utc>) -> StatsResult<Vec<MonthlyHits>> {
        Ok(self.storage.hits_per_month(MONTHLY_BUCKETS).await?)
    }

    pub async fn top_crawlers(&self, now: DateTime<Utc>) -> StatsResult<Vec<CrawlerHits>> {
        let parts = self.calendar.parts(now);
        Ok(self
            .storage
            .top_crawlers(parts.month, parts.year, TOP_CRAWLERS)
            .await?)
    }

    /// Redirects with the most hits in the current month. Hits of deleted
    /// redirects are left out.
    pub async fn top_redirects(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> StatsResult<Vec<RedirectHits>> {
        if limit < 0 {
            return Err(StatsError::InvalidInput(format!(
                "limit must not be negative, got {limit}"
            )));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let parts = self.calendar.parts(now);
        Ok(self
            .storage
            .top_redirects(parts.month, parts.year, limit)
            .await?)
    }

    pub async fn latest_hit(&self) -> StatsResult<Option<HitEvent>> {
        Ok(self.storage.latest_hit().await?)
    }
}
