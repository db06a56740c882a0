use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{ActiveRedirectSelector, HitStatistics};
use crate::error::StatsResult;
use crate::models::{CrawlerHits, DailyHits, HitEvent, MonthlyHits, RedirectHits};

/// Every dashboard figure for one reference instant
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub total_served: i64,
    pub total_this_month: i64,
    pub total_last_month: i64,
    pub total_active_redirects: usize,
    /// Number of active redirects per status code
    pub active_by_status: BTreeMap<i32, usize>,
    pub human_hits_per_day: Vec<DailyHits>,
    pub crawler_hits_per_day: Vec<DailyHits>,
    pub hits_per_month: Vec<MonthlyHits>,
    pub top_crawlers: Vec<CrawlerHits>,
    pub top_redirects: Vec<RedirectHits>,
    pub latest_hit: Option<HitEvent>,
}

impl StatisticsSnapshot {
    pub async fn collect(
        stats: &HitStatistics,
        selector: &ActiveRedirectSelector,
        now: DateTime<Utc>,
        top_redirects_limit: i64,
    ) -> StatsResult<Self> {
        let (
            total_served,
            total_this_month,
            total_last_month,
            active,
            human_hits_per_day,
            crawler_hits_per_day,
            hits_per_month,
            top_crawlers,
            top_redirects,
            latest_hit,
        ) = tokio::try_join!(
            stats.total_served(),
            stats.total_this_month(now),
            stats.total_last_month(now),
            selector.active_redirects(now),
            stats.hits_per_day(now, false),
            stats.hits_per_day(now, true),
            stats.hits_per_month(now),
            stats.top_crawlers(now),
            stats.top_redirects(now, top_redirects_limit),
            stats.latest_hit(),
        )?;

        let active_by_status: BTreeMap<i32, usize> = active
            .iter()
            .map(|(status, redirects)| (*status, redirects.len()))
            .collect();

        Ok(Self {
            generated_at: now,
            total_served,
            total_this_month,
            total_last_month,
            total_active_redirects: active_by_status.values().sum(),
            active_by_status,
            human_hits_per_day,
            crawler_hits_per_day,
            hits_per_month,
            top_crawlers,
            top_redirects,
            latest_hit,
        })
    }
}
