use crate::models::{
    CrawlerHits, DailyHits, HitEvent, MonthlyHits, NewHit, NewRedirect, Redirect, RedirectHits,
};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Register a redirect. Used by the configuration side, not by the hit path.
    async fn insert_redirect(&self, redirect: &NewRedirect) -> Result<Redirect>;

    /// Get a redirect by id
    async fn get_redirect(&self, id: i64) -> Result<Option<Redirect>>;

    /// Delete a redirect. Its hit events are left in place.
    async fn delete_redirect(&self, id: i64) -> Result<bool>;

    /// All enabled redirects, in id order
    async fn enabled_redirects(&self) -> Result<Vec<Redirect>>;

    /// Apply `hits = hits + 1`, move `last_used_at` forward and append the
    /// event, all in one transaction. Returns `None` without writing anything
    /// when the redirect does not exist.
    async fn record_hit(&self, hit: &NewHit) -> Result<Option<HitEvent>>;

    /// Count of all hit events
    async fn count_hits(&self) -> Result<i64>;

    /// Count of hit events in the given calendar month
    async fn count_hits_in_month(&self, month: i32, year: i32) -> Result<i64>;

    /// Most recent hit event
    async fn latest_hit(&self) -> Result<Option<HitEvent>>;

    /// The `limit` most recent populated days, oldest first.
    /// `crawlers` selects crawler traffic when true and human traffic otherwise.
    async fn hits_per_day(&self, crawlers: bool, limit: i64) -> Result<Vec<DailyHits>>;

    /// Per-day counts for one redirect since `since`, oldest first
    async fn daily_counts_for_redirect(&self, redirect_id: i64, since: i64) -> Result<Vec<i64>>;

    /// The `limit` most recent populated months, newest first
    async fn hits_per_month(&self, limit: i64) -> Result<Vec<MonthlyHits>>;

    /// Crawlers by hit count within one calendar month
    async fn top_crawlers(&self, month: i32, year: i32, limit: i64) -> Result<Vec<CrawlerHits>>;

    /// Existing redirects by hit count within one calendar month
    async fn top_redirects(&self, month: i32, year: i32, limit: i64) -> Result<Vec<RedirectHits>>;
}
