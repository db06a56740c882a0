use crate::models::{
    CrawlerHits, DailyHits, HitEvent, MonthlyHits, NewHit, NewRedirect, Redirect, RedirectHits,
};
use crate::storage::Storage;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

const REDIRECT_COLUMNS: &str =
    "id, from_url, to_url, status_code, enabled, active_from, active_to, hits, last_used_at";

const HIT_COLUMNS: &str = "id, redirect_id, hit_at, day, month, year, crawler_name";

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    /// `sqlite::memory:` databases live per connection, so use a single
    /// connection for them.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS redirects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_url TEXT NOT NULL,
                to_url TEXT NOT NULL,
                status_code INTEGER NOT NULL DEFAULT 301,
                enabled INTEGER NOT NULL DEFAULT 1,
                active_from TEXT,
                active_to TEXT,
                hits INTEGER NOT NULL DEFAULT 0,
                last_used_at INTEGER
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        // No foreign key on redirect_id: events outlive deleted redirects
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                redirect_id INTEGER NOT NULL,
                hit_at INTEGER NOT NULL,
                day INTEGER NOT NULL,
                month INTEGER NOT NULL,
                year INTEGER NOT NULL,
                crawler_name TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_hit_events_period ON hit_events(year, month)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_hit_events_redirect ON hit_events(redirect_id, hit_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_hit_events_crawler ON hit_events(crawler_name)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn insert_redirect(&self, redirect: &NewRedirect) -> Result<Redirect> {
        let result = sqlx::query(
            r#"
            INSERT INTO redirects (from_url, to_url, status_code, enabled, active_from, active_to)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&redirect.from_url)
        .bind(&redirect.to_url)
        .bind(redirect.status_code)
        .bind(redirect.enabled)
        .bind(redirect.active_from)
        .bind(redirect.active_to)
        .execute(self.pool.as_ref())
        .await?;

        let row = sqlx::query_as::<_, Redirect>(&format!(
            "SELECT {REDIRECT_COLUMNS} FROM redirects WHERE id = ?"
        ))
        .bind(result.last_insert_rowid())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn get_redirect(&self, id: i64) -> Result<Option<Redirect>> {
        let redirect = sqlx::query_as::<_, Redirect>(&format!(
            "SELECT {REDIRECT_COLUMNS} FROM redirects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(redirect)
    }

    async fn delete_redirect(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM redirects WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn enabled_redirects(&self) -> Result<Vec<Redirect>> {
        let redirects = sqlx::query_as::<_, Redirect>(&format!(
            "SELECT {REDIRECT_COLUMNS} FROM redirects WHERE enabled = 1 ORDER BY id ASC"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(redirects)
    }

    async fn record_hit(&self, hit: &NewHit) -> Result<Option<HitEvent>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE redirects
            SET hits = hits + 1,
                last_used_at = CASE
                    WHEN last_used_at IS NULL OR last_used_at < ? THEN ?
                    ELSE last_used_at
                END
            WHERE id = ?
            "#,
        )
        .bind(hit.timestamp)
        .bind(hit.timestamp)
        .bind(hit.redirect_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO hit_events (redirect_id, hit_at, day, month, year, crawler_name)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(hit.redirect_id)
        .bind(hit.timestamp)
        .bind(hit.day)
        .bind(hit.month)
        .bind(hit.year)
        .bind(hit.crawler_name.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(hit.clone().into_event(inserted.last_insert_rowid())))
    }

    async fn count_hits(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM hit_events")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn count_hits_in_month(&self, month: i32, year: i32) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(id) FROM hit_events WHERE month = ? AND year = ?",
        )
        .bind(month)
        .bind(year)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn latest_hit(&self) -> Result<Option<HitEvent>> {
        let event = sqlx::query_as::<_, HitEvent>(&format!(
            "SELECT {HIT_COLUMNS} FROM hit_events ORDER BY hit_at DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(event)
    }

    async fn hits_per_day(&self, crawlers: bool, limit: i64) -> Result<Vec<DailyHits>> {
        let crawler_filter = if crawlers {
            "crawler_name IS NOT NULL"
        } else {
            "crawler_name IS NULL"
        };

        let rows = sqlx::query_as::<_, DailyHits>(&format!(
            r#"
            SELECT day, month, year, hits FROM (
                SELECT day, month, year, COUNT(id) AS hits
                FROM hit_events
                WHERE {crawler_filter}
                GROUP BY year, month, day
                ORDER BY year DESC, month DESC, day DESC
                LIMIT ?
            ) AS recent
            ORDER BY year ASC, month ASC, day ASC
            "#
        ))
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn daily_counts_for_redirect(&self, redirect_id: i64, since: i64) -> Result<Vec<i64>> {
        let counts = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(id) AS hits
            FROM hit_events
            WHERE redirect_id = ? AND hit_at >= ?
            GROUP BY year, month, day
            ORDER BY year ASC, month ASC, day ASC
            "#,
        )
        .bind(redirect_id)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(counts)
    }

    async fn hits_per_month(&self, limit: i64) -> Result<Vec<MonthlyHits>> {
        let rows = sqlx::query_as::<_, MonthlyHits>(
            r#"
            SELECT month, year, COUNT(id) AS hits
            FROM hit_events
            GROUP BY year, month
            ORDER BY year DESC, month DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn top_crawlers(&self, month: i32, year: i32, limit: i64) -> Result<Vec<CrawlerHits>> {
        // MIN(id) keeps ties in first-seen order
        let rows = sqlx::query_as::<_, CrawlerHits>(
            r#"
            SELECT crawler_name, COUNT(id) AS hits
            FROM hit_events
            WHERE crawler_name IS NOT NULL AND month = ? AND year = ?
            GROUP BY crawler_name
            ORDER BY hits DESC, MIN(id) ASC
            LIMIT ?
            "#,
        )
        .bind(month)
        .bind(year)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn top_redirects(&self, month: i32, year: i32, limit: i64) -> Result<Vec<RedirectHits>> {
        let rows = sqlx::query_as::<_, RedirectHits>(
            r#"
            SELECT e.redirect_id AS redirect_id, r.from_url AS from_url, COUNT(e.id) AS hits
            FROM hit_events e
            INNER JOIN redirects r ON r.id = e.redirect_id
            WHERE e.month = ? AND e.year = ?
            GROUP BY e.redirect_id, r.from_url
            ORDER BY hits DESC, MIN(e.id) ASC
            LIMIT ?
            "#,
        )
        .bind(month)
        .bind(year)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}
