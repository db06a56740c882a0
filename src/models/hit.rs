use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One traversal of a redirect. Written once by the hit recorder and never
/// updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HitEvent {
    pub id: i64,
    /// May point at a redirect that no longer exists
    pub redirect_id: i64,
    /// Unix timestamp (UTC) of the traversal
    #[sqlx(rename = "hit_at")]
    pub timestamp: i64,
    /// Calendar parts of `timestamp` in the service time zone, fixed at write time
    pub day: i32,
    pub month: i32,
    pub year: i32,
    /// `None` for human traffic
    pub crawler_name: Option<String>,
}

impl HitEvent {
    pub fn is_crawler(&self) -> bool {
        self.crawler_name.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyHits {
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub hits: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MonthlyHits {
    pub month: i32,
    pub year: i32,
    pub hits: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CrawlerHits {
    pub crawler_name: String,
    pub hits: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RedirectHits {
    pub redirect_id: i64,
    pub from_url: String,
    pub hits: i64,
}

/// A hit ready to be appended, with its calendar parts already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHit {
    pub redirect_id: i64,
    pub timestamp: i64,
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub crawler_name: Option<String>,
}

impl NewHit {
    pub(crate) fn into_event(self, id: i64) -> HitEvent {
        HitEvent {
            id,
            redirect_id: self.redirect_id,
            timestamp: self.timestamp,
            day: self.day,
            month: self.month,
            year: self.year,
            crawler_name: self.crawler_name,
        }
    }
}
