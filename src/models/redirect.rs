use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Redirect {
    pub id: i64,
    pub from_url: String,
    pub to_url: String,
    pub status_code: i32,
    pub enabled: bool,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub hits: i64,
    /// Unix timestamp of the most recent traversal
    pub last_used_at: Option<i64>,
}

impl Redirect {
    /// Whether `date` falls inside the activation window. Both bounds are
    /// inclusive and a missing bound is open on that side. The `enabled`
    /// flag is not considered here.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        let started = self.active_from.map_or(true, |from| from <= date);
        let not_ended = self.active_to.map_or(true, |to| to >= date);
        started && not_ended
    }
}

/// Payload used by the configuration side to register a redirect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRedirect {
    pub from_url: String,
    pub to_url: String,
    pub status_code: i32,
    pub enabled: bool,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
}

impl NewRedirect {
    pub fn new(from_url: impl Into<String>, to_url: impl Into<String>, status_code: i32) -> Self {
        Self {
            from_url: from_url.into(),
            to_url: to_url.into(),
            status_code,
            enabled: true,
            active_from: None,
            active_to: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn active_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.active_from = from;
        self.active_to = to;
        self
    }
}
