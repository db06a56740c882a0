use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::calendar::Calendar;
use crate::error::StatsResult;
use crate::models::Redirect;
use crate::storage::Storage;

/// Selects the redirects that are enabled and inside their activation window
pub struct ActiveRedirectSelector {
    storage: Arc<dyn Storage>,
    calendar: Calendar,
}

impl ActiveRedirectSelector {
    pub fn new(storage: Arc<dyn Storage>, calendar: Calendar) -> Self {
        Self { storage, calendar }
    }

    async fn active_set(&self, now: DateTime<Utc>) -> StatsResult<Vec<Redirect>> {
        let today = self.calendar.local_date(now);
        let redirects = self.storage.enabled_redirects().await?;

        Ok(redirects
            .into_iter()
            .filter(|redirect| redirect.enabled && redirect.is_active_on(today))
            .collect())
    }

    /// Active redirects keyed by status code. Each group keeps id order.
    pub async fn active_redirects(
        &self,
        now: DateTime<Utc>,
    ) -> StatsResult<BTreeMap<i32, Vec<Redirect>>> {
        let mut grouped: BTreeMap<i32, Vec<Redirect>> = BTreeMap::new();

        for redirect in self.active_set(now).await? {
            grouped
                .entry(redirect.status_code)
                .or_default()
                .push(redirect);
        }

        Ok(grouped)
    }

    pub async fn total_active_redirects(&self, now: DateTime<Utc>) -> StatsResult<usize> {
        Ok(self.active_set(now).await?.len())
    }
}
