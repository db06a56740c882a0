use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::calendar::Calendar;
use crate::classifier::Classifier;
use crate::error::StatsResult;
use crate::models::{HitEvent, NewHit};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitOutcome {
    Recorded(HitEvent),
    /// The redirect does not exist (anymore); nothing was written
    UnknownRedirect,
}

impl HitOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, HitOutcome::Recorded(_))
    }
}

/// Records redirect traversals
pub struct HitRecorder {
    storage: Arc<dyn Storage>,
    classifier: Arc<dyn Classifier>,
    calendar: Calendar,
}

impl HitRecorder {
    pub fn new(
        storage: Arc<dyn Storage>,
        classifier: Arc<dyn Classifier>,
        calendar: Calendar,
    ) -> Self {
        Self {
            storage,
            classifier,
            calendar,
        }
    }

    /// Count one traversal of `redirect_id` at `now`.
    ///
    /// The counter update and the event append are committed together.
    /// An unknown redirect is not an error: the call returns
    /// [`HitOutcome::UnknownRedirect`] so the request path keeps going.
    /// Storage failures are always returned to the caller.
    pub async fn record_hit(
        &self,
        redirect_id: i64,
        user_agent: &str,
        now: DateTime<Utc>,
    ) -> StatsResult<HitOutcome> {
        let classification = self.classifier.classify(user_agent);
        let parts = self.calendar.parts(now);

        let hit = NewHit {
            redirect_id,
            timestamp: now.timestamp(),
            day: parts.day,
            month: parts.month,
            year: parts.year,
            crawler_name: classification.into_crawler_name(),
        };

        match self.storage.record_hit(&hit).await? {
            Some(event) => {
                debug!(
                    redirect_id,
                    event_id = event.id,
                    crawler = event.crawler_name.as_deref().unwrap_or("-"),
                    "recorded redirect hit"
                );
                Ok(HitOutcome::Recorded(event))
            }
            None => {
                debug!(redirect_id, "ignoring hit for unknown redirect");
                Ok(HitOutcome::UnknownRedirect)
            }
        }
    }
}
