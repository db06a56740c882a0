//! Hit recorder integration tests
//!
//! These tests verify counter updates, event appends, crawler tagging and
//! the silent handling of unknown redirects against SQLite stores.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use redirect_hits::models::{
    CrawlerHits, DailyHits, HitEvent, MonthlyHits, NewHit, NewRedirect, Redirect, RedirectHits,
};
use redirect_hits::storage::{SqliteStorage, Storage};
use redirect_hits::{Calendar, HitOutcome, HitRecorder, SignatureClassifier, StatsError};
use std::sync::Arc;
use tempfile::TempDir;

const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn create_recorder(storage: &Arc<dyn Storage>, calendar: Calendar) -> HitRecorder {
    HitRecorder::new(
        Arc::clone(storage),
        Arc::new(SignatureClassifier::new()),
        calendar,
    )
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

async fn create_redirect(storage: &Arc<dyn Storage>) -> Redirect {
    storage
        .insert_redirect(&NewRedirect::new("/old", "/new", 301))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_record_hit_increments_counter() {
    let storage = create_test_storage().await;
    let recorder = create_recorder(&storage, Calendar::utc());
    let redirect = create_redirect(&storage).await;
    assert_eq!(redirect.hits, 0);
    assert_eq!(redirect.last_used_at, None);

    let now = at(2024, 1, 5, 10);
    let outcome = recorder.record_hit(redirect.id, CHROME, now).await.unwrap();

    match outcome {
        HitOutcome::Recorded(event) => {
            assert_eq!(event.redirect_id, redirect.id);
            assert_eq!(event.timestamp, now.timestamp());
            assert_eq!((event.day, event.month, event.year), (5, 1, 2024));
            assert_eq!(event.crawler_name, None);
        }
        HitOutcome::UnknownRedirect => panic!("redirect should exist"),
    }

    let reloaded = storage.get_redirect(redirect.id).await.unwrap().unwrap();
    assert_eq!(reloaded.hits, 1);
    assert_eq!(reloaded.last_used_at, Some(now.timestamp()));
    assert_eq!(storage.count_hits().await.unwrap(), 1);
}

#[tokio::test]
async fn test_record_hit_tags_crawlers() {
    let storage = create_test_storage().await;
    let recorder = create_recorder(&storage, Calendar::utc());
    let redirect = create_redirect(&storage).await;

    recorder
        .record_hit(redirect.id, GOOGLEBOT, at(2024, 1, 5, 10))
        .await
        .unwrap();

    let latest = storage.latest_hit().await.unwrap().unwrap();
    assert_eq!(latest.crawler_name.as_deref(), Some("Googlebot"));
    assert!(latest.is_crawler());
}

#[tokio::test]
async fn test_empty_user_agent_is_stored_as_human() {
    let storage = create_test_storage().await;
    let recorder = create_recorder(&storage, Calendar::utc());
    let redirect = create_redirect(&storage).await;

    recorder
        .record_hit(redirect.id, "", at(2024, 1, 5, 10))
        .await
        .unwrap();

    let latest = storage.latest_hit().await.unwrap().unwrap();
    assert_eq!(latest.crawler_name, None);
}

#[tokio::test]
async fn test_unknown_redirect_is_silent_noop() {
    let storage = create_test_storage().await;
    let recorder = create_recorder(&storage, Calendar::utc());

    let outcome = recorder
        .record_hit(9999, CHROME, at(2024, 1, 5, 10))
        .await
        .unwrap();

    assert_eq!(outcome, HitOutcome::UnknownRedirect);
    assert_eq!(storage.count_hits().await.unwrap(), 0);
    assert!(storage.latest_hit().await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleted_redirect_stops_counting() {
    let storage = create_test_storage().await;
    let recorder = create_recorder(&storage, Calendar::utc());
    let redirect = create_redirect(&storage).await;

    assert!(recorder
        .record_hit(redirect.id, CHROME, at(2024, 1, 5, 10))
        .await
        .unwrap()
        .is_recorded());

    assert!(storage.delete_redirect(redirect.id).await.unwrap());

    let outcome = recorder
        .record_hit(redirect.id, CHROME, at(2024, 1, 5, 11))
        .await
        .unwrap();
    assert_eq!(outcome, HitOutcome::UnknownRedirect);

    // The earlier event survives the redirect
    assert_eq!(storage.count_hits().await.unwrap(), 1);
}

/// Pooled file-backed store, so concurrent hits really run on separate
/// connections
async fn create_pooled_storage(dir: &TempDir) -> Arc<dyn Storage> {
    let url = format!("sqlite://{}", dir.path().join("hits.db").display());
    let storage = SqliteStorage::new(&url, 8).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_hits_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let storage = create_pooled_storage(&dir).await;
    let recorder = Arc::new(create_recorder(&storage, Calendar::utc()));
    let redirect = create_redirect(&storage).await;

    let mut handles = vec![];

    for i in 0..200 {
        let recorder = Arc::clone(&recorder);
        let id = redirect.id;
        handles.push(tokio::spawn(async move {
            let ua = if i % 5 == 0 { GOOGLEBOT } else { CHROME };
            recorder.record_hit(id, ua, at(2024, 1, 5, 10)).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_recorded());
    }

    let reloaded = storage.get_redirect(redirect.id).await.unwrap().unwrap();
    assert_eq!(reloaded.hits, 200);
    assert_eq!(storage.count_hits().await.unwrap(), 200);
}

#[tokio::test]
async fn test_last_used_at_only_moves_forward() {
    let storage = create_test_storage().await;
    let recorder = create_recorder(&storage, Calendar::utc());
    let redirect = create_redirect(&storage).await;

    let later = at(2024, 1, 6, 10);
    let earlier = at(2024, 1, 5, 10);

    recorder.record_hit(redirect.id, CHROME, later).await.unwrap();
    recorder.record_hit(redirect.id, CHROME, earlier).await.unwrap();

    let reloaded = storage.get_redirect(redirect.id).await.unwrap().unwrap();
    assert_eq!(reloaded.hits, 2);
    assert_eq!(reloaded.last_used_at, Some(later.timestamp()));
}

#[tokio::test]
async fn test_calendar_parts_use_configured_timezone() {
    let storage = create_test_storage().await;
    let recorder = create_recorder(&storage, Calendar::new(Tz::Europe__Amsterdam));
    let redirect = create_redirect(&storage).await;

    let now = Utc.with_ymd_and_hms(2024, 1, 31, 23, 30, 0).unwrap();
    let outcome = recorder.record_hit(redirect.id, CHROME, now).await.unwrap();

    let HitOutcome::Recorded(event) = outcome else {
        panic!("redirect should exist");
    };
    assert_eq!((event.day, event.month, event.year), (1, 2, 2024));

    let stored = storage.latest_hit().await.unwrap().unwrap();
    assert_eq!(stored, event);
}

/// Storage whose every operation fails, standing in for an unreachable database
struct UnavailableStorage;

#[async_trait]
impl Storage for UnavailableStorage {
    async fn init(&self) -> Result<()> {
        bail!("database unavailable")
    }

    async fn insert_redirect(&self, _redirect: &NewRedirect) -> Result<Redirect> {
        bail!("database unavailable")
    }

    async fn get_redirect(&self, _id: i64) -> Result<Option<Redirect>> {
        bail!("database unavailable")
    }

    async fn delete_redirect(&self, _id: i64) -> Result<bool> {
        bail!("database unavailable")
    }

    async fn enabled_redirects(&self) -> Result<Vec<Redirect>> {
        bail!("database unavailable")
    }

    async fn record_hit(&self, _hit: &NewHit) -> Result<Option<HitEvent>> {
        bail!("database unavailable")
    }

    async fn count_hits(&self) -> Result<i64> {
        bail!("database unavailable")
    }

    async fn count_hits_in_month(&self, _month: i32, _year: i32) -> Result<i64> {
        bail!("database unavailable")
    }

    async fn latest_hit(&self) -> Result<Option<HitEvent>> {
        bail!("database unavailable")
    }

    async fn hits_per_day(&self, _crawlers: bool, _limit: i64) -> Result<Vec<DailyHits>> {
        bail!("database unavailable")
    }

    async fn daily_counts_for_redirect(&self, _redirect_id: i64, _since: i64) -> Result<Vec<i64>> {
        bail!("database unavailable")
    }

    async fn hits_per_month(&self, _limit: i64) -> Result<Vec<MonthlyHits>> {
        bail!("database unavailable")
    }

    async fn top_crawlers(&self, _month: i32, _year: i32, _limit: i64) -> Result<Vec<CrawlerHits>> {
        bail!("database unavailable")
    }

    async fn top_redirects(&self, _month: i32, _year: i32, _limit: i64) -> Result<Vec<RedirectHits>> {
        bail!("database unavailable")
    }
}

#[tokio::test]
async fn test_storage_failure_is_propagated() {
    let storage: Arc<dyn Storage> = Arc::new(UnavailableStorage);
    let recorder = create_recorder(&storage, Calendar::utc());

    let result = recorder.record_hit(1, CHROME, at(2024, 1, 5, 10)).await;

    match result {
        Err(StatsError::Storage(err)) => assert!(err.to_string().contains("unavailable")),
        other => panic!("expected storage error, got {:?}", other),
    }
}
