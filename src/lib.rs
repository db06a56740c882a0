pub mod calendar;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod recorder;
pub mod stats;
pub mod storage;

pub use calendar::{Calendar, CalendarParts};
pub use classifier::{CachedClassifier, Classification, Classifier, SignatureClassifier};
pub use error::{StatsError, StatsResult};
pub use recorder::{HitOutcome, HitRecorder};
pub use stats::{ActiveRedirectSelector, HitStatistics, StatisticsSnapshot};
