//! Crawler classification of visitor user agents
//!
//! Classification is a pure function of the user-agent string, so any
//! [`Classifier`] can be wrapped in a [`CachedClassifier`].

mod cached;
mod signature;

pub use cached::CachedClassifier;
pub use signature::SignatureClassifier;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Classification {
    Human,
    Crawler { name: String },
}

impl Classification {
    pub fn is_crawler(&self) -> bool {
        matches!(self, Classification::Crawler { .. })
    }

    pub fn crawler_name(&self) -> Option<&str> {
        match self {
            Classification::Human => None,
            Classification::Crawler { name } => Some(name),
        }
    }

    pub fn into_crawler_name(self) -> Option<String> {
        match self {
            Classification::Human => None,
            Classification::Crawler { name } => Some(name),
        }
    }
}

pub trait Classifier: Send + Sync {
    /// Never fails: unrecognized, empty or malformed input is human traffic.
    fn classify(&self, user_agent: &str) -> Classification;
}
