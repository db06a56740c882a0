use moka::sync::Cache;

use super::{Classification, Classifier};

/// User agents longer than this bypass the cache
const MAX_CACHED_USER_AGENT_LEN: usize = 512;

/// Memoizes the results of another classifier
pub struct CachedClassifier<C> {
    inner: C,
    cache: Cache<String, Classification>,
}

impl<C: Classifier> CachedClassifier<C> {
    pub fn new(inner: C, max_entries: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_entries),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Classifier> Classifier for CachedClassifier<C> {
    fn classify(&self, user_agent: &str) -> Classification {
        if user_agent.len() > MAX_CACHED_USER_AGENT_LEN {
            return self.inner.classify(user_agent);
        }

        self.cache
            .get_with(user_agent.to_string(), || self.inner.classify(user_agent))
    }
}
