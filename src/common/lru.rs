use std::time::Instant;

use parking_lot::Mutex;

/// TTL-bounded LRU over raw TXT answers, used by `DnssecResolver` only.
/// Expired entries are evicted on access.
pub(crate) struct TxtCache {
    inner: Mutex<lru_cache::LruCache<String, CachedTxt, ahash::RandomState>>,
}

struct CachedTxt {
    answers: Vec<String>,
    valid_until: Instant,
}

impl TxtCache {
    pub fn with_capacity(capacity: usize) -> Self {
        TxtCache {
            inner: Mutex::new(lru_cache::LruCache::with_hasher(
                capacity,
                ahash::RandomState::new(),
            )),
        }
    }

    pub fn get(&self, name: &str) -> Option<Vec<String>> {
        let mut cache = self.inner.lock();
        let entry = cache.get_mut(name)?;
        if entry.valid_until >= Instant::now() {
            entry.answers.clone().into()
        } else {
            cache.remove(name);
            None
        }
    }

    pub fn insert(&self, name: String, answers: Vec<String>, valid_until: Instant) -> Vec<String> {
        self.inner.lock().insert(
            name,
            CachedTxt {
                answers: answers.clone(),
                valid_until,
            },
        );
        answers
    }
}
