//! # Store Abstraction
//!
//! The dispatch core depends on an opaque key-value collaborator with two
//! access planes: a durable plane (`get`/`set`) whose failures surface as
//! hard errors, and a cache plane (`cache_get`/`cache_set`) that degrades to
//! a miss or a no-op so a cache outage never fails an otherwise-valid
//! request.
//!
//! The [`Store`] trait is object-safe and shared across in-flight requests
//! behind an `Arc`; implementors must be safe for concurrent use. Network
//! backends wrap their durable operations in a bounded [`Retry`] policy;
//! the bundled [`InMemoryStore`] needs none.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::errors::StoreError;

/// Trait defining the key-value collaborator used by the method handlers.
///
/// All methods take `&self`; implementors synchronize internally so a single
/// instance can serve concurrent requests.
pub trait Store: Send + Sync {
    /// Reads a durable value. Exhausted retries surface a [`StoreError`].
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a durable value. Exhausted retries surface a [`StoreError`].
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Reads a cached value. Failures and expired entries degrade to `None`.
    fn cache_get(&self, key: &str) -> Option<String>;

    /// Writes a cached value with a time-to-live. Failures are swallowed.
    fn cache_set(&self, key: &str, value: &str, ttl: Duration);
}

/////////////////////////////////////////////// Retry /////////////////////////////////////////////

/// A bounded retry policy for store backends that talk to a network.
///
/// Retries the operation up to `attempts` times with a fixed delay between
/// attempts, returning the last error once the budget is exhausted. Cache
/// callers convert the final error into a miss instead of propagating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// Maximum number of attempts, including the first.
    pub attempts: u32,
    /// Delay between consecutive attempts.
    pub delay: Duration,
}

impl Retry {
    /// Creates a policy with the given attempt budget and inter-attempt delay.
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Runs `op` until it succeeds or the attempt budget runs out.
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut last = StoreError::Unavailable("no attempts configured".to_string());
        for attempt in 0..self.attempts.max(1) {
            if attempt > 0 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            match op() {
                Ok(value) => return Ok(value),
                Err(e) => last = e,
            }
        }
        Err(last)
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

//////////////////////////////////////////// InMemoryStore ////////////////////////////////////////

/// Thread-safe in-memory store backing the daemon and the test suites.
///
/// Durable values live forever; cached values expire after their TTL and are
/// dropped lazily on read.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    durable: Mutex<HashMap<String, String>>,
    cache: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let durable = self
            .durable
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(durable.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut durable = self
            .durable
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        durable.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn cache_get(&self, key: &str) -> Option<String> {
        let mut cache = self.cache.lock().ok()?;
        match cache.get(key) {
            Some((value, deadline)) if Instant::now() < *deadline => Some(value.clone()),
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    fn cache_set(&self, key: &str, value: &str, ttl: Duration) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durable_set_then_get() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
    }

    #[test]
    fn cache_honors_ttl() {
        let store = InMemoryStore::new();
        store.cache_set("k", "v", Duration::from_secs(60));
        assert_eq!(store.cache_get("k"), Some("v".to_string()));

        store.cache_set("gone", "v", Duration::ZERO);
        assert_eq!(store.cache_get("gone"), None);
    }

    #[test]
    fn cache_miss_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.cache_get("missing"), None);
    }

    #[test]
    fn retry_returns_first_success() {
        let retry = Retry::new(3, Duration::ZERO);
        let mut calls = 0;
        let result = retry.run(|| {
            calls += 1;
            if calls < 3 {
                Err(StoreError::Unavailable("flaky".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn retry_exhausts_with_last_error() {
        let retry = Retry::new(2, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), StoreError> = retry.run(|| {
            calls += 1;
            Err(StoreError::Unavailable(format!("attempt {}", calls)))
        });
        assert_eq!(
            result,
            Err(StoreError::Unavailable("attempt 2".to_string()))
        );
        assert_eq!(calls, 2);
    }

    #[test]
    fn retry_runs_at_least_once() {
        let retry = Retry::new(0, Duration::ZERO);
        let result = retry.run(|| Ok(1));
        assert_eq!(result, Ok(1));
    }
}
