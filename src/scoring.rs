//! # Score Computation and Interests Lookup
//!
//! The business functions behind the two dispatch methods. Both treat the
//! [`Store`] as the source of truth: `get_score` consults the cache plane
//! under a key derived deterministically from the normalized identity fields
//! before computing, and writes the computed score back with a one-hour TTL;
//! `get_interests` reads one durable key per client id.

use std::time::Duration;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::errors::StoreError;
use crate::store::Store;

/// How long a computed score stays cached.
pub const SCORE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// The sentinel score returned to administrative callers without touching
/// the store.
pub const ADMIN_SCORE: f64 = 42.0;

/// Identity fields contributing to an online score.
///
/// All fields are optional; each present field (or pair) adds a fixed
/// increment to the score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreQuery {
    /// The caller-supplied first name.
    pub first_name: Option<String>,
    /// The caller-supplied last name.
    pub last_name: Option<String>,
    /// The phone number, normalized to a string.
    pub phone: Option<String>,
    /// The email address.
    pub email: Option<String>,
    /// The parsed birthday.
    pub birthday: Option<NaiveDate>,
    /// The gender code.
    pub gender: Option<i64>,
}

impl ScoreQuery {
    /// The cache key for this identity: `uid:` plus the hex digest of the
    /// normalized name, phone, and birthday fields.
    ///
    /// Email and gender are excluded: the key identifies a person, not a
    /// request.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.first_name.as_deref().unwrap_or("").as_bytes());
        hasher.update(self.last_name.as_deref().unwrap_or("").as_bytes());
        hasher.update(self.phone.as_deref().unwrap_or("").as_bytes());
        if let Some(birthday) = self.birthday {
            hasher.update(birthday.format("%Y%m%d").to_string().as_bytes());
        }
        format!("uid:{:x}", hasher.finalize())
    }

    fn compute(&self) -> f64 {
        let mut score = 0.0;
        if self.phone.is_some() {
            score += 1.5;
        }
        if self.email.is_some() {
            score += 1.5;
        }
        if self.birthday.is_some() && self.gender.is_some() {
            score += 1.5;
        }
        if self.first_name.is_some() && self.last_name.is_some() {
            score += 0.5;
        }
        score
    }
}

/// Returns the score for an identity, consulting the cache first.
///
/// A cache hit short-circuits computation; a miss (including a degraded
/// cache) computes the score and writes it back for [`SCORE_CACHE_TTL`].
/// Unparsable cached payloads are treated as misses and overwritten.
pub fn get_score(store: &dyn Store, query: &ScoreQuery) -> Result<f64, StoreError> {
    let key = query.cache_key();
    if let Some(cached) = store.cache_get(&key)
        && let Ok(score) = cached.parse::<f64>()
    {
        return Ok(score);
    }
    let score = query.compute();
    store.cache_set(&key, &score.to_string(), SCORE_CACHE_TTL);
    Ok(score)
}

/// Returns the interests recorded for one client id.
///
/// Interests live under the durable key `i:<id>` as a JSON string list. A
/// missing key yields an empty list; an undecodable payload is a hard error.
pub fn get_interests(store: &dyn Store, client_id: i64) -> Result<Vec<String>, StoreError> {
    let key = format!("i:{}", client_id);
    match store.get(&key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::Serialization(format!("key '{}': {}", key, e))),
        None => Ok(Vec::new()),
    }
}
