//! Result cache with time-based expiry.
//!
//! Sits beside the engine, never inside it: the computational
//! functions stay pure and callers decide what is worth memoizing.
//! Time comes from the injected clock so tests can move it.

use crate::{clock::Clock, error::EngineResult, types::CompanyId};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey {
    pub company_id: CompanyId,
    /// Analysis period label, e.g. "2025" or "2025-06".
    pub period: String,
    /// Hash of the serialized analysis parameters. Two calls with the
    /// same company and period but different inputs never collide on
    /// the same entry.
    pub params_fingerprint: u64,
}

impl CacheKey {
    pub fn new<P: Serialize>(
        company_id: impl Into<CompanyId>,
        period: impl Into<String>,
        params: &P,
    ) -> EngineResult<Self> {
        Ok(Self {
            company_id: company_id.into(),
            period: period.into(),
            params_fingerprint: fingerprint(params)?,
        })
    }
}

pub fn fingerprint<P: Serialize>(params: &P) -> EngineResult<u64> {
    let serialized =
        serde_json::to_string(params).context("cannot serialize cache parameters")?;
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    Ok(hasher.finish())
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    value: serde_json::Value,
}

#[derive(Debug)]
pub struct AnalysisCache<C: Clock> {
    clock: C,
    ttl: Duration,
    entries: BTreeMap<CacheKey, CacheEntry>,
}

impl<C: Clock> AnalysisCache<C> {
    pub fn new(clock: C, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert<V: Serialize>(&mut self, key: CacheKey, value: &V) -> EngineResult<()> {
        let value = serde_json::to_value(value).context("cannot serialize cached result")?;
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: self.clock.now(),
                value,
            },
        );
        Ok(())
    }

    /// Fetch a live entry. Expired entries read as absent but are only
    /// dropped by `purge_expired`.
    pub fn get(&self, key: &CacheKey) -> Option<&serde_json::Value> {
        let entry = self.entries.get(key)?;
        if self.clock.now() - entry.stored_at >= self.ttl {
            return None;
        }
        Some(&entry.value)
    }

    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.stored_at < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
