//! Short-TTL store of proxied responses.
//!
//! Entries are bounded by age and count. Reads never remove anything: an
//! expired entry stays until the sweep runs. Capacity overflow evicts exactly
//! one entry per insert, chosen by the configured [`EvictionPolicy`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use tokio::time::Instant;

use crate::config::{CacheConfig, EvictionPolicy};
use crate::observability::metrics;

/// A stored proxy response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub payload: Bytes,
    pub stored_at: Instant,
}

impl CachedResponse {
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}

struct CacheState {
    entries: HashMap<String, CachedResponse>,
    /// Keys from next-to-evict to most recent.
    order: VecDeque<String>,
}

impl CacheState {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn forget(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }
}

/// Thread-safe bounded response cache keyed by normalized absolute URL.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    capacity: usize,
    policy: EvictionPolicy,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity,
            policy,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.capacity, config.eviction)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut state = self.lock();
        let entry = state.entries.get(key)?;
        if entry.age() >= self.ttl {
            return None;
        }
        let entry = entry.clone();
        if self.policy == EvictionPolicy::LeastRecentlyUsed {
            state.touch(key);
        }
        Some(entry)
    }

    /// Insert or overwrite `key`, then evict one entry if over capacity.
    ///
    /// Overwriting keeps the key's insertion position.
    pub fn put(&self, key: impl Into<String>, status: StatusCode, headers: HeaderMap, payload: Bytes) {
        let key = key.into();
        let mut state = self.lock();

        let entry = CachedResponse {
            status,
            headers,
            payload,
            stored_at: Instant::now(),
        };
        if state.entries.insert(key.clone(), entry).is_none() {
            state.order.push_back(key);
        } else if self.policy == EvictionPolicy::LeastRecentlyUsed {
            state.touch(&key);
        }

        if state.entries.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
                tracing::debug!(key = %oldest, "Evicted cache entry over capacity");
                metrics::record_cache_eviction("capacity", 1);
            }
        }
        metrics::record_cache_size(state.entries.len());
    }

    pub fn remove(&self, key: &str) -> Option<CachedResponse> {
        let mut state = self.lock();
        let removed = state.entries.remove(key);
        if removed.is_some() {
            state.forget(key);
        }
        removed
    }

    /// Drop every entry whose age has reached the TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut state = self.lock();
        let ttl = self.ttl;
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.age() < ttl);
        let removed = before - state.entries.len();

        if removed > 0 {
            let CacheState { entries, order } = &mut *state;
            order.retain(|k| entries.contains_key(k));
            metrics::record_cache_eviction("expired", removed);
        }
        metrics::record_cache_size(state.entries.len());
        removed
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
        metrics::record_cache_size(0);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }
}
