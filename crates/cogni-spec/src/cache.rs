// crates/cogni-spec/src/cache.rs
// ============================================================================
// Module: Spec Cache
// Description: Process-wide LRU cache for validated specifications.
// Purpose: Avoid re-fetching and re-validating `.cogni/repo-spec.yaml` on
//          every delivery for a repository that has not changed.
// Dependencies: cogni_core::time, std::collections
// ============================================================================

//! ## Overview
//! Entries are keyed by `(repo_id, git_ref, content_hash)` per `spec.md`
//! §4.2: a change to the ref or the file's bytes is a cache miss by
//! construction, so no explicit invalidation is needed beyond TTL and
//! capacity eviction. A single [`SpecCache`] is meant to live for the
//! lifetime of the process; [`SpecCache::clear_for_tests`] resets it between
//! test cases that would otherwise observe each other's entries.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use cogni_core::Specification;
use cogni_core::time::MonotonicClock;

/// Maximum number of cached specifications before LRU eviction.
pub const MAX_ENTRIES: usize = 1000;

/// Time-to-live for a cached specification.
pub const TTL: Duration = Duration::from_secs(600);

/// Cache key: repository, ref, and content hash of the raw spec bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey {
    /// Host-scoped repository identifier string.
    pub repo_id: String,
    /// Git ref the spec was fetched at.
    pub git_ref: String,
    /// `sha256` of the raw spec bytes.
    pub content_hash: String,
}

impl CacheKey {
    /// Builds a cache key from its three components.
    #[must_use]
    pub fn new(repo_id: impl Into<String>, git_ref: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            git_ref: git_ref.into(),
            content_hash: content_hash.into(),
        }
    }
}

struct CacheEntry {
    spec: Specification,
    inserted_at: Instant,
}

struct CacheState {
    entries: BTreeMap<CacheKey, CacheEntry>,
    /// Recency order, most-recently-used at the back.
    order: VecDeque<CacheKey>,
}

impl CacheState {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            order: VecDeque::new(),
        }
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(position) = self.order.iter().position(|existing| existing == key) {
            if let Some(removed) = self.order.remove(position) {
                self.order.push_back(removed);
            }
        }
    }

    fn evict(&mut self, key: &CacheKey) {
        self.entries.remove(key);
        if let Some(position) = self.order.iter().position(|existing| existing == key) {
            self.order.remove(position);
        }
    }
}

/// Process-wide LRU cache of validated specifications, keyed by
/// `(repo_id, git_ref, content_hash)`.
pub struct SpecCache<C> {
    clock: C,
    state: Mutex<CacheState>,
}

impl<C: MonotonicClock> SpecCache<C> {
    /// Builds an empty cache driven by `clock`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(CacheState::new()),
        }
    }

    /// Returns the cached specification for `key`, if present and not expired.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Specification> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let expired = state
            .entries
            .get(key)
            .is_some_and(|entry| now.saturating_duration_since(entry.inserted_at) >= TTL);
        if expired {
            state.evict(key);
            return None;
        }
        let spec = state.entries.get(key).map(|entry| entry.spec.clone());
        if spec.is_some() {
            state.touch(key);
        }
        spec
    }

    /// Inserts or replaces the cached specification for `key`, evicting the
    /// least-recently-used entry when at capacity.
    pub fn insert(&self, key: CacheKey, spec: Specification) {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.evict(&key);
        while state.entries.len() >= MAX_ENTRIES {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            } else {
                break;
            }
        }
        state.entries.insert(
            key.clone(),
            CacheEntry {
                spec,
                inserted_at: now,
            },
        );
        state.order.push_back(key);
    }

    /// Clears every entry. Intended for test setup, not production use.
    pub fn clear_for_tests(&self) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.entries.clear();
        state.order.clear();
    }

    /// Returns the number of currently cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).entries.len()
    }

    /// Returns `true` when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
