// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

//! loghoi-cache: the TTL Cache (C3) — a process-local, string-keyed cache
//! with lazy per-entry expiry, prefix/regex invalidation, and a
//! single-flight `get_or_set` that collapses concurrent misses on the same
//! key into one factory invocation.
//!
//! State lives behind one lock; cloning the cache clones a handle to the
//! same table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The factory passed to `get_or_set` failed; single-flight waiters
    /// receive a clone of this message rather than the original error type,
    /// since the error type is erased behind the closure.
    #[error("cache factory failed: {0}")]
    FactoryFailed(String),

    /// A single-flight wait observed the leader's factory panic or drop
    /// without ever publishing a value.
    #[error("cache factory for key {0:?} was abandoned")]
    Abandoned(String),
}

struct Entry {
    expires_at: Instant,
    value: serde_json::Value,
}

enum Slot {
    Ready(Entry),
    /// A factory invocation is in flight; waiters subscribe to be notified
    /// of the outcome instead of invoking the factory themselves.
    InFlight(broadcast::Sender<Result<serde_json::Value, String>>),
}

struct Inner {
    slots: HashMap<String, Slot>,
}

/// Process-local TTL cache. Cheap to clone: clones share the same
/// underlying table via `Arc`.
#[derive(Clone)]
pub struct TtlCache {
    inner: Arc<Mutex<Inner>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
            })),
        }
    }

    /// Lazy-expiring read. An expired entry is removed on access and
    /// treated as absent.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut inner = self.inner.lock();
        match inner.slots.get(key) {
            Some(Slot::Ready(entry)) if entry.expires_at > Instant::now() => {
                Some(entry.value.clone())
            }
            Some(Slot::Ready(_)) => {
                inner.slots.remove(key);
                None
            }
            _ => None,
        }
    }

    /// `ttl` is clamped to a non-negative duration; a zero ttl stores an
    /// entry that is already expired, which is useful for tests that need
    /// to force a miss on the next `get`.
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        let mut inner = self.inner.lock();
        inner.slots.insert(
            key.into(),
            Slot::Ready(Entry {
                expires_at: Instant::now() + ttl,
                value,
            }),
        );
    }

    /// Return the cached value for `key` if present and unexpired;
    /// otherwise invoke `factory` exactly once even under concurrent
    /// callers sharing the same key, caching and returning its result.
    ///
    /// Concurrent misses on the same key do not race the factory: the
    /// first caller becomes the leader and runs it, later callers
    /// subscribe to a broadcast channel and receive the leader's result.
    pub async fn get_or_set<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        factory: F,
    ) -> Result<serde_json::Value, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<serde_json::Value, String>>,
    {
        enum Role {
            Leader,
            Follower(broadcast::Receiver<Result<serde_json::Value, String>>),
        }

        let role = {
            let mut inner = self.inner.lock();
            match inner.slots.get(key) {
                Some(Slot::Ready(entry)) if entry.expires_at > Instant::now() => {
                    return Ok(entry.value.clone());
                }
                Some(Slot::InFlight(tx)) => Role::Follower(tx.subscribe()),
                _ => {
                    let (tx, _rx) = broadcast::channel(1);
                    inner.slots.insert(key.to_string(), Slot::InFlight(tx));
                    Role::Leader
                }
            }
        };

        match role {
            Role::Leader => {
                trace!(key, "cache miss, entering single-flight as leader");
                let outcome = factory().await;

                let mut inner = self.inner.lock();
                let tx = match inner.slots.remove(key) {
                    Some(Slot::InFlight(tx)) => tx,
                    _ => unreachable!("leader always owns the InFlight slot it inserted"),
                };

                match &outcome {
                    Ok(value) => {
                        inner.slots.insert(
                            key.to_string(),
                            Slot::Ready(Entry {
                                expires_at: Instant::now() + ttl,
                                value: value.clone(),
                            }),
                        );
                    }
                    Err(_) => {
                        // leave the key absent so the next caller retries the factory
                    }
                }
                drop(inner);

                let _ = tx.send(outcome.clone());
                outcome.map_err(CacheError::FactoryFailed)
            }
            Role::Follower(mut rx) => {
                trace!(key, "cache miss, awaiting in-flight leader");
                match rx.recv().await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(msg)) => Err(CacheError::FactoryFailed(msg)),
                    Err(_) => Err(CacheError::Abandoned(key.to_string())),
                }
            }
        }
    }

    /// Remove every ready entry whose key starts with `prefix`. In-flight
    /// single-flight slots are left untouched since there is no value yet
    /// to invalidate.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.slots.len();
        inner.slots.retain(|k, slot| {
            !(k.starts_with(prefix) && matches!(slot, Slot::Ready(_)))
        });
        before - inner.slots.len()
    }

    /// Remove every ready entry whose key matches `pattern`, implicitly
    /// anchored at the start (`^` is prepended if not already present). An
    /// invalid pattern matches nothing and returns 0 rather than erroring.
    pub fn invalidate_regex(&self, pattern: &str) -> usize {
        let anchored = if pattern.starts_with('^') {
            pattern.to_string()
        } else {
            format!("^{pattern}")
        };
        let re = match Regex::new(&anchored) {
            Ok(re) => re,
            Err(_) => return 0,
        };

        let mut inner = self.inner.lock();
        let before = inner.slots.len();
        inner.slots.retain(|k, slot| {
            !(re.is_match(k) && matches!(slot, Slot::Ready(_)))
        });
        before - inner.slots.len()
    }

    /// Remove every currently-expired ready entry, returning the count
    /// removed. Run periodically by the daemon's background sweeper.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let before = inner.slots.len();
        inner.slots.retain(|_, slot| match slot {
            Slot::Ready(entry) => entry.expires_at > now,
            Slot::InFlight(_) => true,
        });
        before - inner.slots.len()
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
