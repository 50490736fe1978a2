//! Single-entry, time-bounded cache for the aggregated payload.
//!
//! The cache has two states: Cold (nothing captured yet) and Warm (a payload
//! with its capture time). A Warm entry is served while its age is below the
//! TTL; once the age reaches the TTL the next request re-aggregates and
//! overwrites it. Concurrent misses are not coalesced, so the last writer
//! wins.

use crate::domain::{AggregatePayload, Clock};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use utoipa::ToSchema;

/// Default freshness window, shared with the CDN `max-age`.
pub const DEFAULT_TTL_SECS: u64 = 60;

/// Whether a response was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value for the `x-cache` diagnostic header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Observable cache state, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Cold,
    Warm,
    Expired,
}

/// Hit/miss counters since process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

enum CacheEntry {
    Cold,
    Warm {
        captured_at: DateTime<Utc>,
        payload: Arc<AggregatePayload>,
    },
}

pub struct ResponseCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: RwLock::new(CacheEntry::Cold),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the held payload if it is still fresh, recording a hit or miss.
    pub async fn get(&self) -> Option<Arc<AggregatePayload>> {
        let now = self.clock.now();
        let entry = self.entry.read().await;

        match &*entry {
            CacheEntry::Warm {
                captured_at,
                payload,
            } if !self.is_stale(*captured_at, now) => {
                debug!("Response cache hit (captured at {})", captured_at);
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("metals_cache_total", "result" => "hit").increment(1);
                Some(payload.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("metals_cache_total", "result" => "miss").increment(1);
                None
            }
        }
    }

    /// Replace the held payload, stamping it with the current time.
    pub async fn set(&self, payload: Arc<AggregatePayload>) {
        let captured_at = self.clock.now();
        let mut entry = self.entry.write().await;
        *entry = CacheEntry::Warm {
            captured_at,
            payload,
        };
    }

    /// True when there is no payload or the held one has reached the TTL.
    pub async fn is_expired(&self) -> bool {
        self.state().await != CacheState::Warm
    }

    pub async fn state(&self) -> CacheState {
        let now = self.clock.now();
        match &*self.entry.read().await {
            CacheEntry::Cold => CacheState::Cold,
            CacheEntry::Warm { captured_at, .. } if self.is_stale(*captured_at, now) => {
                CacheState::Expired
            }
            CacheEntry::Warm { .. } => CacheState::Warm,
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn is_stale(&self, captured_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // A clock that stepped backwards yields a negative age; treat it as fresh.
        let age = now
            .signed_duration_since(captured_at)
            .to_std()
            .unwrap_or_default();
        age >= self.ttl
    }
}
