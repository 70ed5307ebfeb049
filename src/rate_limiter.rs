// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Remote API Pacing
 * Minimum-interval gate per remote API, shared across every task that talks to it
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use nonzero_ext::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

type DirectLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum interval between consecutive requests to one remote API.
///
/// One token per `interval`, burst of one: the first request passes immediately,
/// every later one waits until `interval` has elapsed since the previous slot.
pub struct Pacer {
    name: String,
    interval: Duration,
    limiter: Option<DirectLimiter>,
}

impl Pacer {
    pub fn new(name: &str, interval: Duration) -> Self {
        // A zero interval means the API has no published limit
        let limiter = Quota::with_period(interval)
            .map(|quota| GovernorRateLimiter::direct(quota.allow_burst(nonzero!(1u32))));

        debug!(
            api = name,
            interval_ms = interval.as_millis() as u64,
            "Initialized pacer"
        );

        Self {
            name: name.to_string(),
            interval,
            limiter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request slot for this API is available
    pub async fn wait_for_slot(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Process-wide registry so every client for the same API shares one pacing clock
#[derive(Default)]
pub struct PacerRegistry {
    pacers: RwLock<HashMap<String, Arc<Pacer>>>,
}

impl PacerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pacer for `api`, creating it with `interval` on first use.
    ///
    /// The interval of an existing pacer is never changed.
    pub async fn pacer(&self, api: &str, interval: Duration) -> Arc<Pacer> {
        if let Some(existing) = self.pacers.read().await.get(api) {
            return Arc::clone(existing);
        }

        let mut pacers = self.pacers.write().await;
        let pacer = pacers.entry(api.to_string()).or_insert_with(|| {
            info!(
                "Pacing {} at one request per {}ms",
                api,
                interval.as_millis()
            );
            Arc::new(Pacer::new(api, interval))
        });

        Arc::clone(pacer)
    }

    pub async fn len(&self) -> usize {
        self.pacers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pacers.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_first_slot_is_immediate() {
        let pacer = Pacer::new("test", Duration::from_millis(500));
        let started = Instant::now();
        pacer.wait_for_slot().await;
        assert!(started.elapsed() < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_consecutive_slots_respect_interval() {
        let pacer = Pacer::new("test", Duration::from_millis(100));
        pacer.wait_for_slot().await;
        let started = Instant::now();
        pacer.wait_for_slot().await;
        pacer.wait_for_slot().await;
        // Two more slots need at least two intervals (allow clock granularity slack)
        assert!(started.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let pacer = Pacer::new("unpaced", Duration::ZERO);
        let started = Instant::now();
        for _ in 0..20 {
            pacer.wait_for_slot().await;
        }
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_registry_shares_pacer_per_api() {
        let registry = PacerRegistry::new();
        let a = registry.pacer("hibp", Duration::from_millis(50)).await;
        let b = registry.pacer("hibp", Duration::from_secs(10)).await;
        let c = registry.pacer("leakcheck", Duration::from_millis(50)).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(b.interval(), Duration::from_millis(50));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_shared_pacer_across_tasks() {
        let pacer = Arc::new(Pacer::new("shared", Duration::from_millis(60)));
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pacer = Arc::clone(&pacer);
            handles.push(tokio::spawn(async move { pacer.wait_for_slot().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Four requests on one budget: three full intervals at minimum
        assert!(started.elapsed() >= Duration::from_millis(160));
    }
}
