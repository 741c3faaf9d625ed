//! Short-lived cache in front of a [`WeatherProvider`].
//!
//! Keyed by the exact coordinate pair; an entry expires once it has gone
//! unread for the configured time-to-live. Failures are never cached.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

use crate::{Report, clock::Clock, error::RetrievalFailed, provider::WeatherProvider};

type Key = (u64, u64);

#[derive(Debug, Clone, Copy)]
struct Entry {
    report: Report,
    last_access: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ReportCache<P> {
    inner: P,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<Key, Entry>>,
}

impl<P: WeatherProvider> ReportCache<P> {
    pub fn new(inner: P, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(latitude: f64, longitude: f64) -> Key {
        (latitude.to_bits(), longitude.to_bits())
    }

    fn lookup(&self, key: Key, now: DateTime<Utc>) -> Option<Report> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(&key)?;

        if now - entry.last_access < self.ttl {
            entry.last_access = now;
            return Some(entry.report);
        }

        entries.remove(&key);
        None
    }

    fn store(&self, key: Key, report: Report, now: DateTime<Utc>) {
        let mut entries = self.entries.lock();
        entries.retain(|_, e| now - e.last_access < self.ttl);
        entries.insert(
            key,
            Entry {
                report,
                last_access: now,
            },
        );
    }
}

#[async_trait]
impl<P: WeatherProvider> WeatherProvider for ReportCache<P> {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Report, RetrievalFailed> {
        let key = Self::key(latitude, longitude);

        if let Some(report) = self.lookup(key, self.clock.now()) {
            debug!(latitude, longitude, "rain report cache hit");
            return Ok(report);
        }

        debug!(latitude, longitude, "rain report cache miss");
        let report = self.inner.fetch(latitude, longitude).await?;
        self.store(key, report, self.clock.now());

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Report, RetrievalFailed> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RetrievalFailed::upstream(latitude, longitude, "down"));
            }
            let mut report = Report::unknown(latitude, longitude);
            report.current_probability = n as f64;
            Ok(report)
        }
    }

    fn cache(fail: bool) -> (Arc<ManualClock>, ReportCache<CountingProvider>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
        ));
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
            fail,
        };
        (
            clock.clone(),
            ReportCache::new(provider, Duration::minutes(1), clock),
        )
    }

    fn calls(cache: &ReportCache<CountingProvider>) -> usize {
        cache.inner().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn repeated_request_is_served_from_cache() {
        let (_clock, cache) = cache(false);

        let first = cache.fetch(59.3, 18.0).await.unwrap();
        let second = cache.fetch(59.3, 18.0).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls(&cache), 1);
    }

    #[tokio::test]
    async fn different_coordinates_are_separate_entries() {
        let (_clock, cache) = cache(false);

        cache.fetch(59.3, 18.0).await.unwrap();
        cache.fetch(59.3, 18.001).await.unwrap();

        assert_eq!(calls(&cache), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn entry_expires_after_ttl_without_access() {
        let (clock, cache) = cache(false);

        cache.fetch(1.0, 2.0).await.unwrap();
        clock.advance(Duration::seconds(61));
        let refreshed = cache.fetch(1.0, 2.0).await.unwrap();

        assert_eq!(calls(&cache), 2);
        assert_eq!(refreshed.current_probability, 1.0);
    }

    #[tokio::test]
    async fn access_extends_lifetime() {
        let (clock, cache) = cache(false);

        cache.fetch(1.0, 2.0).await.unwrap();
        for _ in 0..3 {
            clock.advance(Duration::seconds(45));
            cache.fetch(1.0, 2.0).await.unwrap();
        }

        assert_eq!(calls(&cache), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (_clock, cache) = cache(true);

        assert!(cache.fetch(1.0, 2.0).await.is_err());
        assert!(cache.fetch(1.0, 2.0).await.is_err());

        assert_eq!(calls(&cache), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn stale_entries_are_purged_on_insert() {
        let (clock, cache) = cache(false);

        cache.fetch(1.0, 1.0).await.unwrap();
        cache.fetch(2.0, 2.0).await.unwrap();
        clock.advance(Duration::minutes(5));
        cache.fetch(3.0, 3.0).await.unwrap();

        assert_eq!(cache.len(), 1);
    }
}
