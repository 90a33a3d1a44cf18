//! Time-boxed memoization for market-data lookups.
//!
//! The cache is an explicit value owned by whoever wraps a provider. Expiry is
//! read from an injected [`Clock`] so tests control time directly.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::financials::FinancialSnapshot;
use crate::types::{Money, PeerQuote, PricePoint};
use crate::AlphaStackResult;

use super::provider::MarketDataProvider;

/// Default time-to-live for cached lookups (one hour).
pub const DEFAULT_TTL_SECS: i64 = 3600;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Key-value cache whose entries expire `ttl` after insertion.
pub struct TtlCache<K, V, C = SystemClock> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: C,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K: Eq + Hash, V: Clone, C: Clock> TtlCache<K, V, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        TtlCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, CacheEntry { value, expires_at });
        }
    }

    /// Return the cached value or compute, store, and return it.
    /// Errors are passed through and never stored.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        self.lookup(key, |_, _| {}, fetch)
    }

    /// Like [`get_or_try_insert_with`](Self::get_or_try_insert_with), reporting
    /// whether the key was a hit before fetching.
    fn lookup<E>(
        &self,
        key: K,
        on_lookup: impl FnOnce(&K, bool),
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let hit = self.get(&key);
        on_lookup(&key, hit.is_some());
        if let Some(hit) = hit {
            return Ok(hit);
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    pub fn clear_expired(&self) {
        let now = self.clock.now();
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, entry| entry.expires_at > now);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let (total, expired) = self
            .entries
            .lock()
            .map(|entries| {
                let expired = entries.values().filter(|e| e.expires_at <= now).count();
                (entries.len(), expired)
            })
            .unwrap_or((0, 0));
        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

type PriceKey = (String, NaiveDate, NaiveDate);

/// Wraps a provider and memoizes every successful lookup for one TTL.
pub struct CachedMarketData<P, C: Clock + Clone = SystemClock> {
    inner: P,
    snapshots: TtlCache<String, FinancialSnapshot, C>,
    prices: TtlCache<String, Money, C>,
    histories: TtlCache<PriceKey, Vec<PricePoint>, C>,
    peer_lists: TtlCache<String, Vec<String>, C>,
    quotes: TtlCache<String, PeerQuote, C>,
}

impl<P: MarketDataProvider> CachedMarketData<P, SystemClock> {
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, SystemClock)
    }
}

impl<P: MarketDataProvider, C: Clock + Clone> CachedMarketData<P, C> {
    pub fn with_clock(inner: P, ttl: Duration, clock: C) -> Self {
        CachedMarketData {
            inner,
            snapshots: TtlCache::with_clock(ttl, clock.clone()),
            prices: TtlCache::with_clock(ttl, clock.clone()),
            histories: TtlCache::with_clock(ttl, clock.clone()),
            peer_lists: TtlCache::with_clock(ttl, clock.clone()),
            quotes: TtlCache::with_clock(ttl, clock),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

fn cached<K, V, C, F>(cache: &TtlCache<K, V, C>, kind: &str, key: K, fetch: F) -> AlphaStackResult<V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
    C: Clock,
    F: FnOnce() -> AlphaStackResult<V>,
{
    cache.lookup(
        key,
        |key, hit| {
            if hit {
                debug!(kind, ?key, "market data cache hit");
            } else {
                debug!(kind, ?key, "market data cache miss");
            }
        },
        fetch,
    )
}

impl<P: MarketDataProvider, C: Clock + Clone> MarketDataProvider for CachedMarketData<P, C> {
    fn company_snapshot(&self, ticker: &str) -> AlphaStackResult<FinancialSnapshot> {
        cached(&self.snapshots, "snapshot", ticker.to_uppercase(), || {
            self.inner.company_snapshot(ticker)
        })
    }

    fn current_price(&self, ticker: &str) -> AlphaStackResult<Money> {
        cached(&self.prices, "price", ticker.to_uppercase(), || {
            self.inner.current_price(ticker)
        })
    }

    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AlphaStackResult<Vec<PricePoint>> {
        cached(
            &self.histories,
            "history",
            (ticker.to_uppercase(), start, end),
            || self.inner.price_history(ticker, start, end),
        )
    }

    fn peer_tickers(&self, ticker: &str) -> AlphaStackResult<Vec<String>> {
        cached(&self.peer_lists, "peers", ticker.to_uppercase(), || {
            self.inner.peer_tickers(ticker)
        })
    }

    fn peer_quote(&self, ticker: &str) -> AlphaStackResult<PeerQuote> {
        cached(&self.quotes, "quote", ticker.to_uppercase(), || {
            self.inner.peer_quote(ticker)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = clock();
        let cache: TtlCache<&str, u32, _> = TtlCache::with_clock(Duration::seconds(60), clock.clone());
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));

        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get(&"a"), Some(1));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: TtlCache<&str, u32, _> = TtlCache::with_clock(Duration::seconds(60), clock());
        let first: Result<u32, &str> = cache.get_or_try_insert_with("k", || Err("down"));
        assert!(first.is_err());
        let second: Result<u32, &str> = cache.get_or_try_insert_with("k", || Ok(7));
        assert_eq!(second, Ok(7));
        let third: Result<u32, &str> = cache.get_or_try_insert_with("k", || Ok(8));
        assert_eq!(third, Ok(7));
    }

    #[test]
    fn test_manual_clock_survives_poisoned_lock() {
        let clock = clock();
        let start = clock.now();
        let poisoner = clock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.now.lock().unwrap();
            panic!("poison the clock");
        })
        .join();

        assert!(clock.now.is_poisoned());
        assert_eq!(clock.now(), start);
        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), start + Duration::seconds(30));
    }

    #[test]
    fn test_lookup_fetches_once_per_miss() {
        let cache: TtlCache<&str, u32, _> = TtlCache::with_clock(Duration::seconds(60), clock());
        let mut seen = Vec::new();
        for _ in 0..2 {
            let value: Result<u32, &str> =
                cache.lookup("k", |_, hit| seen.push(hit), || Ok(3));
            assert_eq!(value, Ok(3));
        }
        assert_eq!(seen, vec![false, true]);
    }

    #[test]
    fn test_stats_and_clear_expired() {
        let clock = clock();
        let cache: TtlCache<u8, u8, _> = TtlCache::with_clock(Duration::seconds(10), clock.clone());
        cache.insert(1, 1);
        clock.advance(Duration::seconds(5));
        cache.insert(2, 2);
        clock.advance(Duration::seconds(6));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.active_entries, 1);

        cache.clear_expired();
        assert_eq!(cache.stats().total_entries, 1);
        cache.invalidate(&2);
        assert_eq!(cache.get(&2), None);
    }
}
