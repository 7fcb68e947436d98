//! Day-keyed rate table cache with a four-step degradation chain.
//!
//! `get_rates` is total: whatever the provider does, the caller receives a
//! usable table. Resolution walks an explicit state machine:
//!
//! 1. [`RateSource::Fresh`] — cached or freshly fetched table for the day;
//! 2. [`RateSource::TodayProxy`] — the day's fetch failed, the latest
//!    listing succeeded and is stored under the *originally requested* day
//!    (historical rate unavailable, latest known used as proxy);
//! 3. [`RateSource::StaleCache`] — both fetches failed, some previously
//!    cached table is served as a degraded approximation;
//! 4. [`RateSource::StaticFallback`] — nothing cached either, the static
//!    fallback table is served verbatim.
//!
//! Steps 1 and 2 memoize; steps 3 and 4 do not, so a later request for the
//! same day retries the provider. Cached entries are add-if-absent and
//! immutable for the life of the process. Population is single-flight per
//! day: concurrent first requests share one in-flight resolution, so a cold
//! day costs at most one provider call.

use chrono::NaiveDate;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::rates::RateTable;
use crate::rate_provider::RateProvider;

/// How a rate table was obtained, from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Fresh,
    TodayProxy,
    StaleCache,
    StaticFallback,
}

impl RateSource {
    /// Whether a table from this source may be memoized under its day key.
    fn is_cacheable(self) -> bool {
        matches!(self, RateSource::Fresh | RateSource::TodayProxy)
    }
}

/// A resolved table together with the chain step that produced it.
#[derive(Debug, Clone)]
pub struct ResolvedRates {
    pub table: RateTable,
    pub source: RateSource,
}

type InflightFuture = Shared<BoxFuture<'static, ResolvedRates>>;

#[derive(Clone)]
pub struct RateCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    provider: Arc<dyn RateProvider>,
    fallback: RateTable,
    tables: Mutex<HashMap<NaiveDate, RateTable>>,
    inflight: Mutex<HashMap<NaiveDate, InflightFuture>>,
}

impl RateCache {
    pub fn new(provider: Arc<dyn RateProvider>, fallback: RateTable) -> Self {
        RateCache {
            inner: Arc::new(CacheInner {
                provider,
                fallback,
                tables: Mutex::new(HashMap::new()),
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the rate table for `day`. Never fails; provider errors are
    /// absorbed by the degradation chain.
    pub async fn get_rates(&self, day: NaiveDate) -> RateTable {
        self.get_rates_with_source(day).await.table
    }

    /// Like [`get_rates`](Self::get_rates), also reporting which chain step
    /// produced the table. A plain cache hit reports [`RateSource::Fresh`].
    pub async fn get_rates_with_source(&self, day: NaiveDate) -> ResolvedRates {
        if let Some(table) = self.inner.tables.lock().await.get(&day) {
            debug!(%day, "rate cache hit");
            return ResolvedRates {
                table: table.clone(),
                source: RateSource::Fresh,
            };
        }

        // Single-flight: join an in-flight resolution for this day, or
        // start one.
        let resolution = {
            let mut inflight = self.inner.inflight.lock().await;
            if let Some(pending) = inflight.get(&day) {
                debug!(%day, "joining in-flight rate resolution");
                pending.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let pending = async move { CacheInner::resolve(inner, day).await }
                    .boxed()
                    .shared();
                inflight.insert(day, pending.clone());
                pending
            }
        };
        resolution.await
    }
}

impl CacheInner {
    /// Runs the chain once, memoizes cacheable outcomes, and clears the
    /// in-flight slot.
    async fn resolve(inner: Arc<CacheInner>, day: NaiveDate) -> ResolvedRates {
        let resolved = inner.resolve_chain(day).await;
        if resolved.source.is_cacheable() {
            // Add-if-absent: a cached day's table is never overwritten.
            inner
                .tables
                .lock()
                .await
                .entry(day)
                .or_insert_with(|| resolved.table.clone());
        }
        inner.inflight.lock().await.remove(&day);
        resolved
    }

    async fn resolve_chain(&self, day: NaiveDate) -> ResolvedRates {
        // Another caller may have populated the entry between the outer
        // cache check and this future starting.
        if let Some(table) = self.tables.lock().await.get(&day) {
            return ResolvedRates {
                table: table.clone(),
                source: RateSource::Fresh,
            };
        }

        match self.provider.fetch_rates(Some(day)).await {
            Ok(mut table) => {
                table.backfill_from(&self.fallback);
                debug!(%day, currencies = table.len(), "fetched fresh rate table");
                ResolvedRates {
                    table,
                    source: RateSource::Fresh,
                }
            }
            Err(err) => {
                warn!(%day, error = %err, "historical rate fetch failed, retrying with latest listing");
                match self.provider.fetch_rates(None).await {
                    Ok(mut table) => {
                        table.backfill_from(&self.fallback);
                        warn!(%day, "caching latest rates as proxy for requested day");
                        ResolvedRates {
                            table,
                            source: RateSource::TodayProxy,
                        }
                    }
                    Err(err) => {
                        warn!(%day, error = %err, "latest rate fetch failed as well");
                        let tables = self.tables.lock().await;
                        if let Some(table) = tables.values().next() {
                            warn!(%day, "serving a stale cached rate table");
                            ResolvedRates {
                                table: table.clone(),
                                source: RateSource::StaleCache,
                            }
                        } else {
                            warn!(%day, "serving the static fallback rate table");
                            ResolvedRates {
                                table: self.fallback.clone(),
                                source: RateSource::StaticFallback,
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::DEFAULT_FALLBACK_RATES;
    use crate::error::RateError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted provider: fails historical and/or latest fetches on demand
    /// and counts every call.
    struct ScriptedProvider {
        historical_ok: bool,
        latest_ok: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(historical_ok: bool, latest_ok: bool) -> Self {
            ScriptedProvider {
                historical_ok,
                latest_ok,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn table(rate: f64) -> RateTable {
            let mut table = RateTable::new("CZK");
            table.insert("EUR", rate);
            table
        }
    }

    #[async_trait]
    impl RateProvider for ScriptedProvider {
        async fn fetch_rates(&self, day: Option<NaiveDate>) -> Result<RateTable, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let ok = match day {
                Some(_) => self.historical_ok,
                None => self.latest_ok,
            };
            if ok {
                // Distinguish historical from latest by the quoted rate.
                Ok(Self::table(if day.is_some() { 25.0 } else { 24.0 }))
            } else {
                Err(RateError::SourceUnavailable("scripted outage".into()))
            }
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    fn cache_with(provider: Arc<ScriptedProvider>) -> RateCache {
        RateCache::new(provider, DEFAULT_FALLBACK_RATES.clone())
    }

    #[tokio::test]
    async fn test_fresh_fetch_is_memoized() {
        let provider = Arc::new(ScriptedProvider::new(true, true));
        let cache = cache_with(Arc::clone(&provider));

        let first = cache.get_rates_with_source(day()).await;
        assert_eq!(first.source, RateSource::Fresh);
        assert_eq!(first.table.rate("EUR"), Some(25.0));
        assert_eq!(provider.calls(), 1);

        let second = cache.get_rates_with_source(day()).await;
        assert_eq!(second.source, RateSource::Fresh);
        assert_eq!(provider.calls(), 1, "cache hit must not call the provider");
    }

    #[tokio::test]
    async fn test_fetched_table_is_backfilled_from_fallback() {
        let provider = Arc::new(ScriptedProvider::new(true, true));
        let cache = cache_with(provider);

        let table = cache.get_rates(day()).await;
        assert_eq!(table.rate("EUR"), Some(25.0), "fetched entry wins");
        assert_eq!(table.rate("USD"), DEFAULT_FALLBACK_RATES.rate("USD"));
        assert_eq!(table.rate("PLN"), DEFAULT_FALLBACK_RATES.rate("PLN"));
    }

    #[tokio::test]
    async fn test_today_proxy_is_cached_under_requested_day() {
        let provider = Arc::new(ScriptedProvider::new(false, true));
        let cache = cache_with(Arc::clone(&provider));

        let first = cache.get_rates_with_source(day()).await;
        assert_eq!(first.source, RateSource::TodayProxy);
        assert_eq!(first.table.rate("EUR"), Some(24.0));
        assert_eq!(provider.calls(), 2, "historical then latest");

        // The proxy sits under the historical key now; no further calls.
        let second = cache.get_rates_with_source(day()).await;
        assert_eq!(second.source, RateSource::Fresh);
        assert_eq!(second.table.rate("EUR"), Some(24.0));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_total_outage_with_empty_cache_serves_static_fallback() {
        let provider = Arc::new(ScriptedProvider::new(false, false));
        let cache = cache_with(Arc::clone(&provider));

        let resolved = cache.get_rates_with_source(day()).await;
        assert_eq!(resolved.source, RateSource::StaticFallback);
        assert_eq!(resolved.table, *DEFAULT_FALLBACK_RATES);

        // Fallback results are not memoized: the next request retries.
        cache.get_rates(day()).await;
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_total_outage_with_warm_cache_serves_stale_table() {
        // A table is already cached when the provider goes dark entirely.
        let dark = Arc::new(ScriptedProvider::new(false, false));
        let cache = RateCache {
            inner: Arc::new(CacheInner {
                provider: dark,
                fallback: DEFAULT_FALLBACK_RATES.clone(),
                tables: Mutex::new(HashMap::from([(day(), ScriptedProvider::table(25.0))])),
                inflight: Mutex::new(HashMap::new()),
            }),
        };

        let other_day = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();
        let resolved = cache.get_rates_with_source(other_day).await;
        assert_eq!(resolved.source, RateSource::StaleCache);
        assert_eq!(resolved.table.rate("EUR"), Some(25.0));
    }

    #[tokio::test]
    async fn test_concurrent_cold_requests_share_one_provider_call() {
        let provider = Arc::new(ScriptedProvider {
            historical_ok: true,
            latest_ok: true,
            delay: Some(Duration::from_millis(20)),
            calls: AtomicUsize::new(0),
        });
        let cache = cache_with(Arc::clone(&provider));

        let requests = (0..16).map(|_| {
            let cache = cache.clone();
            async move { cache.get_rates(day()).await }
        });
        let tables = futures::future::join_all(requests).await;

        assert_eq!(provider.calls(), 1, "population must be single-flight");
        for table in tables {
            assert_eq!(table.rate("EUR"), Some(25.0));
        }
    }
}
