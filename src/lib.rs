pub mod analytics;
pub mod budget;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod providers;
pub mod rate_cache;
pub mod rate_provider;
pub mod service;
pub mod transaction_store;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::providers::CnbRateProvider;
use crate::rate_cache::RateCache;
use crate::service::Analytics;
use crate::transaction_store::TransactionStore;

/// Wires a rate cache from the configured provider settings.
pub fn build_rate_cache(config: &AppConfig) -> RateCache {
    let base_url = config
        .providers
        .cnb
        .as_ref()
        .map_or("https://api.cnb.cz", |p| &p.base_url);
    let timeout_secs = config.providers.cnb.as_ref().map_or(10, |p| p.timeout_secs);
    let provider = CnbRateProvider::new(
        base_url,
        &config.currency,
        &config.supported_currencies,
        Duration::from_secs(timeout_secs),
    );
    RateCache::new(Arc::new(provider), config.fallback_table())
}

/// Wires the full analytics service over a transaction store.
pub fn build_analytics(config: &AppConfig, store: Arc<dyn TransactionStore>) -> Analytics {
    Analytics::new(store, build_rate_cache(config))
}
