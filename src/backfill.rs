//! Bulk loading of historical rates through the resolver

use crate::core::config::BackfillConfig;
use crate::core::{CurrencyCode, RateError, RateStore};
use crate::resolver::RateResolver;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub success_count: usize,
    pub error_count: usize,
    /// The requested `days_back`. The run itself covers `days_back + 1`
    /// dates, since today is included.
    pub days_processed: u32,
    pub sources: Vec<CurrencyCode>,
    pub targets: Vec<CurrencyCode>,
}

/// Codes to use for one side of the backfill; empty means the defaults.
fn codes_or_default(codes: &[CurrencyCode], default: Vec<CurrencyCode>) -> Vec<CurrencyCode> {
    if codes.is_empty() {
        default
    } else {
        codes.to_vec()
    }
}

/// Number of resolutions a backfill over these codes performs.
pub fn planned_steps(days_back: u32, sources: &[CurrencyCode], targets: &[CurrencyCode]) -> u64 {
    let pairs = sources
        .iter()
        .flat_map(|s| targets.iter().filter(move |t| *t != s))
        .count() as u64;
    pairs * (u64::from(days_back) + 1)
}

/// Resolves every (source, target) pair with `source != target` for each day
/// from `today - days_back` through `today`, one resolution at a time.
///
/// Individual failures are counted and logged; only a store failure stops
/// the run. `on_step` is called after each resolution.
pub async fn load_historical_rates(
    resolver: &RateResolver,
    store: &dyn RateStore,
    days_back: u32,
    sources: &[CurrencyCode],
    targets: &[CurrencyCode],
    today: NaiveDate,
    on_step: &(dyn Fn() + Send + Sync),
) -> Result<BackfillReport, RateError> {
    let defaults = BackfillConfig::default();
    let sources = codes_or_default(sources, defaults.sources);
    let targets = codes_or_default(targets, defaults.targets);

    let start = today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .ok_or_else(|| RateError::Validation(format!("Cannot go back {days_back} days")))?;

    for code in sources.iter().chain(targets.iter()) {
        store
            .find_or_create_currency(code)
            .await
            .map_err(RateError::Store)?;
    }

    let mut success_count = 0;
    let mut error_count = 0;
    for date in start.iter_days().take_while(|d| *d <= today) {
        for source in &sources {
            for target in targets.iter().filter(|t| *t != source) {
                match resolver.resolve(source, target, date, None).await {
                    Ok(_) => success_count += 1,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        error_count += 1;
                        error!("Failed to get rate for {}/{} on {}: {}", source, target, date, e);
                    }
                }
                on_step();
            }
        }
    }

    info!(
        "Backfill from {} to {} done: {} succeeded, {} failed",
        start, today, success_count, error_count
    );
    Ok(BackfillReport {
        success_count,
        error_count,
        days_processed: days_back,
        sources,
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProviderConfig;
    use crate::providers::mock::MockProvider;
    use crate::registry::ProviderRegistry;
    use crate::store::MemoryRateStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn codes(list: &[&str]) -> Vec<CurrencyCode> {
        list.iter().map(|c| CurrencyCode::parse(c).unwrap()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn resolver(store: &MemoryRateStore) -> RateResolver {
        let registry = ProviderRegistry::new(vec![ProviderConfig::new("mock", true, 1)])
            .with_provider(Arc::new(MockProvider::with_seed(11)));
        RateResolver::new(Arc::new(store.clone()), Arc::new(registry))
    }

    #[tokio::test]
    async fn test_backfill_counts_successes_and_failures() {
        let store = MemoryRateStore::new();
        let resolver = resolver(&store);
        let steps = AtomicUsize::new(0);

        // JPY is not known to the mock provider
        let sources = codes(&["EUR", "JPY"]);
        let targets = codes(&["EUR", "USD"]);
        let report = load_historical_rates(
            &resolver,
            &store,
            2,
            &sources,
            &targets,
            today(),
            &|| {
                steps.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

        // Per day: EUR/USD ok, JPY/EUR and JPY/USD fail; three days
        assert_eq!(report.success_count, 3);
        assert_eq!(report.error_count, 6);
        assert_eq!(report.days_processed, 2);
        assert_eq!(steps.load(Ordering::SeqCst), 9);
        assert_eq!(planned_steps(2, &sources, &targets), 9);
        assert_eq!(store.rate_count().await, 3);
        // EUR, JPY and USD were all registered up front
        assert_eq!(store.currency_count().await, 3);
    }

    #[tokio::test]
    async fn test_backfill_is_served_from_cache_on_rerun() {
        let store = MemoryRateStore::new();
        let resolver = resolver(&store);
        let pair = codes(&["GBP", "CHF"]);

        let first = load_historical_rates(&resolver, &store, 0, &pair, &pair, today(), &|| {})
            .await
            .unwrap();
        // Zero days back still resolves today
        assert_eq!(first.days_processed, 0);
        assert_eq!(first.success_count, 2);

        let second = load_historical_rates(&resolver, &store, 0, &pair, &pair, today(), &|| {})
            .await
            .unwrap();
        assert_eq!(second.success_count, 2);
        assert_eq!(store.rate_count().await, 2);
    }

    #[tokio::test]
    async fn test_backfill_defaults_to_major_currencies() {
        let store = MemoryRateStore::new();
        let resolver = resolver(&store);

        let report = load_historical_rates(&resolver, &store, 0, &[], &[], today(), &|| {})
            .await
            .unwrap();
        assert_eq!(report.sources, codes(&["EUR", "USD", "GBP", "CHF"]));
        assert_eq!(report.success_count, 12);
        assert_eq!(report.error_count, 0);
    }
}
