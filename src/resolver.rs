//! Cache-first rate resolution over the provider fallback chain

use crate::core::{
    CurrencyCode, ExchangeRate, RateError, RateOrigin, RateProvider, RateQuote, RateResult,
    RateStore,
};
use crate::registry::ProviderRegistry;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Resolves a rate for (source, target, date): the store first, then either
/// the explicitly requested provider or the active providers in priority
/// order. Every freshly fetched rate is persisted before it is returned.
#[derive(Clone)]
pub struct RateResolver {
    store: Arc<dyn RateStore>,
    registry: Arc<ProviderRegistry>,
}

impl RateResolver {
    pub fn new(store: Arc<dyn RateStore>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<dyn RateStore> {
        &self.store
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// With `provider` set, the store is bypassed and a failure of that
    /// provider is returned as is. Without it, a stored rate from any provider
    /// is served before any adapter is called.
    #[instrument(
        name = "ResolveRate",
        skip_all,
        fields(source = %source, target = %target, date = %valuation_date, provider = ?provider)
    )]
    pub async fn resolve(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
        provider: Option<&str>,
    ) -> RateResult {
        if let Some(name) = provider {
            let adapter = self.registry.resolve_by_name(name)?;
            let quote = adapter.fetch_rate(source, target, valuation_date).await?;
            return self.persist(quote).await;
        }

        let cached = self
            .store
            .find_rate(source, target, valuation_date)
            .await
            .map_err(RateError::Store)?;
        if let Some(rate) = cached {
            debug!("Cache hit from {}", rate.provider);
            return Ok(rate.to_quote(RateOrigin::Cache));
        }

        self.resolve_from_chain(source, target, valuation_date).await
    }

    async fn resolve_from_chain(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> RateResult {
        for descriptor in self.registry.active_providers_ordered() {
            let adapter = match self.registry.resolve_by_name(&descriptor.name) {
                Ok(adapter) => adapter,
                Err(e) => {
                    warn!(provider = %descriptor.name, error = %e, "Skipping provider");
                    continue;
                }
            };

            match self.fetch_and_persist(adapter.as_ref(), source, target, valuation_date).await {
                Ok(quote) => {
                    info!(provider = %descriptor.name, "Rate {}/{} fetched", source, target);
                    return Ok(quote);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(provider = %descriptor.name, error = %e, "Provider failed, trying next"),
            }
        }

        Err(RateError::NoProviderAvailable)
    }

    async fn fetch_and_persist(
        &self,
        adapter: &dyn RateProvider,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> RateResult {
        let quote = adapter.fetch_rate(source, target, valuation_date).await?;
        self.persist(quote).await
    }

    /// Registers both currencies and upserts the record. The returned quote
    /// carries the stored (rounded) rate.
    async fn persist(&self, quote: RateQuote) -> RateResult {
        self.store
            .find_or_create_currency(&quote.source)
            .await
            .map_err(RateError::Store)?;
        self.store
            .find_or_create_currency(&quote.target)
            .await
            .map_err(RateError::Store)?;

        let stored = self
            .store
            .upsert_rate(ExchangeRate::from_quote(&quote, Utc::now()))
            .await
            .map_err(RateError::Store)?;
        Ok(stored.to_quote(RateOrigin::Provider))
    }
}
