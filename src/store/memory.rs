use super::latest;
use crate::core::{Currency, CurrencyCode, ExchangeRate, RateKey, RateStore};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    currencies: BTreeMap<CurrencyCode, Currency>,
    rates: HashMap<RateKey, ExchangeRate>,
}

/// In-memory rate store. One lock guards both tables so every operation is
/// atomic with respect to the others.
#[derive(Clone, Default)]
pub struct MemoryRateStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rate_count(&self) -> usize {
        self.inner.lock().await.rates.len()
    }

    pub async fn currency_count(&self) -> usize {
        self.inner.lock().await.currencies.len()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn find_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> Result<Option<ExchangeRate>> {
        let tables = self.inner.lock().await;
        let found = latest(tables.rates.values().filter(|r| {
            &r.source == source && &r.target == target && r.valuation_date == valuation_date
        }));
        debug!(
            "Store {} for {}/{} on {}",
            if found.is_some() { "HIT" } else { "MISS" },
            source,
            target,
            valuation_date
        );
        Ok(found.cloned())
    }

    async fn get_rate(&self, key: &RateKey) -> Result<Option<ExchangeRate>> {
        Ok(self.inner.lock().await.rates.get(key).cloned())
    }

    async fn upsert_rate(&self, mut rate: ExchangeRate) -> Result<ExchangeRate> {
        let mut tables = self.inner.lock().await;
        let key = rate.key();
        if let Some(existing) = tables.rates.get(&key) {
            rate.created_at = existing.created_at;
        }
        debug!("Store PUT for {}", key);
        tables.rates.insert(key, rate.clone());
        Ok(rate)
    }

    async fn rates_for_source(
        &self,
        source: &CurrencyCode,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExchangeRate>> {
        let tables = self.inner.lock().await;
        let mut rates: Vec<ExchangeRate> = tables
            .rates
            .values()
            .filter(|r| &r.source == source && r.valuation_date >= from && r.valuation_date <= to)
            .cloned()
            .collect();
        super::sort_for_history(&mut rates);
        Ok(rates)
    }

    async fn find_currency(&self, code: &CurrencyCode) -> Result<Option<Currency>> {
        Ok(self.inner.lock().await.currencies.get(code).cloned())
    }

    async fn find_or_create_currency(&self, code: &CurrencyCode) -> Result<Currency> {
        let mut tables = self.inner.lock().await;
        let currency = tables
            .currencies
            .entry(code.clone())
            .or_insert_with(|| {
                debug!("Creating placeholder currency {}", code);
                Currency::placeholder(code)
            })
            .clone();
        Ok(currency)
    }

    async fn seed_currency(&self, currency: Currency) -> Result<bool> {
        let mut tables = self.inner.lock().await;
        if tables.currencies.contains_key(&currency.code) {
            return Ok(false);
        }
        tables.currencies.insert(currency.code.clone(), currency);
        Ok(true)
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>> {
        Ok(self.inner.lock().await.currencies.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn rate(provider: &str, value: rust_decimal::Decimal) -> ExchangeRate {
        ExchangeRate {
            source: code("EUR"),
            target: code("USD"),
            valuation_date: day(),
            provider: provider.to_string(),
            rate: value,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryRateStore::new();

        store.upsert_rate(rate("mock", dec!(1.08))).await.unwrap();
        store.upsert_rate(rate("mock", dec!(1.08))).await.unwrap();

        assert_eq!(store.rate_count().await, 1);
        let found = store.find_rate(&code("EUR"), &code("USD"), day()).await.unwrap();
        assert_eq!(found.unwrap().rate, dec!(1.08));
    }

    #[tokio::test]
    async fn test_upsert_replaces_value_and_keeps_created_at() {
        let store = MemoryRateStore::new();
        let first = store.upsert_rate(rate("mock", dec!(1.08))).await.unwrap();

        let mut refetched = rate("mock", dec!(1.09));
        refetched.created_at = first.created_at + Duration::seconds(30);
        let stored = store.upsert_rate(refetched).await.unwrap();

        assert_eq!(stored.rate, dec!(1.09));
        assert_eq!(stored.created_at, first.created_at);
        assert_eq!(store.rate_count().await, 1);
    }

    #[tokio::test]
    async fn test_providers_coexist_and_latest_wins() {
        let store = MemoryRateStore::new();
        let older = rate("exchangerate", dec!(1.07));
        let mut newer = rate("mock", dec!(1.08));
        newer.created_at = older.created_at + Duration::seconds(5);

        store.upsert_rate(newer).await.unwrap();
        store.upsert_rate(older).await.unwrap();

        assert_eq!(store.rate_count().await, 2);
        let found = store
            .find_rate(&code("EUR"), &code("USD"), day())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.provider, "mock");
        assert!(
            store
                .find_rate(&code("USD"), &code("EUR"), day())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_find_or_create_currency_once() {
        let store = MemoryRateStore::new();

        let created = store.find_or_create_currency(&code("JPY")).await.unwrap();
        assert_eq!(created, Currency::placeholder(&code("JPY")));

        let again = store.find_or_create_currency(&code("JPY")).await.unwrap();
        assert_eq!(again, created);
        assert_eq!(store.currency_count().await, 1);
    }

    #[tokio::test]
    async fn test_seed_does_not_overwrite() {
        let store = MemoryRateStore::new();
        store.find_or_create_currency(&code("EUR")).await.unwrap();

        let seeded = store
            .seed_currency(Currency::new(code("EUR"), "Euro", "€"))
            .await
            .unwrap();
        assert!(!seeded);
        assert!(
            store
                .seed_currency(Currency::new(code("USD"), "US Dollar", "$"))
                .await
                .unwrap()
        );

        let currencies = store.list_currencies().await.unwrap();
        assert_eq!(currencies.len(), 2);
        assert_eq!(currencies[0].name, "EUR");
        assert_eq!(currencies[1].name, "US Dollar");
    }
}
