use super::latest;
use crate::core::rate::{day_prefix, source_prefix};
use crate::core::{Currency, CurrencyCode, ExchangeRate, RateKey, RateStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Rate store persisted in a fjall keyspace.
///
/// `rates` is keyed by [`RateKey::storage_key`], `currencies` by code; values
/// are JSON. Each record is written by a single `insert`, so readers never see
/// a partial record. Read-modify-write sequences are serialized by
/// `write_lock`.
pub struct DiskRateStore {
    keyspace: Keyspace,
    rates: PartitionHandle,
    currencies: PartitionHandle,
    write_lock: Mutex<()>,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open rate store at {}", path.display()))?;
        let rates = keyspace.open_partition("rates", PartitionCreateOptions::default())?;
        let currencies = keyspace.open_partition("currencies", PartitionCreateOptions::default())?;
        debug!("Opened rate store at {}", path.display());

        Ok(Self {
            keyspace,
            rates,
            currencies,
            write_lock: Mutex::new(()),
        })
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).context("Corrupt record in rate store")
    }

    fn scan_rates(&self, prefix: &str) -> Result<Vec<ExchangeRate>> {
        self.rates
            .prefix(prefix)
            .map(|item| {
                let (_, value) = item?;
                Self::decode(&value)
            })
            .collect()
    }

    fn read_currency(&self, code: &CurrencyCode) -> Result<Option<Currency>> {
        match self.currencies.get(code.as_str().as_bytes())? {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    fn write_currency(&self, currency: &Currency) -> Result<()> {
        self.currencies.insert(
            currency.code.as_str().as_bytes(),
            serde_json::to_vec(currency)?,
        )?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl RateStore for DiskRateStore {
    async fn find_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> Result<Option<ExchangeRate>> {
        let candidates = self.scan_rates(&day_prefix(source, target, valuation_date))?;
        let found = latest(candidates.iter()).cloned();
        debug!(
            "Store {} for {}/{} on {}",
            if found.is_some() { "HIT" } else { "MISS" },
            source,
            target,
            valuation_date
        );
        Ok(found)
    }

    async fn get_rate(&self, key: &RateKey) -> Result<Option<ExchangeRate>> {
        match self.rates.get(key.storage_key().as_bytes())? {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    async fn upsert_rate(&self, mut rate: ExchangeRate) -> Result<ExchangeRate> {
        let _guard = self.write_lock.lock().await;
        let key = rate.key();
        if let Some(existing) = self.get_rate(&key).await? {
            rate.created_at = existing.created_at;
        }
        self.rates
            .insert(key.storage_key().as_bytes(), serde_json::to_vec(&rate)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store PUT for {}", key);
        Ok(rate)
    }

    async fn rates_for_source(
        &self,
        source: &CurrencyCode,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExchangeRate>> {
        let mut rates: Vec<ExchangeRate> = self
            .scan_rates(&source_prefix(source))?
            .into_iter()
            .filter(|r| r.valuation_date >= from && r.valuation_date <= to)
            .collect();
        super::sort_for_history(&mut rates);
        Ok(rates)
    }

    async fn find_currency(&self, code: &CurrencyCode) -> Result<Option<Currency>> {
        self.read_currency(code)
    }

    async fn find_or_create_currency(&self, code: &CurrencyCode) -> Result<Currency> {
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read_currency(code)? {
            return Ok(existing);
        }
        debug!("Creating placeholder currency {}", code);
        let currency = Currency::placeholder(code);
        self.write_currency(&currency)?;
        Ok(currency)
    }

    async fn seed_currency(&self, currency: Currency) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.read_currency(&currency.code)?.is_some() {
            return Ok(false);
        }
        self.write_currency(&currency)?;
        Ok(true)
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>> {
        self.currencies
            .iter()
            .map(|item| {
                let (_, value) = item?;
                Self::decode(&value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn rate(target: &str, day: u32, provider: &str, value: rust_decimal::Decimal) -> ExchangeRate {
        ExchangeRate {
            source: code("EUR"),
            target: code(target),
            valuation_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            provider: provider.to_string(),
            rate: value,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_disk_store_upsert_and_find() {
        let dir = tempdir().unwrap();
        let store = DiskRateStore::open(dir.path()).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        assert!(store.find_rate(&code("EUR"), &code("USD"), day).await.unwrap().is_none());

        store.upsert_rate(rate("USD", 1, "mock", dec!(1.08))).await.unwrap();
        store.upsert_rate(rate("USD", 1, "mock", dec!(1.08))).await.unwrap();

        let all = store.rates_for_source(&code("EUR"), day, day).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rate, dec!(1.08));

        let found = store.find_rate(&code("EUR"), &code("USD"), day).await.unwrap();
        assert_eq!(found.unwrap().provider, "mock");
    }

    #[tokio::test]
    async fn test_disk_store_latest_provider_wins() {
        let dir = tempdir().unwrap();
        let store = DiskRateStore::open(dir.path()).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let older = rate("USD", 1, "currencybeacon", dec!(1.07));
        let mut newer = rate("USD", 1, "mock", dec!(1.081234));
        newer.created_at = older.created_at + Duration::seconds(1);
        store.upsert_rate(newer).await.unwrap();
        store.upsert_rate(older).await.unwrap();

        let found = store
            .find_rate(&code("EUR"), &code("USD"), day)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.provider, "mock");
        assert_eq!(found.rate, dec!(1.081234));
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskRateStore::open(dir.path()).unwrap();
            store.upsert_rate(rate("GBP", 2, "mock", dec!(0.85))).await.unwrap();
            store.find_or_create_currency(&code("GBP")).await.unwrap();
        }

        let store = DiskRateStore::open(dir.path()).unwrap();
        let key = rate("GBP", 2, "mock", dec!(0.85)).key();
        assert_eq!(store.get_rate(&key).await.unwrap().unwrap().rate, dec!(0.85));
        assert_eq!(store.list_currencies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disk_store_history_range_and_order() {
        let dir = tempdir().unwrap();
        let store = DiskRateStore::open(dir.path()).unwrap();

        store.upsert_rate(rate("USD", 3, "mock", dec!(1.1))).await.unwrap();
        store.upsert_rate(rate("GBP", 2, "mock", dec!(0.85))).await.unwrap();
        store.upsert_rate(rate("CHF", 2, "mock", dec!(0.98))).await.unwrap();
        store.upsert_rate(rate("USD", 9, "mock", dec!(1.2))).await.unwrap();

        let from = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        let rates = store.rates_for_source(&code("EUR"), from, to).await.unwrap();

        let got: Vec<(u32, &str)> = rates
            .iter()
            .map(|r| (chrono::Datelike::day(&r.valuation_date), r.target.as_str()))
            .collect();
        assert_eq!(got, vec![(2, "CHF"), (2, "GBP"), (3, "USD")]);
    }

    #[tokio::test]
    async fn test_disk_store_currency_seed_and_placeholder() {
        let dir = tempdir().unwrap();
        let store = DiskRateStore::open(dir.path()).unwrap();

        assert!(
            store
                .seed_currency(Currency::new(code("EUR"), "Euro", "€"))
                .await
                .unwrap()
        );
        let euro = store.find_or_create_currency(&code("EUR")).await.unwrap();
        assert_eq!(euro.name, "Euro");

        let sek = store.find_or_create_currency(&code("SEK")).await.unwrap();
        assert_eq!(sek, Currency::placeholder(&code("SEK")));

        let codes: Vec<String> = store
            .list_currencies()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code.to_string())
            .collect();
        assert_eq!(codes, vec!["EUR", "SEK"]);
    }
}
