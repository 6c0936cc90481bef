//! Persistence contract for currencies and exchange rates

use super::currency::{Currency, CurrencyCode};
use super::rate::{ExchangeRate, RateKey};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Cache-of-record for resolved rates.
///
/// Errors returned here mean the store itself is unusable; callers treat
/// them as fatal.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Most recently created rate for the pair and day, from any provider.
    async fn find_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> Result<Option<ExchangeRate>>;

    /// Exact lookup by the natural key.
    async fn get_rate(&self, key: &RateKey) -> Result<Option<ExchangeRate>>;

    /// Inserts, or replaces the value of the record with the same key. The
    /// first `created_at` of a key is kept.
    async fn upsert_rate(&self, rate: ExchangeRate) -> Result<ExchangeRate>;

    /// All rates quoted against `source` with a valuation date in
    /// `[from, to]`, ordered by (date, target, provider).
    async fn rates_for_source(
        &self,
        source: &CurrencyCode,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExchangeRate>>;

    async fn find_currency(&self, code: &CurrencyCode) -> Result<Option<Currency>>;

    /// Returns the stored currency, creating a placeholder (code as name and
    /// symbol) on first reference.
    async fn find_or_create_currency(&self, code: &CurrencyCode) -> Result<Currency>;

    /// Inserts `currency` unless its code exists. Returns whether it was
    /// created.
    async fn seed_currency(&self, currency: Currency) -> Result<bool>;

    /// Known currencies ordered by code.
    async fn list_currencies(&self) -> Result<Vec<Currency>>;
}
