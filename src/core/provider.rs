//! Rate provider abstraction

use super::currency::CurrencyCode;
use super::rate::RateResult;
use async_trait::async_trait;
use chrono::NaiveDate;

/// An external (or simulated) source of exchange rates.
///
/// Implementations normalize whatever their upstream returns into a
/// [`RateResult`]. Transport, parse and upstream errors come back as
/// `Err(RateError::Upstream { .. })`, never as a panic.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Registry name, also stored on every rate this provider supplies.
    fn name(&self) -> &str;

    async fn fetch_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> RateResult;
}
