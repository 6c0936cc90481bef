//! Exchange rate records and the result envelope

use super::currency::{CurrencyCode, CurrencyPair};
use super::error::RateError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Fractional digits kept for stored rate values.
pub const RATE_SCALE: u32 = 6;

/// Rounds a rate to the stored precision, halves away from zero.
pub fn normalize_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Natural key of a stored rate. At most one record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub source: CurrencyCode,
    pub target: CurrencyCode,
    pub valuation_date: NaiveDate,
    pub provider: String,
}

impl RateKey {
    /// Byte-ordered key: `SRC/DST/YYYY-MM-DD/provider`. Every prefix of it is
    /// a meaningful scan (by source, by pair, by pair and day).
    pub fn storage_key(&self) -> String {
        format!(
            "{}{}",
            day_prefix(&self.source, &self.target, self.valuation_date),
            self.provider
        )
    }
}

impl Display for RateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} on {} from {}",
            self.source, self.target, self.valuation_date, self.provider
        )
    }
}

pub fn source_prefix(source: &CurrencyCode) -> String {
    format!("{source}/")
}

pub fn day_prefix(source: &CurrencyCode, target: &CurrencyCode, date: NaiveDate) -> String {
    format!("{source}/{target}/{}/", date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub source: CurrencyCode,
    pub target: CurrencyCode,
    pub valuation_date: NaiveDate,
    pub provider: String,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn from_quote(quote: &RateQuote, created_at: DateTime<Utc>) -> Self {
        ExchangeRate {
            source: quote.source.clone(),
            target: quote.target.clone(),
            valuation_date: quote.valuation_date,
            provider: quote.provider.clone(),
            rate: normalize_rate(quote.rate),
            created_at,
        }
    }

    pub fn key(&self) -> RateKey {
        RateKey {
            source: self.source.clone(),
            target: self.target.clone(),
            valuation_date: self.valuation_date,
            provider: self.provider.clone(),
        }
    }

    pub fn to_quote(&self, origin: RateOrigin) -> RateQuote {
        RateQuote {
            source: self.source.clone(),
            target: self.target.clone(),
            valuation_date: self.valuation_date,
            rate: self.rate,
            provider: self.provider.clone(),
            origin,
        }
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}: {} ({})",
            self.source, self.target, self.rate, self.valuation_date
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    /// Served from the rate store without calling any provider.
    Cache,
    /// Freshly fetched from a provider.
    Provider,
}

impl RateOrigin {
    pub fn is_cache(self) -> bool {
        self == RateOrigin::Cache
    }
}

impl Display for RateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateOrigin::Cache => write!(f, "cache"),
            RateOrigin::Provider => write!(f, "provider"),
        }
    }
}

/// Successful payload of a rate resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    #[serde(rename = "source_currency")]
    pub source: CurrencyCode,
    #[serde(rename = "exchanged_currency")]
    pub target: CurrencyCode,
    pub valuation_date: NaiveDate,
    #[serde(rename = "rate_value")]
    pub rate: Decimal,
    pub provider: String,
    pub origin: RateOrigin,
}

impl RateQuote {
    pub fn fetched(
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
        rate: Decimal,
        provider: &str,
    ) -> Self {
        RateQuote {
            source: source.clone(),
            target: target.clone(),
            valuation_date,
            rate,
            provider: provider.to_string(),
            origin: RateOrigin::Provider,
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.source, &self.target)
    }
}

pub type RateResult = Result<RateQuote, RateError>;

/// Serializable success/failure view of any boundary result.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl<T: Serialize + Clone> Envelope<T> {
    pub fn from_result(result: &Result<T, RateError>) -> Self {
        match result {
            Ok(data) => Envelope {
                success: true,
                data: Some(data.clone()),
                error: None,
                kind: None,
            },
            Err(err) => Envelope {
                success: false,
                data: None,
                error: Some(err.to_string()),
                kind: Some(err.kind()),
            },
        }
    }
}
