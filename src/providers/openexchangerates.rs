use super::util::{HttpFetcher, build_url, decimal_from_json, ensure_positive};
use crate::core::{CurrencyCode, RateError, RateProvider, RateQuote, RateResult};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const NAME: &str = "openexchangerates";
pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org/api";
const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Open Exchange Rates historical endpoint. Rates come relative to a single
/// base currency (USD on the free plan); any other pair is derived as
/// `target_base / source_base` from the same response.
pub struct OpenExchangeRatesProvider {
    base_url: String,
    app_id: String,
    http: HttpFetcher,
}

#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    base: Option<String>,
    rates: Option<HashMap<String, serde_json::Number>>,
}

/// Rate of `code` against `base`. The base itself is 1; a missing, zero or
/// negative rate is unusable.
fn base_relative_rate(
    rates: &HashMap<String, serde_json::Number>,
    base: &str,
    code: &CurrencyCode,
) -> Result<Decimal> {
    if code.as_str() == base {
        return Ok(Decimal::ONE);
    }
    let rate = rates
        .get(code.as_str())
        .map(decimal_from_json)
        .transpose()?
        .ok_or_else(|| anyhow!("No {base} rate reported for {code}"))?;
    ensure_positive(rate, &format!("{base} rate for {code}"))
}

/// Cross rate `source -> target` from base-relative rates.
fn derive_cross_rate(
    rates: &HashMap<String, serde_json::Number>,
    base: &str,
    source: &CurrencyCode,
    target: &CurrencyCode,
) -> Result<Decimal> {
    let source_rate = base_relative_rate(rates, base, source)?;
    let target_rate = base_relative_rate(rates, base, target)?;
    target_rate
        .checked_div(source_rate)
        .ok_or_else(|| anyhow!("Cannot derive {source}/{target} from {base} rates"))
}

impl OpenExchangeRatesProvider {
    pub fn new(base_url: &str, app_id: &str, http: HttpFetcher) -> Self {
        Self {
            base_url: base_url.to_string(),
            app_id: app_id.to_string(),
            http,
        }
    }

    async fn request_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> Result<Decimal> {
        let path = format!("/historical/{}.json", valuation_date.format("%Y-%m-%d"));
        let url = build_url(&self.base_url, &path, &[("app_id", self.app_id.as_str())])?;
        debug!("Requesting historical rates for {}", valuation_date);

        let text = self.http.get_text(&url).await?;
        let data: HistoricalResponse = serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse OpenExchangeRates response for {valuation_date}")
        })?;

        let rates = data
            .rates
            .ok_or_else(|| anyhow!("Invalid response from OpenExchangeRates: no rates"))?;
        let base = data.base.as_deref().unwrap_or(DEFAULT_BASE_CURRENCY);
        derive_cross_rate(&rates, base, source, target)
    }
}

#[async_trait]
impl RateProvider for OpenExchangeRatesProvider {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(
        name = "OpenExchangeRatesFetch",
        skip_all,
        fields(source = %source, target = %target, date = %valuation_date)
    )]
    async fn fetch_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> RateResult {
        let rate = self
            .request_rate(source, target, valuation_date)
            .await
            .map_err(|e| RateError::upstream(NAME, format!("{e:#}")))?;
        Ok(RateQuote::fetched(source, target, valuation_date, rate, NAME))
    }
}
