use super::util::{HttpFetcher, build_url, decimal_from_json, ensure_positive};
use crate::core::{CurrencyCode, RateError, RateProvider, RateQuote, RateResult};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

pub const NAME: &str = "exchangerate";
pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// ExchangeRate-API pair endpoint. The endpoint only serves the current
/// rate; it is recorded under the requested valuation date.
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
    http: HttpFetcher,
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    conversion_rate: Option<serde_json::Number>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str, http: HttpFetcher) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            http,
        }
    }

    async fn request_rate(&self, source: &CurrencyCode, target: &CurrencyCode) -> Result<Decimal> {
        let path = format!("/{}/pair/{}/{}", self.api_key, source, target);
        let url = build_url(&self.base_url, &path, &[])?;
        debug!("Requesting pair rate {}/{}", source, target);

        let text = self.http.get_text(&url).await?;
        let data: PairResponse = serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse ExchangeRate API response for {source}/{target}")
        })?;

        if data.result != "success" {
            return Err(anyhow!(
                "Invalid response from ExchangeRate API: {}",
                data.error_type.as_deref().unwrap_or(&data.result)
            ));
        }
        let value = data
            .conversion_rate
            .ok_or_else(|| anyhow!("Invalid response from ExchangeRate API: no conversion_rate"))?;
        ensure_positive(decimal_from_json(&value)?, "ExchangeRate API rate")
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(
        name = "ExchangeRateApiFetch",
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
            .request_rate(source, target)
            .await
            .map_err(|e| RateError::upstream(NAME, format!("{e:#}")))?;
        Ok(RateQuote::fetched(source, target, valuation_date, rate, NAME))
    }
}
