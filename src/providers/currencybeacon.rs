use super::util::{HttpFetcher, build_url, decimal_from_json, ensure_positive};
use crate::core::{CurrencyCode, RateError, RateProvider, RateQuote, RateResult};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const NAME: &str = "currencybeacon";
pub const DEFAULT_BASE_URL: &str = "https://api.currencybeacon.com/v1";

pub struct CurrencyBeaconProvider {
    base_url: String,
    api_key: String,
    http: HttpFetcher,
}

impl CurrencyBeaconProvider {
    pub fn new(base_url: &str, api_key: &str, http: HttpFetcher) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            http,
        }
    }

    async fn request_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> Result<Decimal> {
        let date = valuation_date.format("%Y-%m-%d").to_string();
        let url = build_url(
            &self.base_url,
            "/historical",
            &[
                ("api_key", self.api_key.as_str()),
                ("base", source.as_str()),
                ("symbols", target.as_str()),
                ("date", date.as_str()),
            ],
        )?;
        debug!("Requesting historical rate {}/{} for {}", source, target, date);

        let text = self.http.get_text(&url).await?;
        let data: BeaconResponse = serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse CurrencyBeacon response for {source}/{target}")
        })?;

        let value = data
            .rates()
            .and_then(|rates| rates.get(target.as_str()))
            .ok_or_else(|| anyhow!("Invalid response from CurrencyBeacon: no rate for {target}"))?;
        ensure_positive(decimal_from_json(value)?, "CurrencyBeacon rate")
    }
}

#[derive(Debug, Deserialize)]
struct BeaconRates {
    rates: Option<HashMap<String, serde_json::Number>>,
}

/// The API has shipped both a flat body and one wrapped in `response`.
#[derive(Debug, Deserialize)]
struct BeaconResponse {
    rates: Option<HashMap<String, serde_json::Number>>,
    response: Option<BeaconRates>,
}

impl BeaconResponse {
    fn rates(&self) -> Option<&HashMap<String, serde_json::Number>> {
        self.rates
            .as_ref()
            .or_else(|| self.response.as_ref().and_then(|r| r.rates.as_ref()))
    }
}

#[async_trait]
impl RateProvider for CurrencyBeaconProvider {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(
        name = "CurrencyBeaconFetch",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HttpConfig;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn provider(server: &MockServer) -> CurrencyBeaconProvider {
        let http = HttpFetcher::new(&HttpConfig {
            retries: 0,
            ..HttpConfig::default()
        })
        .unwrap();
        CurrencyBeaconProvider::new(&server.uri(), "secret", http)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    #[tokio::test]
    async fn test_successful_historical_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .and(query_param("api_key", "secret"))
            .and(query_param("base", "EUR"))
            .and(query_param("symbols", "USD"))
            .and(query_param("date", "2024-02-29"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"date": "2024-02-29", "base": "EUR", "rates": {"USD": 1.0812}}"#),
            )
            .mount(&server)
            .await;

        let quote = provider(&server)
            .fetch_rate(&code("EUR"), &code("USD"), day())
            .await
            .unwrap();
        assert_eq!(quote.rate, dec!(1.0812));
        assert_eq!(quote.provider, "currencybeacon");
        assert_eq!(quote.valuation_date, day());
        assert!(!quote.origin.is_cache());
    }

    #[tokio::test]
    async fn test_wrapped_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"meta": {"code": 200}, "response": {"rates": {"GBP": 0.8571}}}"#),
            )
            .mount(&server)
            .await;

        let quote = provider(&server)
            .fetch_rate(&code("EUR"), &code("GBP"), day())
            .await
            .unwrap();
        assert_eq!(quote.rate, dec!(0.8571));
    }

    #[tokio::test]
    async fn test_missing_rate_key_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"CHF": 0.97}}"#),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch_rate(&code("EUR"), &code("USD"), day())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream");
        assert!(err.to_string().contains("Invalid response from CurrencyBeacon"));
    }

    #[tokio::test]
    async fn test_zero_rate_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"USD": 0}}"#),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch_rate(&code("EUR"), &code("USD"), day())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider currencybeacon failed: Unusable CurrencyBeacon rate 0"
        );
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"rates": {"USD": 1.08}}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let http = HttpFetcher::new(&HttpConfig {
            timeout_secs: 1,
            retries: 0,
            ..HttpConfig::default()
        })
        .unwrap();
        let err = CurrencyBeaconProvider::new(&server.uri(), "secret", http)
            .fetch_rate(&code("EUR"), &code("USD"), day())
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Upstream { ref provider, .. } if provider == NAME));
        assert!(err.to_string().contains("Request error"));
    }

    #[tokio::test]
    async fn test_http_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch_rate(&code("EUR"), &code("USD"), day())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider currencybeacon failed: HTTP error: 401 Unauthorized"
        );
    }
}
