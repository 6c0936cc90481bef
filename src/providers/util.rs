use crate::core::config::HttpConfig;
use anyhow::{Context, Error, Result, anyhow};
use rust_decimal::Decimal;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await.map_err(anyhow::Error::from) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// HTTP plumbing shared by the live providers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mycurrency/1.0")
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// GETs `url` and returns the body of a 2xx response.
    pub async fn get_text(&self, url: &reqwest::Url) -> Result<String> {
        let response = with_retry(
            || async { self.client.get(url.clone()).send().await },
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(|e| anyhow!("Request error: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }
}

/// Builds `base` + `path` with URL-encoded query parameters.
pub fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Url> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    reqwest::Url::parse_with_params(&raw, params).with_context(|| format!("Invalid URL: {raw}"))
}

/// Converts a JSON number to a decimal through its textual form, so no binary
/// float rounding leaks into the rate.
pub fn decimal_from_json(value: &serde_json::Number) -> Result<Decimal> {
    let text = value.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .with_context(|| format!("Rate is not a decimal number: {text}"))
}

/// A zero or negative rate cannot be stored or converted with.
pub fn ensure_positive(rate: Decimal, what: &str) -> Result<Decimal> {
    if rate <= Decimal::ZERO {
        return Err(anyhow!("Unusable {what} {rate}"));
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_from_json_keeps_digits() {
        let n: serde_json::Number = serde_json::from_str("1.0842").unwrap();
        assert_eq!(decimal_from_json(&n).unwrap(), dec!(1.0842));

        let n: serde_json::Number = serde_json::from_str("150").unwrap();
        assert_eq!(decimal_from_json(&n).unwrap(), dec!(150));

        let n: serde_json::Number = serde_json::from_str("1.5e-5").unwrap();
        assert_eq!(decimal_from_json(&n).unwrap(), dec!(0.000015));
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive(dec!(0.86), "rate").unwrap(), dec!(0.86));
        assert_eq!(
            ensure_positive(dec!(0), "rate").unwrap_err().to_string(),
            "Unusable rate 0"
        );
        assert!(ensure_positive(dec!(-1.2), "rate").is_err());
    }

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "http://localhost:1234/",
            "/historical",
            &[("base", "EUR"), ("date", "2024-01-02")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:1234/historical?base=EUR&date=2024-01-02"
        );
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_retries() {
        let mut calls = 0;
        let client = reqwest::Client::new();
        let result = with_retry(
            || {
                calls += 1;
                // Nothing listens on port 9 of localhost
                client.get("http://127.0.0.1:9/").send()
            },
            2,
            1,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }
}
