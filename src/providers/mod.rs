pub mod currencybeacon;
pub mod exchangerate;
pub mod mock;
pub mod openexchangerates;
pub mod util;

use crate::core::RateProvider;
use crate::core::config::{HttpConfig, ProviderConfig};
use anyhow::Result;
use currencybeacon::CurrencyBeaconProvider;
use exchangerate::ExchangeRateApiProvider;
use mock::MockProvider;
use openexchangerates::OpenExchangeRatesProvider;
use std::sync::Arc;
use util::HttpFetcher;

/// Names of the providers this crate ships adapters for.
pub const BUILTIN_PROVIDERS: [&str; 4] = [
    currencybeacon::NAME,
    exchangerate::NAME,
    openexchangerates::NAME,
    mock::NAME,
];

/// Creates the adapter for a built-in provider. `None` for unknown names.
///
/// Providers missing from the configuration are still constructible, with the
/// default endpoint and an API key taken from the environment.
pub fn build_provider(
    name: &str,
    config: Option<&ProviderConfig>,
    http: &HttpConfig,
) -> Result<Option<Arc<dyn RateProvider>>> {
    let config = config
        .cloned()
        .unwrap_or_else(|| ProviderConfig::new(name, false, 0));
    let api_key = config.resolved_api_key();
    let base_url = |default: &str| config.base_url.clone().unwrap_or_else(|| default.to_string());

    let provider: Arc<dyn RateProvider> = match name {
        currencybeacon::NAME => Arc::new(CurrencyBeaconProvider::new(
            &base_url(currencybeacon::DEFAULT_BASE_URL),
            &api_key,
            HttpFetcher::new(http)?,
        )),
        exchangerate::NAME => Arc::new(ExchangeRateApiProvider::new(
            &base_url(exchangerate::DEFAULT_BASE_URL),
            &api_key,
            HttpFetcher::new(http)?,
        )),
        openexchangerates::NAME => Arc::new(OpenExchangeRatesProvider::new(
            &base_url(openexchangerates::DEFAULT_BASE_URL),
            &api_key,
            HttpFetcher::new(http)?,
        )),
        mock::NAME => Arc::new(MockProvider::new()),
        _ => return Ok(None),
    };
    Ok(Some(provider))
}
