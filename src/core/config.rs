use super::currency::{Currency, CurrencyCode};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_PRIORITY: i32 = 999;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    /// Lower is tried first.
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(name: &str, active: bool, priority: i32) -> Self {
        ProviderConfig {
            name: name.to_string(),
            active,
            priority,
            api_key: None,
            base_url: None,
        }
    }

    /// Configured key, or `<NAME>_API_KEY` from the environment.
    pub fn resolved_api_key(&self) -> String {
        self.api_key.clone().unwrap_or_else(|| {
            std::env::var(format!("{}_API_KEY", self.name.to_ascii_uppercase()))
                .unwrap_or_default()
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "HttpConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "HttpConfig::default_retries")]
    pub retries: usize,
    #[serde(default = "HttpConfig::default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl HttpConfig {
    fn default_timeout_secs() -> u64 {
        10
    }

    fn default_retries() -> usize {
        2
    }

    fn default_retry_delay_ms() -> u64 {
        500
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: Self::default_timeout_secs(),
            retries: Self::default_retries(),
            retry_delay_ms: Self::default_retry_delay_ms(),
        }
    }
}

fn default_codes() -> Vec<CurrencyCode> {
    ["EUR", "USD", "GBP", "CHF"]
        .iter()
        .filter_map(|c| CurrencyCode::parse(c).ok())
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BackfillConfig {
    #[serde(default = "BackfillConfig::default_days")]
    pub days: u32,
    #[serde(default = "default_codes")]
    pub sources: Vec<CurrencyCode>,
    #[serde(default = "default_codes")]
    pub targets: Vec<CurrencyCode>,
}

impl BackfillConfig {
    fn default_days() -> u32 {
        30
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        BackfillConfig {
            days: Self::default_days(),
            sources: default_codes(),
            targets: default_codes(),
        }
    }
}

fn default_currencies() -> Vec<Currency> {
    [
        ("EUR", "Euro", "€"),
        ("USD", "US Dollar", "$"),
        ("GBP", "British Pound", "£"),
        ("CHF", "Swiss Franc", "Fr"),
    ]
    .iter()
    .filter_map(|(code, name, symbol)| {
        CurrencyCode::parse(code)
            .ok()
            .map(|code| Currency::new(code, name, symbol))
    })
    .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    pub data_path: Option<String>,
    #[serde(default = "default_currencies")]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub backfill: BackfillConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: vec![ProviderConfig::new("mock", true, 1)],
            http: HttpConfig::default(),
            data_path: None,
            currencies: default_currencies(),
            backfill: BackfillConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "mycurrency", "mycurrency")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "mycurrency", "mycurrency")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  - name: currencybeacon
    active: true
    priority: 1
    api_key: "beacon-key"
  - name: openexchangerates
    active: false
    priority: 2
    base_url: "http://example.com/oxr"
  - name: mock
    active: true
http:
  timeout_secs: 3
data_path: "/tmp/mycurrency"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.providers.len(), 3);

        let beacon = &config.providers[0];
        assert_eq!(beacon.name, "currencybeacon");
        assert!(beacon.active);
        assert_eq!(beacon.priority, 1);
        assert_eq!(beacon.resolved_api_key(), "beacon-key");

        let oxr = &config.providers[1];
        assert!(!oxr.active);
        assert_eq!(oxr.base_url.as_deref(), Some("http://example.com/oxr"));

        // Unspecified priority sorts last
        let mock = &config.providers[2];
        assert_eq!(mock.priority, DEFAULT_PRIORITY);

        assert_eq!(config.http.timeout(), Duration::from_secs(3));
        assert_eq!(config.http.retries, 2);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/mycurrency")
        );

        // Seed currencies and backfill codes fall back to the four majors
        let codes: Vec<&str> = config.currencies.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["EUR", "USD", "GBP", "CHF"]);
        assert_eq!(config.currencies[0].symbol, "€");
        assert_eq!(config.backfill.days, 30);
        assert_eq!(config.backfill.sources.len(), 4);
    }

    #[test]
    fn test_provider_defaults_to_inactive() {
        let yaml_str = r#"
providers:
  - name: exchangerate
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert!(!config.providers[0].active);
        assert_eq!(config.providers[0].priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn test_invalid_currency_code_is_rejected() {
        let yaml_str = r#"
currencies:
  - code: "EURO"
    name: "Euro"
    symbol: "€"
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }
}
