//! Configured providers and the fallback order derived from them

use crate::core::config::{AppConfig, ProviderConfig};
use crate::core::{RateError, RateProvider};
use crate::providers::{BUILTIN_PROVIDERS, build_provider};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// One link of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub name: String,
    pub priority: i32,
}

pub struct ProviderRegistry {
    configs: Vec<ProviderConfig>,
    adapters: HashMap<String, Arc<dyn RateProvider>>,
}

impl ProviderRegistry {
    /// Registry with the given configuration and no adapters. Add adapters
    /// with [`ProviderRegistry::with_provider`].
    pub fn new(configs: Vec<ProviderConfig>) -> Self {
        let mut seen = Vec::with_capacity(configs.len());
        let mut unique = Vec::with_capacity(configs.len());
        for config in configs {
            if seen.contains(&config.name) {
                warn!(provider = %config.name, "Duplicate provider configuration ignored");
                continue;
            }
            seen.push(config.name.clone());
            unique.push(config);
        }
        Self {
            configs: unique,
            adapters: HashMap::new(),
        }
    }

    /// Registers `provider` under its own name, replacing any adapter with
    /// that name.
    pub fn with_provider(mut self, provider: Arc<dyn RateProvider>) -> Self {
        self.adapters.insert(provider.name().to_string(), provider);
        self
    }

    /// Every built-in adapter, configured from `config` where it has an entry.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new(config.providers.clone());
        for name in BUILTIN_PROVIDERS {
            let provider_config = registry.configs.iter().find(|c| c.name == name);
            if let Some(provider) = build_provider(name, provider_config, &config.http)? {
                registry = registry.with_provider(provider);
            }
        }
        for provider_config in &registry.configs {
            if !registry.adapters.contains_key(&provider_config.name) {
                warn!(provider = %provider_config.name, "Configured provider has no adapter");
            }
        }
        Ok(registry)
    }

    pub fn resolve_by_name(&self, name: &str) -> Result<Arc<dyn RateProvider>, RateError> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| RateError::UnsupportedProvider(name.to_string()))
    }

    /// Active providers, lowest priority first; equal priorities keep their
    /// configuration order.
    pub fn active_providers_ordered(&self) -> Vec<ProviderDescriptor> {
        let mut active: Vec<ProviderDescriptor> = self
            .configs
            .iter()
            .filter(|c| c.active)
            .map(|c| ProviderDescriptor {
                name: c.name.clone(),
                priority: c.priority,
            })
            .collect();
        active.sort_by_key(|d| d.priority);
        active
    }

    pub fn configured(&self) -> &[ProviderConfig] {
        &self.configs
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }
}
