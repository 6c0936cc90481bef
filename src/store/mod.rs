pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::{ExchangeRate, RateStore};
use anyhow::Result;
pub use disk::DiskRateStore;
pub use memory::MemoryRateStore;
use std::sync::Arc;

/// Opens the on-disk store under the configured data directory.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn RateStore>> {
    let path = config.default_data_path()?.join("store");
    Ok(Arc::new(DiskRateStore::open(&path)?))
}

/// Most recently created record; ties go to the provider name sorting last so
/// the answer does not depend on scan order.
pub(crate) fn latest<'a>(
    rates: impl Iterator<Item = &'a ExchangeRate>,
) -> Option<&'a ExchangeRate> {
    rates.max_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.provider.cmp(&b.provider))
    })
}

pub(crate) fn sort_for_history(rates: &mut [ExchangeRate]) {
    rates.sort_by(|a, b| {
        a.valuation_date
            .cmp(&b.valuation_date)
            .then_with(|| a.target.cmp(&b.target))
            .then_with(|| a.provider.cmp(&b.provider))
    });
}
