use crate::core::{Currency, RateStore};
use anyhow::{Context, Result};
use tracing::debug;

/// Inserts each currency whose code is not stored yet. Returns how many were
/// created; existing records are left untouched.
pub async fn seed_currencies(store: &dyn RateStore, currencies: &[Currency]) -> Result<usize> {
    let mut created = 0;
    for currency in currencies {
        let code = currency.code.clone();
        if store
            .seed_currency(currency.clone())
            .await
            .with_context(|| format!("Failed to seed currency {code}"))?
        {
            debug!("Seeded currency {}", code);
            created += 1;
        }
    }
    Ok(created)
}

pub async fn run(store: &dyn RateStore, currencies: &[Currency]) -> Result<()> {
    let created = seed_currencies(store, currencies).await?;
    println!(
        "Seeded {} new currencies ({} already present)",
        created,
        currencies.len() - created
    );
    Ok(())
}
