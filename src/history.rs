//! Time series of stored rates for one source currency

use crate::core::{CurrencyCode, ExchangeRate, RateError, RateStore};
use crate::store::latest;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Rates of one valuation date, keyed by target code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub rates: BTreeMap<CurrencyCode, Decimal>,
}

/// Stored rates quoted against `source` for every date in `[from, to]` that
/// has at least one. Where providers disagree the most recent record wins.
pub async fn rates_history(
    store: &dyn RateStore,
    source: &CurrencyCode,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<HistoryRow>, RateError> {
    if from > to {
        return Err(RateError::Validation(format!(
            "Start date {from} is after end date {to}"
        )));
    }
    if store
        .find_currency(source)
        .await
        .map_err(RateError::Store)?
        .is_none()
    {
        return Err(RateError::NotFound(format!("Currency {source} not found")));
    }

    let records = store
        .rates_for_source(source, from, to)
        .await
        .map_err(RateError::Store)?;
    if records.is_empty() {
        return Err(RateError::NotFound(
            "No rates found for the specified period".to_string(),
        ));
    }

    let mut grouped: BTreeMap<NaiveDate, BTreeMap<CurrencyCode, Vec<&ExchangeRate>>> =
        BTreeMap::new();
    for record in &records {
        grouped
            .entry(record.valuation_date)
            .or_default()
            .entry(record.target.clone())
            .or_default()
            .push(record);
    }

    Ok(grouped
        .into_iter()
        .map(|(date, targets)| HistoryRow {
            date,
            rates: targets
                .into_iter()
                .filter_map(|(target, candidates)| {
                    latest(candidates.into_iter()).map(|r| (target, r.rate))
                })
                .collect(),
        })
        .collect())
}
