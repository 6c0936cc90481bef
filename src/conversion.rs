//! Amount conversion on top of the rate resolver

use crate::core::{CurrencyCode, RateError, RateOrigin};
use crate::resolver::RateResolver;
use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::debug;

/// Fractional digits of a converted amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Successful conversion payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    #[serde(rename = "source_currency")]
    pub source: CurrencyCode,
    pub amount: Decimal,
    #[serde(rename = "exchanged_currency")]
    pub target: CurrencyCode,
    pub converted_amount: Decimal,
    pub rate: Decimal,
    pub valuation_date: NaiveDate,
    pub provider: String,
    pub origin: RateOrigin,
}

pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub struct CurrencyConverter {
    resolver: RateResolver,
}

impl CurrencyConverter {
    pub fn new(resolver: RateResolver) -> Self {
        Self { resolver }
    }

    /// Converts `amount` of `source` into `target` at the rate resolved for
    /// `valuation_date` (today when absent). Resolver failures are returned
    /// unchanged.
    pub async fn convert(
        &self,
        source: &CurrencyCode,
        amount: Decimal,
        target: &CurrencyCode,
        valuation_date: Option<NaiveDate>,
        provider: Option<&str>,
    ) -> Result<Conversion, RateError> {
        if amount < Decimal::ZERO {
            return Err(RateError::Validation(format!(
                "Amount must not be negative, got {amount}"
            )));
        }
        let valuation_date = valuation_date.unwrap_or_else(|| Utc::now().date_naive());

        let quote = self
            .resolver
            .resolve(source, target, valuation_date, provider)
            .await?;
        let product = amount.checked_mul(quote.rate).ok_or_else(|| {
            RateError::Validation(format!(
                "Amount {amount} is too large to convert at rate {}",
                quote.rate
            ))
        })?;
        let converted_amount = round_amount(product);
        debug!(
            "Converted {} {} to {} {} at {}",
            amount, source, converted_amount, target, quote.rate
        );

        Ok(Conversion {
            source: quote.source,
            amount,
            target: quote.target,
            converted_amount,
            rate: quote.rate,
            valuation_date: quote.valuation_date,
            provider: quote.provider,
            origin: quote.origin,
        })
    }
}
