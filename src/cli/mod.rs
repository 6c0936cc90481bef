//! Terminal front end: one module per command

pub mod backfill;
pub mod convert;
pub mod currencies;
pub mod history;
pub mod providers;
pub mod rate;
pub mod seed;
pub mod setup;
pub mod ui;

use crate::core::{CurrencyCode, RateError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// `YYYY-MM-DD`, or `today` when absent.
pub fn parse_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, RateError> {
    match input {
        None => Ok(today),
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
            RateError::Validation(format!("Date must be YYYY-MM-DD, got '{text}'"))
        }),
    }
}

pub fn parse_amount(input: &str) -> Result<Decimal, RateError> {
    let text = input.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| RateError::Validation(format!("Amount must be a decimal number, got '{input}'")))
}

pub fn parse_codes(inputs: &[String]) -> Result<Vec<CurrencyCode>, RateError> {
    inputs.iter().map(|c| CurrencyCode::parse(c)).collect()
}
