//! Currency identity types

use super::error::RateError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// ISO-style three letter currency code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(input: &str) -> Result<Self, RateError> {
        let code = input.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RateError::Validation(format!(
                "Currency code must be three letters, got '{input}'"
            )));
        }
        Ok(CurrencyCode(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = RateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: CurrencyCode,
    pub name: String,
    pub symbol: String,
}

impl Currency {
    pub fn new(code: CurrencyCode, name: &str, symbol: &str) -> Self {
        Currency {
            code,
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }

    /// Record for a code first seen in a provider response: the code doubles
    /// as name and symbol until someone curates it.
    pub fn placeholder(code: &CurrencyCode) -> Self {
        Currency {
            code: code.clone(),
            name: code.to_string(),
            symbol: code.to_string(),
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.name)
    }
}

/// Ordered (source, target) pair, rendered as `SRC/DST`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub source: CurrencyCode,
    pub target: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(source: &CurrencyCode, target: &CurrencyCode) -> Self {
        CurrencyPair {
            source: source.clone(),
            target: target.clone(),
        }
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source, self.target)
    }
}
