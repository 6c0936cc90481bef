//! Failure taxonomy shared by every boundary operation

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    /// Malformed caller input (codes, dates, amounts).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Unknown currency, or no stored rate for a period.
    #[error("{0}")]
    NotFound(String),

    /// Transport, parse or upstream-reported failure of a single provider.
    #[error("Provider {provider} failed: {message}")]
    Upstream { provider: String, message: String },

    /// An explicitly requested provider name is not known.
    #[error("Provider {0} not supported")]
    UnsupportedProvider(String),

    /// Every provider in the fallback chain failed, or none is active.
    #[error("no provider could supply a rate")]
    NoProviderAvailable,

    /// The rate store is unusable. Never swallowed by the fallback loop.
    #[error("Rate store failure: {0:#}")]
    Store(#[source] anyhow::Error),
}

impl RateError {
    pub fn upstream(provider: &str, err: impl std::fmt::Display) -> Self {
        RateError::Upstream {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    /// Stable category name, used in rendered envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            RateError::Validation(_) => "validation",
            RateError::NotFound(_) | RateError::NoProviderAvailable => "not_found",
            RateError::Upstream { .. } => "upstream",
            RateError::UnsupportedProvider(_) => "configuration",
            RateError::Store(_) => "store",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RateError::Store(_))
    }
}
