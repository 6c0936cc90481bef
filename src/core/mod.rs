//! Core domain types and the traits at the I/O seams

pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod provider;
pub mod rate;
pub mod store;

// Re-export main types for cleaner imports
pub use currency::{Currency, CurrencyCode, CurrencyPair};
pub use error::RateError;
pub use provider::RateProvider;
pub use rate::{Envelope, ExchangeRate, RateKey, RateOrigin, RateQuote, RateResult};
pub use store::RateStore;
