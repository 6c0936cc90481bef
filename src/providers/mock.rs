use crate::core::rate::normalize_rate;
use crate::core::{CurrencyCode, RateError, RateProvider, RateQuote, RateResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

pub const NAME: &str = "mock";

/// Largest jitter, in millionths of the rate (2%).
const MAX_JITTER_MICROS: i64 = 20_000;

/// Rates against EUR for the few codes the mock understands.
fn base_rate(code: &CurrencyCode) -> Option<Decimal> {
    match code.as_str() {
        "EUR" => Some(Decimal::new(100, 2)),
        "USD" => Some(Decimal::new(108, 2)),
        "GBP" => Some(Decimal::new(85, 2)),
        "CHF" => Some(Decimal::new(98, 2)),
        _ => None,
    }
}

/// Offline provider: `target_base / source_base` from a fixed table, moved by
/// a uniform jitter in [-2%, +2%]. Seed it for reproducible values.
pub struct MockProvider {
    rng: Mutex<StdRng>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn supports(code: &CurrencyCode) -> bool {
        base_rate(code).is_some()
    }

    async fn jitter(&self) -> Decimal {
        let micros = self
            .rng
            .lock()
            .await
            .gen_range(-MAX_JITTER_MICROS..=MAX_JITTER_MICROS);
        Decimal::new(micros, 6)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for MockProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
        valuation_date: NaiveDate,
    ) -> RateResult {
        let (Some(source_rate), Some(target_rate)) = (base_rate(source), base_rate(target)) else {
            return Err(RateError::upstream(
                NAME,
                format!("Currency not supported by Mock provider: {source}/{target}"),
            ));
        };

        let jitter = self.jitter().await;
        let rate = normalize_rate(target_rate / source_rate * (Decimal::ONE + jitter));
        debug!("Mock rate {}/{} = {} (jitter {})", source, target, rate, jitter);

        Ok(RateQuote::fetched(source, target, valuation_date, rate, NAME))
    }
}
