//! Source of today's exchange rates

use super::error::Result;
use super::rate::Quote;
use async_trait::async_trait;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the currently published (currency, rate) pairs.
    async fn fetch_rates(&self) -> Result<Vec<Quote>>;
}
