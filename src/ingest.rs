//! Scheduled ingestion of the day's rates into the store

use crate::core::error::Result;
use crate::core::rate::{RateRecord, format_date};
use crate::core::source::RateSource;
use crate::core::store::RateStore;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    pub date: NaiveDate,
    pub written: usize,
}

pub struct RateIngester {
    source: Arc<dyn RateSource>,
    store: Arc<dyn RateStore>,
}

impl RateIngester {
    pub fn new(source: Arc<dyn RateSource>, store: Arc<dyn RateStore>) -> Self {
        Self { source, store }
    }

    /// Records today's (UTC) rates.
    pub async fn run_update(&self) -> Result<UpdateSummary> {
        self.run_update_on(Utc::now().date_naive()).await
    }

    /// Fetches the published rates and upserts one record per currency dated
    /// `date`. The first failing fetch, parse or write ends the run.
    pub async fn run_update_on(&self, date: NaiveDate) -> Result<UpdateSummary> {
        info!("Updating exchange rates for {}", format_date(date));
        let quotes = self.source.fetch_rates().await?;

        let mut written = 0;
        for quote in &quotes {
            let record = RateRecord::from_quote(quote, date)?;
            debug!(key = %record.key, rate = %record.rate, "Saving exchange rate");
            self.store.put(&record).await?;
            written += 1;
        }

        info!("Saved {} exchange rates for {}", written, format_date(date));
        Ok(UpdateSummary { date, written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::core::rate::{Quote, parse_date};
    use crate::core::store::{RatePage, all_by_date};
    use crate::store::memory::MemoryRateStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl RateSource for StaticSource {
        async fn fetch_rates(&self) -> Result<Vec<Quote>> {
            Ok(self
                .0
                .iter()
                .map(|(currency, rate)| Quote {
                    currency: currency.to_string(),
                    rate: rate.to_string(),
                })
                .collect())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RateSource for FailingSource {
        async fn fetch_rates(&self) -> Result<Vec<Quote>> {
            Err(Error::Fetch {
                url: "http://rates.invalid".to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    /// Accepts a fixed number of writes, then fails.
    struct FlakyStore {
        inner: MemoryRateStore,
        remaining: AtomicUsize,
    }

    #[async_trait]
    impl RateStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<RateRecord>> {
            self.inner.get(key).await
        }

        async fn put(&self, record: &RateRecord) -> Result<()> {
            if self.remaining.load(Ordering::SeqCst) == 0 {
                return Err(Error::Store("write throttled".to_string()));
            }
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            self.inner.put(record).await
        }

        async fn query_by_date(
            &self,
            date: &str,
            start_after: Option<&str>,
            limit: usize,
        ) -> Result<RatePage> {
            self.inner.query_by_date(date, start_after, limit).await
        }
    }

    fn day() -> NaiveDate {
        parse_date("2023-01-15").unwrap()
    }

    #[tokio::test]
    async fn test_run_update_writes_one_record_per_currency() {
        let store = MemoryRateStore::new();
        let source = StaticSource(vec![("USD", "1.0853"), ("JPY", "141.52"), ("DKK", "7.4373")]);
        let ingester = RateIngester::new(Arc::new(source), Arc::new(store.clone()));

        let summary = ingester.run_update_on(day()).await.unwrap();

        assert_eq!(summary.written, 3);
        assert_eq!(summary.date, day());
        let usd = store.get("USD:2023-01-15").await.unwrap().unwrap();
        assert_eq!(usd.currency, "USD");
        assert_eq!(usd.date, "2023-01-15");
        assert_eq!(usd.rate, "1.0853");
        assert_eq!(all_by_date(&store, "2023-01-15", 2).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rerun_same_day_overwrites() {
        let store = MemoryRateStore::new();
        let first = RateIngester::new(
            Arc::new(StaticSource(vec![("USD", "1.0800")])),
            Arc::new(store.clone()),
        );
        let second = RateIngester::new(
            Arc::new(StaticSource(vec![("USD", "1.0853")])),
            Arc::new(store.clone()),
        );

        first.run_update_on(day()).await.unwrap();
        second.run_update_on(day()).await.unwrap();

        assert_eq!(store.len().await, 1);
        let usd = store.get("USD:2023-01-15").await.unwrap().unwrap();
        assert_eq!(usd.rate, "1.0853");
    }

    #[tokio::test]
    async fn test_empty_source_writes_nothing() {
        let store = MemoryRateStore::new();
        let ingester = RateIngester::new(Arc::new(StaticSource(vec![])), Arc::new(store.clone()));

        let summary = ingester.run_update_on(day()).await.unwrap();

        assert_eq!(summary.written, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_out_of_range_rate_is_never_stored() {
        let store = MemoryRateStore::new();
        let source = StaticSource(vec![("XXX", "1e29"), ("USD", "1.0853")]);
        let ingester = RateIngester::new(Arc::new(source), Arc::new(store.clone()));

        let result = ingester.run_update_on(day()).await;

        assert!(matches!(result, Err(Error::Parse(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let store = MemoryRateStore::new();
        let ingester = RateIngester::new(Arc::new(FailingSource), Arc::new(store.clone()));

        let result = ingester.run_update_on(day()).await;

        assert!(matches!(result, Err(Error::Fetch { .. })));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_write_failure_aborts_remaining_writes() {
        let inner = MemoryRateStore::new();
        let store = FlakyStore {
            inner: inner.clone(),
            remaining: AtomicUsize::new(1),
        };
        let source = StaticSource(vec![("USD", "1.0853"), ("JPY", "141.52"), ("DKK", "7.4373")]);
        let ingester = RateIngester::new(Arc::new(source), Arc::new(store));

        let result = ingester.run_update_on(day()).await;

        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(inner.len().await, 1);
        assert!(inner.get("USD:2023-01-15").await.unwrap().is_some());
    }
}
