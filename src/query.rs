//! Read side: today's rates with their change against the previous day
//!
//! Both operations favour availability. Any internal failure is logged,
//! counted in [`QueryMetrics`] and answered with an empty result, so callers
//! always receive a well-formed response.

use crate::core::error::Result;
use crate::core::rate::{RateView, format_date, previous_day, record_key};
use crate::core::store::{RateStore, scan_by_date};
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

/// Counts how query results came to be empty.
///
/// A caller cannot tell "no data" from "lookup failed" by the response alone;
/// these counters can.
#[derive(Debug, Default)]
pub struct QueryMetrics {
    errors: AtomicU64,
    not_found: AtomicU64,
}

impl QueryMetrics {
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn not_found(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

pub struct RateQueryService {
    store: Arc<dyn RateStore>,
    page_size: usize,
    metrics: Arc<QueryMetrics>,
    today: fn() -> NaiveDate,
}

impl RateQueryService {
    pub fn new(store: Arc<dyn RateStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size,
            metrics: Arc::new(QueryMetrics::default()),
            today: utc_today,
        }
    }

    /// Replaces the UTC clock that decides which date is "today".
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn metrics(&self) -> Arc<QueryMetrics> {
        Arc::clone(&self.metrics)
    }

    pub async fn get_all_today(&self) -> Vec<RateView> {
        self.get_all_on((self.today)()).await
    }

    pub async fn get_one(&self, currency: &str) -> Option<RateView> {
        self.get_one_on(currency, (self.today)()).await
    }

    /// Every rate recorded on `date`, in index scan order.
    pub async fn get_all_on(&self, date: NaiveDate) -> Vec<RateView> {
        match self.try_get_all(date).await {
            Ok(views) => views,
            Err(e) => {
                self.metrics.record_error();
                error!(error = %e, date = %format_date(date), "Failed to list exchange rates");
                Vec::new()
            }
        }
    }

    /// The rate recorded for `currency` on `date`, if any.
    pub async fn get_one_on(&self, currency: &str, date: NaiveDate) -> Option<RateView> {
        match self.try_get_one(currency, date).await {
            Ok(Some(view)) => Some(view),
            Ok(None) => {
                self.metrics.record_not_found();
                debug!("No exchange rate for {} on {}", currency, format_date(date));
                None
            }
            Err(e) => {
                self.metrics.record_error();
                error!(error = %e, currency = %currency, date = %format_date(date), "Failed to get exchange rate");
                None
            }
        }
    }

    async fn try_get_all(&self, date: NaiveDate) -> Result<Vec<RateView>> {
        let today = format_date(date);
        let yesterday = format_date(previous_day(date)?);

        let records: Vec<_> = scan_by_date(self.store.as_ref(), &today, self.page_size)
            .try_collect()
            .await?;
        debug!("Found {} exchange rates for {}", records.len(), today);

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let prev = self
                .store
                .get(&record_key(&record.currency, &yesterday))
                .await?;
            views.push(RateView::new(record, prev.as_ref())?);
        }
        Ok(views)
    }

    async fn try_get_one(&self, currency: &str, date: NaiveDate) -> Result<Option<RateView>> {
        let today = format_date(date);
        let Some(record) = self.store.get(&record_key(currency, &today)).await? else {
            return Ok(None);
        };

        let yesterday = format_date(previous_day(date)?);
        let prev = self.store.get(&record_key(currency, &yesterday)).await?;
        Ok(Some(RateView::new(record, prev.as_ref())?))
    }
}
