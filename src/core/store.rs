//! Storage abstraction for rate records

use super::error::{Error, Result};
use super::rate::RateRecord;
use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};

/// One page of a date index scan.
///
/// `last_key` is the continuation token: when present, more records may
/// follow and the next page starts after it.
#[derive(Debug, Clone, Default)]
pub struct RatePage {
    pub records: Vec<RateRecord>,
    pub last_key: Option<String>,
}

/// A key-value store addressed by `{currency}:{date}` with a secondary index
/// on `date`.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Point lookup by primary key.
    async fn get(&self, key: &str) -> Result<Option<RateRecord>>;

    /// Inserts the record, replacing any record with the same key.
    async fn put(&self, record: &RateRecord) -> Result<()>;

    /// Returns at most `limit` records dated `date`, starting after the
    /// record keyed `start_after`.
    async fn query_by_date(
        &self,
        date: &str,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<RatePage>;
}

/// Lazily walks every page of the date index for `date`.
///
/// Pages are requested one at a time, so at most `page_size` records are
/// buffered.
pub fn scan_by_date<'a>(
    store: &'a dyn RateStore,
    date: &'a str,
    page_size: usize,
) -> impl Stream<Item = Result<RateRecord>> + Send + 'a {
    let page_size = page_size.max(1);
    // `None` once the index is exhausted, `Some(None)` before the first page.
    let cursor: Option<Option<String>> = Some(None);

    stream::try_unfold(cursor, move |cursor| async move {
        let Some(start_after) = cursor else {
            return Ok::<_, Error>(None);
        };
        let page = store
            .query_by_date(date, start_after.as_deref(), page_size)
            .await?;
        let next = page.last_key.map(Some);
        Ok(Some((stream::iter(page.records.into_iter().map(Ok::<_, Error>)), next)))
    })
    .try_flatten()
}

/// Collects every record dated `date`, merging all pages in scan order.
pub async fn all_by_date(
    store: &dyn RateStore,
    date: &str,
    page_size: usize,
) -> Result<Vec<RateRecord>> {
    scan_by_date(store, date, page_size).try_collect().await
}
