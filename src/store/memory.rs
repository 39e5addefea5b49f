use super::{index_key, index_prefix, record_key_from_index};
use crate::core::error::Result;
use crate::core::rate::RateRecord;
use crate::core::store::{RatePage, RateStore};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    rates: BTreeMap<String, RateRecord>,
    by_date: BTreeSet<String>,
}

/// In-memory rate store with the same key and index layout as the disk store
#[derive(Clone, Default)]
pub struct MemoryRateStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.rates.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn get(&self, key: &str) -> Result<Option<RateRecord>> {
        let tables = self.inner.lock().await;
        let record = tables.rates.get(key).cloned();
        if record.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        Ok(record)
    }

    async fn put(&self, record: &RateRecord) -> Result<()> {
        let mut tables = self.inner.lock().await;
        tables
            .by_date
            .insert(index_key(&record.date, &record.key));
        tables.rates.insert(record.key.clone(), record.clone());
        debug!("Store PUT for key: {}", record.key);
        Ok(())
    }

    async fn query_by_date(
        &self,
        date: &str,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<RatePage> {
        let prefix = index_prefix(date);
        let lower = match start_after {
            Some(key) => Bound::Excluded(index_key(date, key)),
            None => Bound::Included(prefix.clone()),
        };

        let tables = self.inner.lock().await;
        let mut keys = tables
            .by_date
            .range((lower, Bound::Unbounded))
            .take_while(|entry| entry.starts_with(&prefix))
            .map(|entry| record_key_from_index(&prefix, entry));

        let mut records = Vec::new();
        for key in keys.by_ref().take(limit) {
            if let Some(record) = tables.rates.get(key) {
                records.push(record.clone());
            }
        }
        let last_key = match keys.next() {
            Some(_) => records.last().map(|r| r.key.clone()),
            None => None,
        };

        debug!(
            "Store QUERY date={} returned {} records, more={}",
            date,
            records.len(),
            last_key.is_some()
        );
        Ok(RatePage { records, last_key })
    }
}
