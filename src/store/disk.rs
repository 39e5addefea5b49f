use super::{index_key, index_prefix, record_key_from_index};
use crate::core::error::{Error, Result};
use crate::core::rate::RateRecord;
use crate::core::store::{RatePage, RateStore};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use std::ops::Bound;
use std::path::Path;
use tracing::debug;

const RATES_PARTITION: &str = "rates";
const DATE_INDEX_PARTITION: &str = "rates_by_date";

/// Rate store backed by a fjall keyspace.
///
/// Records live in the `rates` partition as JSON keyed by `{currency}:{date}`.
/// The `rates_by_date` partition maps `{date}\0{key}` to the record key and
/// is written in the same batch as the record.
pub struct FjallRateStore {
    keyspace: Keyspace,
    rates: PartitionHandle,
    by_date: PartitionHandle,
}

impl FjallRateStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(db_path)
            .map_err(|e| Error::Store(format!("create {}: {e}", db_path.display())))?;

        let keyspace = Config::new(db_path).open()?;
        let rates = keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        let by_date =
            keyspace.open_partition(DATE_INDEX_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened rate store at {}", db_path.display());
        Ok(Self {
            keyspace,
            rates,
            by_date,
        })
    }

    fn read(&self, key: &str) -> Result<Option<RateRecord>> {
        match self.rates.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RateStore for FjallRateStore {
    async fn get(&self, key: &str) -> Result<Option<RateRecord>> {
        let record = self.read(key)?;
        if record.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        Ok(record)
    }

    async fn put(&self, record: &RateRecord) -> Result<()> {
        let value = serde_json::to_vec(record)?;
        let mut batch = self.keyspace.batch();
        batch.insert(&self.rates, record.key.as_bytes(), value);
        batch.insert(
            &self.by_date,
            index_key(&record.date, &record.key).into_bytes(),
            record.key.as_bytes(),
        );
        batch.commit()?;
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
            Some(key) => Bound::Excluded(index_key(date, key).into_bytes()),
            None => Bound::Included(prefix.clone().into_bytes()),
        };

        let mut records = Vec::new();
        let mut more = false;
        for entry in self.by_date.range((lower, Bound::<Vec<u8>>::Unbounded)) {
            let (index_entry, _) = entry?;
            if !index_entry.starts_with(prefix.as_bytes()) {
                break;
            }
            if records.len() == limit {
                more = true;
                break;
            }
            let index_entry = std::str::from_utf8(&index_entry)
                .map_err(|e| Error::Store(format!("date index entry: {e}")))?;
            let key = record_key_from_index(&prefix, index_entry);
            if let Some(record) = self.read(key)? {
                records.push(record);
            }
        }

        let last_key = if more {
            records.last().map(|r| r.key.clone())
        } else {
            None
        };
        debug!(
            "Store QUERY date={} returned {} records, more={}",
            date,
            records.len(),
            more
        );
        Ok(RatePage { records, last_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::all_by_date;
    use tempfile::tempdir;

    fn record(currency: &str, date: &str, rate: &str) -> RateRecord {
        RateRecord {
            key: format!("{currency}:{date}"),
            currency: currency.to_string(),
            date: date.to_string(),
            rate: rate.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fjall_store_get_put() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();

        assert!(store.get("USD:2023-01-15").await.unwrap().is_none());

        let usd = record("USD", "2023-01-15", "1.0853");
        store.put(&usd).await.unwrap();

        assert_eq!(store.get("USD:2023-01-15").await.unwrap(), Some(usd));
        assert!(store.get("GBP:2023-01-15").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fjall_store_upsert_keeps_one_record() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();

        store.put(&record("USD", "2023-01-15", "1.0800")).await.unwrap();
        store.put(&record("USD", "2023-01-15", "1.0853")).await.unwrap();

        let stored = store.get("USD:2023-01-15").await.unwrap().unwrap();
        assert_eq!(stored.rate, "1.0853");
        let today = all_by_date(&store, "2023-01-15", 10).await.unwrap();
        assert_eq!(today, vec![stored]);
    }

    #[tokio::test]
    async fn test_fjall_store_scans_date_across_pages() {
        let dir = tempdir().unwrap();
        let store = FjallRateStore::open(dir.path()).unwrap();

        for currency in ["USD", "JPY", "GBP", "CHF", "AUD"] {
            store.put(&record(currency, "2023-01-15", "1.0")).await.unwrap();
        }
        store.put(&record("USD", "2023-01-14", "1.0")).await.unwrap();

        let first = store.query_by_date("2023-01-15", None, 2).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.last_key.as_deref(), Some("CHF:2023-01-15"));

        let today = all_by_date(&store, "2023-01-15", 2).await.unwrap();
        let currencies: Vec<_> = today.iter().map(|r| r.currency.as_str()).collect();
        assert_eq!(currencies, ["AUD", "CHF", "GBP", "JPY", "USD"]);

        let yesterday = all_by_date(&store, "2023-01-14", 2).await.unwrap();
        assert_eq!(yesterday.len(), 1);
    }
}
