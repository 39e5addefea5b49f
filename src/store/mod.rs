pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::store::RateStore;
use anyhow::{Context, Result};
use disk::FjallRateStore;
use std::sync::Arc;

/// Separates the date from the record key in date index entries. Neither
/// dates nor currency codes contain it, so a date's entries share a prefix.
const INDEX_SEPARATOR: char = '\0';

pub(crate) fn index_prefix(date: &str) -> String {
    format!("{date}{INDEX_SEPARATOR}")
}

pub(crate) fn index_key(date: &str, key: &str) -> String {
    format!("{date}{INDEX_SEPARATOR}{key}")
}

pub(crate) fn record_key_from_index<'a>(prefix: &str, entry: &'a str) -> &'a str {
    entry.strip_prefix(prefix).unwrap_or(entry)
}

/// Opens the on-disk rate store configured in `config`.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn RateStore>> {
    let path = config.data_path()?;
    let store = FjallRateStore::open(&path)
        .with_context(|| format!("Failed to open rate store at {}", path.display()))?;
    Ok(Arc::new(store))
}
