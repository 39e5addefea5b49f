//! Background trigger for the rate ingester.
//!
//! The first update runs immediately, later ones every configured interval.
//! Runs never overlap: the next tick is awaited only after a run completes.

use crate::ingest::RateIngester;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{error, info};

pub fn start_update_scheduler(ingester: Arc<RateIngester>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Exchange rate scheduler started ({:?} interval)", every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_scheduled_update(&ingester).await;
        }
    })
}

async fn run_scheduled_update(ingester: &RateIngester) {
    match ingester.run_update().await {
        Ok(summary) => info!(
            "Scheduled update completed: {} rates for {}",
            summary.written, summary.date
        ),
        // No retry here; the next tick is the retry.
        Err(e) => error!(error = %e, "Scheduled exchange rate update failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use crate::core::rate::Quote;
    use crate::core::source::RateSource;
    use crate::store::memory::MemoryRateStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn fetch_rates(&self) -> Result<Vec<Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Quote {
                currency: "USD".to_string(),
                rate: "1.0853".to_string(),
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_immediately_and_repeats() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = MemoryRateStore::new();
        let ingester = RateIngester::new(
            Arc::new(CountingSource {
                calls: Arc::clone(&calls),
            }),
            Arc::new(store.clone()),
        );

        let every = Duration::from_secs(12 * 60 * 60);
        let handle = start_update_scheduler(Arc::new(ingester), every);

        // The paused clock only moves once every task is idle, so runs at
        // 0h, 12h and 24h all complete before the 25h mark.
        tokio::time::sleep(every * 2 + Duration::from_secs(60 * 60)).await;
        handle.abort();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.len().await, 1);
    }
}
