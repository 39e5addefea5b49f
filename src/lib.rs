pub mod api;
pub mod cli;
pub mod core;
pub mod ingest;
pub mod providers;
pub mod query;
pub mod scheduler;
pub mod store;

use crate::api::AppState;
use crate::core::config::AppConfig;
use crate::core::store::RateStore;
use crate::ingest::RateIngester;
use crate::providers::EcbSource;
use crate::query::RateQueryService;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Fetch and store today's rates once
    Update,
    /// Serve the HTTP API and update rates on a schedule
    Serve,
    /// Print today's rates
    Show { currency: Option<String> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xrates starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = store::open_store(&config)?;

    match command {
        AppCommand::Update => {
            let summary = build_ingester(&config, store).run_update().await?;
            info!(
                "Stored {} exchange rates for {}",
                summary.written, summary.date
            );
            Ok(())
        }
        AppCommand::Serve => {
            let ingester = Arc::new(build_ingester(&config, Arc::clone(&store)));
            let scheduler =
                scheduler::start_update_scheduler(ingester, config.schedule.interval());

            let state = Arc::new(AppState {
                query: RateQueryService::new(store, config.store.page_size),
            });
            let result = api::serve(config.server.listen_addr, state).await;
            scheduler.abort();
            result
        }
        AppCommand::Show { currency } => {
            let query = RateQueryService::new(store, config.store.page_size);
            cli::show::run(&query, currency.as_deref()).await
        }
    }
}

fn build_ingester(config: &AppConfig, store: Arc<dyn RateStore>) -> RateIngester {
    let source = EcbSource::new(&config.source.url);
    RateIngester::new(Arc::new(source), store)
}
