use std::sync::Arc;

use crate::config::{Config, LogFormat};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use budgetledger_core::{
    fx::{FxService, FxServiceTrait},
    imports::{ImportService, ImportServiceTrait},
    ledger::{LedgerService, LedgerServiceTrait},
    transactions::{TransactionService, TransactionServiceTrait},
};
use budgetledger_storage_sqlite::{
    db, ClusterCurrencyRepository, LedgerRepository, TransactionRecordRepository,
};

pub struct AppState {
    pub transaction_service: Arc<dyn TransactionServiceTrait + Send + Sync>,
    pub import_service: Arc<dyn ImportServiceTrait + Send + Sync>,
    pub ledger_service: Arc<dyn LedgerServiceTrait + Send + Sync>,
    pub fx_service: Arc<dyn FxServiceTrait + Send + Sync>,
    pub expose_debug: bool,
    pub import_max_bytes: usize,
}

/// Installs the global subscriber. `log` records from the library crates are
/// forwarded into it.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let capabilities = db::detect_capabilities(&pool)?;
    if !capabilities.record_rates {
        tracing::warn!("Transaction table has no custom-rate columns; rates will not be stored");
    }
    let writer = db::spawn_writer((*pool).clone());
    let settings = config.ledger_settings();

    let ledger_repository = Arc::new(LedgerRepository::new(
        pool.clone(),
        writer.clone(),
        capabilities,
    ));
    let record_repository = Arc::new(TransactionRecordRepository::new(pool.clone(), capabilities));
    let fx_service = Arc::new(FxService::new(Arc::new(ClusterCurrencyRepository::new(
        pool.clone(),
        writer,
    ))));

    let transaction_service = Arc::new(TransactionService::new(
        ledger_repository.clone(),
        ledger_repository.clone(),
        record_repository,
        fx_service.clone(),
        settings,
    ));
    let import_service = Arc::new(ImportService::new(
        ledger_repository.clone(),
        fx_service.clone(),
        settings,
    ));
    let ledger_service = Arc::new(LedgerService::new(ledger_repository));

    Ok(Arc::new(AppState {
        transaction_service,
        import_service,
        ledger_service,
        fx_service,
        expose_debug: config.expose_debug,
        import_max_bytes: config.import_max_bytes,
    }))
}
