// src/state.rs
use sqlx::PgPool;

use crate::config::LedgerSettings;
use crate::ledger::{PgLedgerStore, ShipmentEngine};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub ledger: ShipmentEngine<PgLedgerStore>,
}

impl AppState {
    pub fn new(db_pool: PgPool, settings: &LedgerSettings) -> Self {
        let store = PgLedgerStore::new(db_pool.clone(), settings.lock_timeout_ms);
        Self {
            ledger: ShipmentEngine::new(store, settings.bulk_retry()),
            db_pool,
        }
    }
}
