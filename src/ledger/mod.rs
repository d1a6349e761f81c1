pub mod engine;
pub mod error;
pub mod postgres;
pub mod retry;
pub mod sequence;
pub mod stock;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use engine::ShipmentEngine;
pub use error::LedgerError;
pub use postgres::PgLedgerStore;
pub use retry::RetryPolicy;
