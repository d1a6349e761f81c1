use thiserror::Error;

/// Failures raised by a [`LedgerTx`](super::store::LedgerTx) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lock wait timeout, deadlock or serialization failure. The whole
    /// transaction may succeed if run again.
    #[error("lock wait timeout exceeded")]
    LockTimeout,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

// lock_not_available, deadlock_detected, serialization_failure
const TRANSIENT_SQLSTATES: [&str; 3] = ["55P03", "40P01", "40001"];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            if let Some(code) = db.code() {
                if TRANSIENT_SQLSTATES.contains(&code.as_ref()) {
                    return StoreError::LockTimeout;
                }
            }
        }
        StoreError::Database(err)
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(
        "{}Insufficient stock for SKU {sku}. Available: {available}, Requested: {requested}",
        batch_position(.index)
    )]
    InsufficientStock {
        sku: String,
        requested: i32,
        available: i32,
        /// Position of the failing element when raised inside a bulk request.
        index: Option<usize>,
    },
    #[error("transient storage failure: {0}")]
    TransientStorage(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        LedgerError::NotFound(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::TransientStorage(_))
    }

    /// Tags caller-facing errors with the position of the failing element
    /// in a bulk request.
    pub fn at_index(self, index: usize) -> Self {
        match self {
            LedgerError::Validation(msg) => {
                LedgerError::Validation(format!("shipments[{index}]: {msg}"))
            }
            LedgerError::NotFound(msg) => LedgerError::NotFound(format!("shipments[{index}]: {msg}")),
            LedgerError::InsufficientStock {
                sku,
                requested,
                available,
                ..
            } => LedgerError::InsufficientStock {
                sku,
                requested,
                available,
                index: Some(index),
            },
            other => other,
        }
    }
}

fn batch_position(index: &Option<usize>) -> String {
    index.map(|i| format!("shipments[{i}]: ")).unwrap_or_default()
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockTimeout => {
                LedgerError::TransientStorage("lock wait timeout exceeded".to_string())
            }
            StoreError::Database(e) => {
                tracing::error!(error = %e, "Ledger storage failure");
                LedgerError::Storage(e.to_string())
            }
        }
    }
}
