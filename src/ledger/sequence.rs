//! Daily order-id sequence.
//!
//! Order ids look like `OS030726-0001`: the allocation date as `MMDDYY`
//! followed by a per-day counter. The counter lives in the
//! `daily_order_counters` row for that date and is read with a row lock,
//! so concurrent allocators for one date queue behind each other while
//! other dates proceed independently. The increment belongs to the
//! caller's transaction and disappears with it on rollback.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::error::LedgerError;
use super::store::LedgerTx;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(date: NaiveDate, sequence: i32) -> Self {
        Self(format!("OS{}-{:04}", date.format("%m%d%y"), sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bumps the counter for `date` inside `tx` and formats the new value.
pub async fn allocate_order_id<T: LedgerTx>(
    tx: &mut T,
    date: NaiveDate,
) -> Result<OrderId, LedgerError> {
    let sequence = match tx.lock_daily_counter(date).await? {
        Some(current) => {
            let next = current.checked_add(1).ok_or_else(|| {
                LedgerError::Storage(format!("order counter for {date} exhausted"))
            })?;
            tx.store_daily_counter(date, next).await?;
            next
        }
        None => tx.insert_daily_counter(date).await?,
    };

    let order_id = OrderId::new(date, sequence);
    debug!(%date, sequence, order_id = %order_id, "Allocated order id");
    Ok(order_id)
}
