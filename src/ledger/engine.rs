//! Shipment mutations that keep stock item counters in step with the
//! shipment rows.
//!
//! Every public operation runs as one transaction: the shipment row and
//! the stock item row it touches are written together or not at all.
//! Stock rows are read with a lock before being rewritten, so two
//! concurrent mutations of one SKU cannot lose an update, and the
//! sufficiency check sees the same quantity the write starts from.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info, instrument, warn};

use crate::models::inbound_shipment::{InboundShipment, NewInboundShipment};
use crate::models::outbound_shipment::{NewOutboundShipment, OutboundShipment};
use crate::models::stock_item::StockItem;

use super::error::LedgerError;
use super::retry::RetryPolicy;
use super::sequence;
use super::stock::StockLevels;
use super::store::{LedgerStore, LedgerTx};

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct ShipmentEngine<S> {
    store: Arc<S>,
    bulk_retry: RetryPolicy,
    clock: Clock,
}

impl<S> Clone for ShipmentEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            bulk_retry: self.bulk_retry,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: LedgerStore> ShipmentEngine<S> {
    pub fn new(store: S, bulk_retry: RetryPolicy) -> Self {
        Self {
            store: Arc::new(store),
            bulk_retry,
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replaces the source of "today" used for order ids.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Draws one order id in a transaction of its own. Shipment creation
    /// allocates inside its own transaction instead.
    #[cfg(test)]
    #[instrument(skip(self))]
    pub async fn allocate_order_id(
        &self,
        date: NaiveDate,
    ) -> Result<sequence::OrderId, LedgerError> {
        let mut tx = self.store.begin().await?;
        let outcome = sequence::allocate_order_id(&mut tx, date).await;
        settle(tx, outcome).await
    }

    #[instrument(skip(self, shipment), fields(sku = %shipment.sku, quantity = shipment.quantity))]
    pub async fn create_inbound(
        &self,
        shipment: NewInboundShipment,
    ) -> Result<InboundShipment, LedgerError> {
        let mut tx = self.store.begin().await?;
        let outcome = receive_inbound(&mut tx, &shipment).await;
        let created = settle(tx, outcome).await?;
        info!(id = created.id, "Inbound shipment created");
        Ok(created)
    }

    #[instrument(skip(self, shipment), fields(sku = %shipment.sku, quantity = shipment.quantity))]
    pub async fn create_outbound(
        &self,
        shipment: NewOutboundShipment,
    ) -> Result<OutboundShipment, LedgerError> {
        let today = self.today();
        let mut tx = self.store.begin().await?;
        let outcome = dispatch_outbound(&mut tx, &shipment, today).await;
        let created = settle(tx, outcome).await?;
        info!(id = created.id, order_id = %created.order_id, "Outbound shipment created");
        Ok(created)
    }

    #[instrument(skip(self, shipment), fields(sku = %shipment.sku, quantity = shipment.quantity))]
    pub async fn update_inbound(
        &self,
        id: i64,
        shipment: NewInboundShipment,
    ) -> Result<InboundShipment, LedgerError> {
        let mut tx = self.store.begin().await?;
        let outcome = revise_inbound(&mut tx, id, &shipment).await;
        let updated = settle(tx, outcome).await?;
        info!("Inbound shipment updated");
        Ok(updated)
    }

    #[instrument(skip(self, shipment), fields(sku = %shipment.sku, quantity = shipment.quantity))]
    pub async fn update_outbound(
        &self,
        id: i64,
        shipment: NewOutboundShipment,
    ) -> Result<OutboundShipment, LedgerError> {
        let mut tx = self.store.begin().await?;
        let outcome = revise_outbound(&mut tx, id, &shipment).await;
        let updated = settle(tx, outcome).await?;
        info!(order_id = %updated.order_id, "Outbound shipment updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_inbound(&self, id: i64) -> Result<(), LedgerError> {
        let mut tx = self.store.begin().await?;
        let outcome = remove_inbound(&mut tx, id).await;
        settle(tx, outcome).await?;
        info!("Inbound shipment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_outbound(&self, id: i64) -> Result<(), LedgerError> {
        let mut tx = self.store.begin().await?;
        let outcome = remove_outbound(&mut tx, id).await;
        settle(tx, outcome).await?;
        info!("Outbound shipment deleted");
        Ok(())
    }

    /// Creates every shipment or none. A lock timeout restarts the whole
    /// batch under the bulk retry policy.
    #[instrument(skip(self, shipments), fields(count = shipments.len()))]
    pub async fn bulk_create_inbound(
        &self,
        shipments: Vec<NewInboundShipment>,
    ) -> Result<Vec<InboundShipment>, LedgerError> {
        if shipments.is_empty() {
            return Err(LedgerError::validation("At least one shipment is required"));
        }

        let batch = shipments.as_slice();
        let created = self
            .bulk_retry
            .run("bulk_create_inbound", move || async move {
                let mut tx = self.store.begin().await?;
                let outcome = receive_all_inbound(&mut tx, batch).await;
                settle(tx, outcome).await
            })
            .await?;

        info!(created = created.len(), "Inbound shipments created");
        Ok(created)
    }

    #[instrument(skip(self, shipments), fields(count = shipments.len()))]
    pub async fn bulk_create_outbound(
        &self,
        shipments: Vec<NewOutboundShipment>,
    ) -> Result<Vec<OutboundShipment>, LedgerError> {
        if shipments.is_empty() {
            return Err(LedgerError::validation("At least one shipment is required"));
        }

        let today = self.today();
        let batch = shipments.as_slice();
        let created = self
            .bulk_retry
            .run("bulk_create_outbound", move || async move {
                let mut tx = self.store.begin().await?;
                let outcome = dispatch_all_outbound(&mut tx, batch, today).await;
                settle(tx, outcome).await
            })
            .await?;

        info!(created = created.len(), "Outbound shipments created");
        Ok(created)
    }
}

/// Commits on success, rolls back on failure. A transaction that never
/// reaches this point is rolled back when dropped.
async fn settle<T, Tx: LedgerTx>(
    tx: Tx,
    outcome: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "Rolling back ledger transaction");
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

fn ensure_positive(quantity: i32) -> Result<(), LedgerError> {
    if quantity <= 0 {
        return Err(LedgerError::validation("quantity must be greater than 0"));
    }
    Ok(())
}

async fn lock_known_stock_item<T: LedgerTx>(
    tx: &mut T,
    sku: &str,
) -> Result<StockItem, LedgerError> {
    tx.lock_stock_item(sku)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("SKU {sku} not found")))
}

/// Locks two stock items in ascending SKU order and returns them in
/// argument order.
async fn lock_stock_pair<T: LedgerTx>(
    tx: &mut T,
    first: &str,
    second: &str,
) -> Result<(StockItem, StockItem), LedgerError> {
    if first < second {
        let a = lock_known_stock_item(tx, first).await?;
        let b = lock_known_stock_item(tx, second).await?;
        Ok((a, b))
    } else {
        let b = lock_known_stock_item(tx, second).await?;
        let a = lock_known_stock_item(tx, first).await?;
        Ok((a, b))
    }
}

/// Locks every distinct SKU of a batch in ascending order. The per-item
/// work that follows re-reads rows this transaction already holds. An
/// unknown SKU is reported at the first element naming it.
async fn lock_batch_stock_items<'a, T: LedgerTx>(
    tx: &mut T,
    skus: impl Iterator<Item = &'a str>,
) -> Result<(), LedgerError> {
    let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (index, sku) in skus.enumerate() {
        first_seen.entry(sku).or_insert(index);
    }

    for (sku, index) in first_seen {
        lock_known_stock_item(tx, sku)
            .await
            .map_err(|e| e.at_index(index))?;
    }
    Ok(())
}

async fn ensure_warehouse<T: LedgerTx>(tx: &mut T, warehouse_code: &str) -> Result<(), LedgerError> {
    if !tx.warehouse_exists(warehouse_code).await? {
        return Err(LedgerError::not_found(format!(
            "Warehouse {warehouse_code} not found"
        )));
    }
    Ok(())
}

async fn receive_inbound<T: LedgerTx>(
    tx: &mut T,
    s: &NewInboundShipment,
) -> Result<InboundShipment, LedgerError> {
    ensure_positive(s.quantity)?;
    let item = lock_known_stock_item(tx, &s.sku).await?;
    ensure_warehouse(tx, &s.warehouse_code).await?;

    let levels = StockLevels::of(&item).adjust(&item.sku, s.quantity, 0)?;
    let shipment = tx.insert_inbound(s).await?;
    tx.write_stock_levels(&item.sku, levels).await?;
    Ok(shipment)
}

async fn receive_all_inbound<T: LedgerTx>(
    tx: &mut T,
    shipments: &[NewInboundShipment],
) -> Result<Vec<InboundShipment>, LedgerError> {
    lock_batch_stock_items(tx, shipments.iter().map(|s| s.sku.as_str())).await?;

    let mut created = Vec::with_capacity(shipments.len());
    for (index, s) in shipments.iter().enumerate() {
        let shipment = receive_inbound(tx, s).await.map_err(|e| e.at_index(index))?;
        created.push(shipment);
    }
    Ok(created)
}

async fn dispatch_outbound<T: LedgerTx>(
    tx: &mut T,
    s: &NewOutboundShipment,
    today: NaiveDate,
) -> Result<OutboundShipment, LedgerError> {
    ensure_positive(s.quantity)?;
    let item = lock_known_stock_item(tx, &s.sku).await?;
    ensure_warehouse(tx, &s.warehouse_code).await?;

    // fails with InsufficientStock when quantity exceeds on_hand
    let levels = StockLevels::of(&item).adjust(&item.sku, -s.quantity, s.quantity)?;
    let order_id = sequence::allocate_order_id(tx, today).await?;
    let order_date = s.order_date.unwrap_or(today);

    let shipment = tx
        .insert_outbound(s, &order_id, order_date, item.on_hand_quantity)
        .await?;
    tx.write_stock_levels(&item.sku, levels).await?;
    Ok(shipment)
}

async fn dispatch_all_outbound<T: LedgerTx>(
    tx: &mut T,
    shipments: &[NewOutboundShipment],
    today: NaiveDate,
) -> Result<Vec<OutboundShipment>, LedgerError> {
    // every stock row is held before the first order id is drawn, so the
    // counter row is always locked after the stock rows, as in a single create
    lock_batch_stock_items(tx, shipments.iter().map(|s| s.sku.as_str())).await?;

    let mut created = Vec::with_capacity(shipments.len());
    for (index, s) in shipments.iter().enumerate() {
        let shipment = dispatch_outbound(tx, s, today)
            .await
            .map_err(|e| e.at_index(index))?;
        created.push(shipment);
    }
    Ok(created)
}

async fn revise_inbound<T: LedgerTx>(
    tx: &mut T,
    id: i64,
    s: &NewInboundShipment,
) -> Result<InboundShipment, LedgerError> {
    ensure_positive(s.quantity)?;
    let existing = tx
        .lock_inbound(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("Inbound shipment {id} not found")))?;
    ensure_warehouse(tx, &s.warehouse_code).await?;

    if existing.sku == s.sku {
        let delta = s.quantity - existing.quantity;
        if delta != 0 {
            let item = lock_known_stock_item(tx, &s.sku).await?;
            let levels = StockLevels::of(&item).adjust(&item.sku, delta, 0)?;
            tx.write_stock_levels(&item.sku, levels).await?;
        }
    } else {
        let (old_item, new_item) = lock_stock_pair(tx, &existing.sku, &s.sku).await?;
        let old_levels = StockLevels::of(&old_item).adjust(&old_item.sku, -existing.quantity, 0)?;
        let new_levels = StockLevels::of(&new_item).adjust(&new_item.sku, s.quantity, 0)?;
        tx.write_stock_levels(&old_item.sku, old_levels).await?;
        tx.write_stock_levels(&new_item.sku, new_levels).await?;
    }

    Ok(tx.update_inbound(id, s).await?)
}

async fn revise_outbound<T: LedgerTx>(
    tx: &mut T,
    id: i64,
    s: &NewOutboundShipment,
) -> Result<OutboundShipment, LedgerError> {
    ensure_positive(s.quantity)?;
    let existing = tx
        .lock_outbound(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("Outbound shipment {id} not found")))?;
    ensure_warehouse(tx, &s.warehouse_code).await?;

    if existing.sku == s.sku {
        let delta = s.quantity - existing.quantity;
        if delta != 0 {
            let item = lock_known_stock_item(tx, &s.sku).await?;
            let levels = StockLevels::of(&item).adjust(&item.sku, -delta, delta)?;
            tx.write_stock_levels(&item.sku, levels).await?;
        }
    } else {
        let (old_item, new_item) = lock_stock_pair(tx, &existing.sku, &s.sku).await?;
        let old_levels = StockLevels::of(&old_item).adjust(
            &old_item.sku,
            existing.quantity,
            -existing.quantity,
        )?;
        let new_levels = StockLevels::of(&new_item).adjust(&new_item.sku, -s.quantity, s.quantity)?;
        tx.write_stock_levels(&old_item.sku, old_levels).await?;
        tx.write_stock_levels(&new_item.sku, new_levels).await?;
    }

    let order_date = s.order_date.unwrap_or(existing.order_date);
    Ok(tx.update_outbound(id, s, order_date).await?)
}

async fn remove_inbound<T: LedgerTx>(tx: &mut T, id: i64) -> Result<(), LedgerError> {
    let existing = tx
        .lock_inbound(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("Inbound shipment {id} not found")))?;
    let item = lock_known_stock_item(tx, &existing.sku).await?;

    // refused when the received stock has already gone out again
    let levels = StockLevels::of(&item).adjust(&item.sku, -existing.quantity, 0)?;
    tx.delete_inbound(id).await?;
    tx.write_stock_levels(&item.sku, levels).await?;
    Ok(())
}

async fn remove_outbound<T: LedgerTx>(tx: &mut T, id: i64) -> Result<(), LedgerError> {
    let existing = tx
        .lock_outbound(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("Outbound shipment {id} not found")))?;
    let item = lock_known_stock_item(tx, &existing.sku).await?;

    let levels =
        StockLevels::of(&item).adjust(&item.sku, existing.quantity, -existing.quantity)?;
    tx.delete_outbound(id).await?;
    tx.write_stock_levels(&item.sku, levels).await?;
    Ok(())
}
