//! In-memory [`LedgerStore`] used by the engine tests.
//!
//! A transaction holds the store-wide lock for its whole lifetime and
//! works on a private copy of the state, published only on commit. That
//! is a coarser lock than the row locks Postgres takes, but it gives the
//! same isolation for everything the engine does. Row lock requests are
//! still recorded in order so tests can check the engine's locking order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::inbound_shipment::{InboundShipment, NewInboundShipment};
use crate::models::outbound_shipment::{NewOutboundShipment, OutboundShipment};
use crate::models::stock_item::{NewStockItem, StockItem};

use super::error::StoreError;
use super::sequence::OrderId;
use super::stock::StockLevels;
use super::store::{LedgerStore, LedgerTx};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub stock_items: BTreeMap<String, StockItem>,
    pub inbound: BTreeMap<i64, InboundShipment>,
    pub outbound: BTreeMap<i64, OutboundShipment>,
    pub counters: BTreeMap<NaiveDate, i32>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
    failing_writes: Arc<AtomicU32>,
    begun: Arc<AtomicU32>,
    lock_log: Arc<StdMutex<Vec<String>>>,
}

impl MemoryLedgerStore {
    pub async fn register(&self, item: NewStockItem) -> StockItem {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let stock_item = StockItem {
            id: state.next_id(),
            sku: item.sku.clone(),
            description: item.description,
            warehouse_code: item.warehouse_code,
            on_hand_quantity: item.on_hand_quantity,
            reserved_outbound_quantity: 0,
            created_at: now,
            updated_at: now,
        };
        state.stock_items.insert(item.sku, stock_item.clone());
        stock_item
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn stock_item(&self, sku: &str) -> Option<StockItem> {
        self.state.lock().await.stock_items.get(sku).cloned()
    }

    /// Makes the next `count` shipment inserts fail with a lock timeout.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn transactions_begun(&self) -> u32 {
        self.begun.load(Ordering::SeqCst)
    }

    /// Row locks requested so far, as `stock:<sku>` or `counter:<date>`.
    pub fn lock_log(&self) -> Vec<String> {
        self.lock_log.lock().unwrap().clone()
    }
}

pub struct MemoryTx {
    committed: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    failing_writes: Arc<AtomicU32>,
    lock_log: Arc<StdMutex<Vec<String>>>,
}

impl MemoryTx {
    fn record_lock(&self, row: String) {
        self.lock_log.lock().unwrap().push(row);
    }

    fn injected_failure(&self) -> Result<(), StoreError> {
        let tripped = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::LockTimeout)
        } else {
            Ok(())
        }
    }
}

fn missing_row() -> StoreError {
    StoreError::Database(sqlx::Error::RowNotFound)
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        let committed = Arc::clone(&self.state).lock_owned().await;
        let working = committed.clone();
        Ok(MemoryTx {
            committed,
            working,
            failing_writes: Arc::clone(&self.failing_writes),
            lock_log: Arc::clone(&self.lock_log),
        })
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_stock_item(&mut self, sku: &str) -> Result<Option<StockItem>, StoreError> {
        self.record_lock(format!("stock:{sku}"));
        Ok(self.working.stock_items.get(sku).cloned())
    }

    async fn warehouse_exists(&mut self, warehouse_code: &str) -> Result<bool, StoreError> {
        Ok(self
            .working
            .stock_items
            .values()
            .any(|item| item.warehouse_code == warehouse_code))
    }

    async fn write_stock_levels(
        &mut self,
        sku: &str,
        levels: StockLevels,
    ) -> Result<(), StoreError> {
        let item = self.working.stock_items.get_mut(sku).ok_or_else(missing_row)?;
        item.on_hand_quantity = levels.on_hand;
        item.reserved_outbound_quantity = levels.reserved_outbound;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn lock_daily_counter(&mut self, date: NaiveDate) -> Result<Option<i32>, StoreError> {
        self.record_lock(format!("counter:{date}"));
        Ok(self.working.counters.get(&date).copied())
    }

    async fn insert_daily_counter(&mut self, date: NaiveDate) -> Result<i32, StoreError> {
        let counter = self.working.counters.entry(date).and_modify(|c| *c += 1).or_insert(1);
        Ok(*counter)
    }

    async fn store_daily_counter(
        &mut self,
        date: NaiveDate,
        counter: i32,
    ) -> Result<(), StoreError> {
        self.working.counters.insert(date, counter);
        Ok(())
    }

    async fn insert_inbound(
        &mut self,
        s: &NewInboundShipment,
    ) -> Result<InboundShipment, StoreError> {
        self.injected_failure()?;
        let now = Utc::now();
        let shipment = InboundShipment {
            id: self.working.next_id(),
            shipping_date: s.shipping_date,
            box_label: s.box_label.clone(),
            sku: s.sku.clone(),
            warehouse_code: s.warehouse_code.clone(),
            quantity: s.quantity,
            arriving_date: s.arriving_date,
            tracking_number: s.tracking_number.clone(),
            vendor_number: s.vendor_number.clone(),
            created_at: now,
            updated_at: now,
        };
        self.working.inbound.insert(shipment.id, shipment.clone());
        Ok(shipment)
    }

    async fn lock_inbound(&mut self, id: i64) -> Result<Option<InboundShipment>, StoreError> {
        Ok(self.working.inbound.get(&id).cloned())
    }

    async fn update_inbound(
        &mut self,
        id: i64,
        s: &NewInboundShipment,
    ) -> Result<InboundShipment, StoreError> {
        let shipment = self.working.inbound.get_mut(&id).ok_or_else(missing_row)?;
        shipment.shipping_date = s.shipping_date;
        shipment.box_label = s.box_label.clone();
        shipment.sku = s.sku.clone();
        shipment.warehouse_code = s.warehouse_code.clone();
        shipment.quantity = s.quantity;
        shipment.arriving_date = s.arriving_date;
        shipment.tracking_number = s.tracking_number.clone();
        shipment.vendor_number = s.vendor_number.clone();
        shipment.updated_at = Utc::now();
        Ok(shipment.clone())
    }

    async fn delete_inbound(&mut self, id: i64) -> Result<(), StoreError> {
        self.working.inbound.remove(&id).ok_or_else(missing_row)?;
        Ok(())
    }

    async fn insert_outbound(
        &mut self,
        s: &NewOutboundShipment,
        order_id: &OrderId,
        order_date: NaiveDate,
        on_hand_at_order: i32,
    ) -> Result<OutboundShipment, StoreError> {
        self.injected_failure()?;
        let now = Utc::now();
        let shipment = OutboundShipment {
            id: self.working.next_id(),
            order_id: order_id.to_string(),
            order_date,
            shipping_date: s.shipping_date,
            sku: s.sku.clone(),
            warehouse_code: s.warehouse_code.clone(),
            quantity: s.quantity,
            on_hand_at_order,
            customer_name: s.customer_name.clone(),
            address_line1: s.address_line1.clone(),
            address_line2: s.address_line2.clone(),
            city: s.city.clone(),
            state: s.state.clone(),
            zip_code: s.zip_code.clone(),
            country: s.country.clone(),
            phone: s.phone.clone(),
            tracking_number: s.tracking_number.clone(),
            created_at: now,
            updated_at: now,
        };
        self.working.outbound.insert(shipment.id, shipment.clone());
        Ok(shipment)
    }

    async fn lock_outbound(&mut self, id: i64) -> Result<Option<OutboundShipment>, StoreError> {
        Ok(self.working.outbound.get(&id).cloned())
    }

    async fn update_outbound(
        &mut self,
        id: i64,
        s: &NewOutboundShipment,
        order_date: NaiveDate,
    ) -> Result<OutboundShipment, StoreError> {
        let shipment = self.working.outbound.get_mut(&id).ok_or_else(missing_row)?;
        shipment.order_date = order_date;
        shipment.shipping_date = s.shipping_date;
        shipment.sku = s.sku.clone();
        shipment.warehouse_code = s.warehouse_code.clone();
        shipment.quantity = s.quantity;
        shipment.customer_name = s.customer_name.clone();
        shipment.address_line1 = s.address_line1.clone();
        shipment.address_line2 = s.address_line2.clone();
        shipment.city = s.city.clone();
        shipment.state = s.state.clone();
        shipment.zip_code = s.zip_code.clone();
        shipment.country = s.country.clone();
        shipment.phone = s.phone.clone();
        shipment.tracking_number = s.tracking_number.clone();
        shipment.updated_at = Utc::now();
        Ok(shipment.clone())
    }

    async fn delete_outbound(&mut self, id: i64) -> Result<(), StoreError> {
        self.working.outbound.remove(&id).ok_or_else(missing_row)?;
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        *self.committed = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
