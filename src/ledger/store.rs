use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::inbound_shipment::{InboundShipment, NewInboundShipment};
use crate::models::outbound_shipment::{NewOutboundShipment, OutboundShipment};
use crate::models::stock_item::StockItem;

use super::error::StoreError;
use super::sequence::OrderId;
use super::stock::StockLevels;

/// A transactional store holding stock items, shipments and the daily
/// order counters.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Tx: LedgerTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One open transaction. Every `lock_*` read takes an exclusive row lock
/// held until the transaction ends. Dropping a transaction without
/// calling [`LedgerTx::commit`] rolls it back.
#[async_trait]
pub trait LedgerTx: Send {
    async fn lock_stock_item(&mut self, sku: &str) -> Result<Option<StockItem>, StoreError>;

    async fn warehouse_exists(&mut self, warehouse_code: &str) -> Result<bool, StoreError>;

    async fn write_stock_levels(
        &mut self,
        sku: &str,
        levels: StockLevels,
    ) -> Result<(), StoreError>;

    async fn lock_daily_counter(&mut self, date: NaiveDate) -> Result<Option<i32>, StoreError>;

    /// Creates the counter row for `date` at 1. If a concurrent
    /// transaction created it first, increments that row instead.
    /// Returns the stored value.
    async fn insert_daily_counter(&mut self, date: NaiveDate) -> Result<i32, StoreError>;

    async fn store_daily_counter(&mut self, date: NaiveDate, counter: i32)
        -> Result<(), StoreError>;

    async fn insert_inbound(
        &mut self,
        shipment: &NewInboundShipment,
    ) -> Result<InboundShipment, StoreError>;

    async fn lock_inbound(&mut self, id: i64) -> Result<Option<InboundShipment>, StoreError>;

    async fn update_inbound(
        &mut self,
        id: i64,
        shipment: &NewInboundShipment,
    ) -> Result<InboundShipment, StoreError>;

    async fn delete_inbound(&mut self, id: i64) -> Result<(), StoreError>;

    async fn insert_outbound(
        &mut self,
        shipment: &NewOutboundShipment,
        order_id: &OrderId,
        order_date: NaiveDate,
        on_hand_at_order: i32,
    ) -> Result<OutboundShipment, StoreError>;

    async fn lock_outbound(&mut self, id: i64) -> Result<Option<OutboundShipment>, StoreError>;

    /// Rewrites the mutable fields. `order_id` and `on_hand_at_order`
    /// are left as they were.
    async fn update_outbound(
        &mut self,
        id: i64,
        shipment: &NewOutboundShipment,
        order_date: NaiveDate,
    ) -> Result<OutboundShipment, StoreError>;

    async fn delete_outbound(&mut self, id: i64) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
