use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::inbound_shipment::{InboundShipment, NewInboundShipment};
use crate::models::outbound_shipment::{NewOutboundShipment, OutboundShipment};
use crate::models::stock_item::StockItem;

use super::error::StoreError;
use super::sequence::OrderId;
use super::stock::StockLevels;
use super::store::{LedgerStore, LedgerTx};

pub const STOCK_ITEM_COLUMNS: &str = "id, sku, description, warehouse_code, on_hand_quantity, \
     reserved_outbound_quantity, created_at, updated_at";

pub const INBOUND_COLUMNS: &str = "id, shipping_date, box_label, sku, warehouse_code, quantity, \
     arriving_date, tracking_number, vendor_number, created_at, updated_at";

pub const OUTBOUND_COLUMNS: &str = "id, order_id, order_date, shipping_date, sku, warehouse_code, \
     quantity, on_hand_at_order, customer_name, address_line1, address_line2, city, state, \
     zip_code, country, phone, tracking_number, created_at, updated_at";

#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }
}

pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> Result<PgLedgerTx, StoreError> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;
        Ok(PgLedgerTx { tx })
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_stock_item(&mut self, sku: &str) -> Result<Option<StockItem>, StoreError> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {STOCK_ITEM_COLUMNS} FROM stock_items WHERE sku = $1 FOR UPDATE"
        ))
        .bind(sku)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(item)
    }

    async fn warehouse_exists(&mut self, warehouse_code: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_items WHERE warehouse_code = $1)",
        )
        .bind(warehouse_code)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn write_stock_levels(
        &mut self,
        sku: &str,
        levels: StockLevels,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE stock_items
             SET on_hand_quantity = $2,
                 reserved_outbound_quantity = $3,
                 updated_at = NOW()
             WHERE sku = $1",
        )
        .bind(sku)
        .bind(levels.on_hand)
        .bind(levels.reserved_outbound)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_daily_counter(&mut self, date: NaiveDate) -> Result<Option<i32>, StoreError> {
        let counter = sqlx::query_scalar::<_, i32>(
            "SELECT counter FROM daily_order_counters WHERE date = $1 FOR UPDATE",
        )
        .bind(date)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(counter)
    }

    async fn insert_daily_counter(&mut self, date: NaiveDate) -> Result<i32, StoreError> {
        let counter = sqlx::query_scalar::<_, i32>(
            "INSERT INTO daily_order_counters (date, counter) VALUES ($1, 1)
             ON CONFLICT (date) DO UPDATE SET counter = daily_order_counters.counter + 1
             RETURNING counter",
        )
        .bind(date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(counter)
    }

    async fn store_daily_counter(
        &mut self,
        date: NaiveDate,
        counter: i32,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE daily_order_counters SET counter = $2 WHERE date = $1")
            .bind(date)
            .bind(counter)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_inbound(
        &mut self,
        s: &NewInboundShipment,
    ) -> Result<InboundShipment, StoreError> {
        let shipment = sqlx::query_as::<_, InboundShipment>(&format!(
            "INSERT INTO inbound_shipments
                (shipping_date, box_label, sku, warehouse_code, quantity,
                 arriving_date, tracking_number, vendor_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {INBOUND_COLUMNS}"
        ))
        .bind(s.shipping_date)
        .bind(&s.box_label)
        .bind(&s.sku)
        .bind(&s.warehouse_code)
        .bind(s.quantity)
        .bind(s.arriving_date)
        .bind(&s.tracking_number)
        .bind(&s.vendor_number)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(shipment)
    }

    async fn lock_inbound(&mut self, id: i64) -> Result<Option<InboundShipment>, StoreError> {
        let shipment = sqlx::query_as::<_, InboundShipment>(&format!(
            "SELECT {INBOUND_COLUMNS} FROM inbound_shipments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(shipment)
    }

    async fn update_inbound(
        &mut self,
        id: i64,
        s: &NewInboundShipment,
    ) -> Result<InboundShipment, StoreError> {
        let shipment = sqlx::query_as::<_, InboundShipment>(&format!(
            "UPDATE inbound_shipments
             SET shipping_date = $2, box_label = $3, sku = $4, warehouse_code = $5,
                 quantity = $6, arriving_date = $7, tracking_number = $8,
                 vendor_number = $9, updated_at = NOW()
             WHERE id = $1
             RETURNING {INBOUND_COLUMNS}"
        ))
        .bind(id)
        .bind(s.shipping_date)
        .bind(&s.box_label)
        .bind(&s.sku)
        .bind(&s.warehouse_code)
        .bind(s.quantity)
        .bind(s.arriving_date)
        .bind(&s.tracking_number)
        .bind(&s.vendor_number)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(shipment)
    }

    async fn delete_inbound(&mut self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM inbound_shipments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_outbound(
        &mut self,
        s: &NewOutboundShipment,
        order_id: &OrderId,
        order_date: NaiveDate,
        on_hand_at_order: i32,
    ) -> Result<OutboundShipment, StoreError> {
        let shipment = sqlx::query_as::<_, OutboundShipment>(&format!(
            "INSERT INTO outbound_shipments
                (order_id, order_date, shipping_date, sku, warehouse_code, quantity,
                 on_hand_at_order, customer_name, address_line1, address_line2, city,
                 state, zip_code, country, phone, tracking_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {OUTBOUND_COLUMNS}"
        ))
        .bind(order_id.as_str())
        .bind(order_date)
        .bind(s.shipping_date)
        .bind(&s.sku)
        .bind(&s.warehouse_code)
        .bind(s.quantity)
        .bind(on_hand_at_order)
        .bind(&s.customer_name)
        .bind(&s.address_line1)
        .bind(&s.address_line2)
        .bind(&s.city)
        .bind(&s.state)
        .bind(&s.zip_code)
        .bind(&s.country)
        .bind(&s.phone)
        .bind(&s.tracking_number)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(shipment)
    }

    async fn lock_outbound(&mut self, id: i64) -> Result<Option<OutboundShipment>, StoreError> {
        let shipment = sqlx::query_as::<_, OutboundShipment>(&format!(
            "SELECT {OUTBOUND_COLUMNS} FROM outbound_shipments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(shipment)
    }

    async fn update_outbound(
        &mut self,
        id: i64,
        s: &NewOutboundShipment,
        order_date: NaiveDate,
    ) -> Result<OutboundShipment, StoreError> {
        let shipment = sqlx::query_as::<_, OutboundShipment>(&format!(
            "UPDATE outbound_shipments
             SET order_date = $2, shipping_date = $3, sku = $4, warehouse_code = $5,
                 quantity = $6, customer_name = $7, address_line1 = $8, address_line2 = $9,
                 city = $10, state = $11, zip_code = $12, country = $13, phone = $14,
                 tracking_number = $15, updated_at = NOW()
             WHERE id = $1
             RETURNING {OUTBOUND_COLUMNS}"
        ))
        .bind(id)
        .bind(order_date)
        .bind(s.shipping_date)
        .bind(&s.sku)
        .bind(&s.warehouse_code)
        .bind(s.quantity)
        .bind(&s.customer_name)
        .bind(&s.address_line1)
        .bind(&s.address_line2)
        .bind(&s.city)
        .bind(&s.state)
        .bind(&s.zip_code)
        .bind(&s.country)
        .bind(&s.phone)
        .bind(&s.tracking_number)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(shipment)
    }

    async fn delete_outbound(&mut self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM outbound_shipments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
