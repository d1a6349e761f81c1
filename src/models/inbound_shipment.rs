use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InboundShipment {
    pub id: i64,
    pub shipping_date: NaiveDate,
    pub box_label: String,
    pub sku: String,
    pub warehouse_code: String,
    pub quantity: i32,
    pub arriving_date: NaiveDate,
    pub tracking_number: String,
    pub vendor_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated inbound shipment fields, as written on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInboundShipment {
    pub shipping_date: NaiveDate,
    pub box_label: String,
    pub sku: String,
    pub warehouse_code: String,
    pub quantity: i32,
    pub arriving_date: NaiveDate,
    pub tracking_number: String,
    pub vendor_number: String,
}
