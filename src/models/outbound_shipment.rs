use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboundShipment {
    pub id: i64,
    pub order_id: String,
    pub order_date: NaiveDate,
    pub shipping_date: NaiveDate,
    pub sku: String,
    pub warehouse_code: String,
    pub quantity: i32,
    // on_hand_quantity of the SKU when the order was placed
    pub on_hand_at_order: i32,
    pub customer_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated outbound shipment fields. `order_date` falls back to the
/// allocation date when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboundShipment {
    pub order_date: Option<NaiveDate>,
    pub shipping_date: NaiveDate,
    pub sku: String,
    pub warehouse_code: String,
    pub quantity: i32,
    pub customer_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub tracking_number: Option<String>,
}
