use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockItem {
    pub id: i64,
    pub sku: String,
    pub description: Option<String>,
    pub warehouse_code: String,
    pub on_hand_quantity: i32,
    pub reserved_outbound_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStockItem {
    pub sku: String,
    pub description: Option<String>,
    pub warehouse_code: String,
    pub on_hand_quantity: i32,
}
