use serde::Deserialize;

use crate::error::AppError;
use crate::models::stock_item::NewStockItem;

#[derive(Debug, Deserialize)]
pub struct CreateStockItemRequest {
    pub sku: String,
    pub description: Option<String>,
    pub warehouse_code: String,
    pub on_hand_quantity: Option<i32>,
}

#[derive(Deserialize)]
pub struct StockItemQueryParams {
    pub warehouse_code: Option<String>,
}

impl TryFrom<CreateStockItemRequest> for NewStockItem {
    type Error = AppError;

    fn try_from(req: CreateStockItemRequest) -> Result<Self, Self::Error> {
        let sku = req.sku.trim().to_string();
        let warehouse_code = req.warehouse_code.trim().to_string();
        if sku.is_empty() {
            return Err(AppError::validation("sku is required"));
        }
        if warehouse_code.is_empty() {
            return Err(AppError::validation("warehouse_code is required"));
        }
        let on_hand_quantity = req.on_hand_quantity.unwrap_or(0);
        if on_hand_quantity < 0 {
            return Err(AppError::validation("on_hand_quantity cannot be negative"));
        }
        Ok(Self {
            sku,
            description: req.description,
            warehouse_code,
            on_hand_quantity,
        })
    }
}
