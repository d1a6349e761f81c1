// src/handlers/stock_item.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Error as SqlxError;
use tracing::{error, instrument};

use crate::dtos::stock_item::{CreateStockItemRequest, StockItemQueryParams};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::ledger::postgres::STOCK_ITEM_COLUMNS;
use crate::models::stock_item::{NewStockItem, StockItem};
use crate::state::AppState;

fn map_unique_violation(err: SqlxError, message: &str) -> AppError {
    match err {
        SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict(message)
        }
        other => other.into(),
    }
}

// GET /stock-items
#[instrument(skip(state, params))]
pub async fn list_stock_items(
    State(state): State<AppState>,
    Query(params): Query<StockItemQueryParams>,
) -> Result<Json<Vec<StockItem>>, AppError> {
    match sqlx::query_as::<_, StockItem>(&format!(
        "SELECT {STOCK_ITEM_COLUMNS} FROM stock_items
         WHERE ($1::TEXT IS NULL OR warehouse_code = $1)
         ORDER BY sku"
    ))
    .bind(params.warehouse_code)
    .fetch_all(&state.db_pool)
    .await
    {
        Ok(items) => Ok(Json(items)),
        Err(e) => {
            error!(?e, "Failed to fetch stock items");
            Err(e.into())
        }
    }
}

// GET /stock-items/{sku}
#[instrument(skip(state))]
pub async fn get_stock_item(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<StockItem>, AppError> {
    let item = sqlx::query_as::<_, StockItem>(&format!(
        "SELECT {STOCK_ITEM_COLUMNS} FROM stock_items WHERE sku = $1"
    ))
    .bind(&sku)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found(format!("SKU {sku} not found")))?;

    Ok(Json(item))
}

// POST /stock-items
#[instrument(skip(state, req))]
pub async fn create_stock_item(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateStockItemRequest>,
) -> Result<(StatusCode, Json<StockItem>), AppError> {
    let item = NewStockItem::try_from(req)?;
    let created = sqlx::query_as::<_, StockItem>(&format!(
        "INSERT INTO stock_items (sku, description, warehouse_code, on_hand_quantity)
         VALUES ($1, $2, $3, $4)
         RETURNING {STOCK_ITEM_COLUMNS}"
    ))
    .bind(&item.sku)
    .bind(&item.description)
    .bind(&item.warehouse_code)
    .bind(item.on_hand_quantity)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "SKU already exists"))?;

    Ok((StatusCode::CREATED, Json(created)))
}
