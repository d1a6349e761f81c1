use axum::{routing::get, Router};
use crate::handlers::stock_item::{create_stock_item, get_stock_item, list_stock_items};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock-items", get(list_stock_items).post(create_stock_item))
        .route("/stock-items/{sku}", get(get_stock_item))
}
