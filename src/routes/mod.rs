pub mod stock_items;
pub mod inbound_shipments;
pub mod outbound_shipments;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(stock_items::routes())
        .merge(inbound_shipments::routes())
        .merge(outbound_shipments::routes())
}
