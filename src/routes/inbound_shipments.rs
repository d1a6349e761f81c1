use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::inbound_shipment;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inbound-shipments",
            get(inbound_shipment::list_inbound_shipments).post(inbound_shipment::create_inbound_shipment),
        )
        .route("/inbound-shipments/bulk", post(inbound_shipment::bulk_create_inbound_shipments))
        .route(
            "/inbound-shipments/{id}",
            get(inbound_shipment::get_inbound_shipment)
                .put(inbound_shipment::update_inbound_shipment)
                .delete(inbound_shipment::delete_inbound_shipment),
        )
}
