use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::outbound_shipment;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/outbound-shipments",
            get(outbound_shipment::list_outbound_shipments).post(outbound_shipment::create_outbound_shipment),
        )
        .route("/outbound-shipments/bulk", post(outbound_shipment::bulk_create_outbound_shipments))
        .route(
            "/outbound-shipments/{id}",
            get(outbound_shipment::get_outbound_shipment)
                .put(outbound_shipment::update_outbound_shipment)
                .delete(outbound_shipment::delete_outbound_shipment),
        )
}
