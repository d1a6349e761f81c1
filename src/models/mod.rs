pub mod stock_item;
pub mod inbound_shipment;
pub mod outbound_shipment;
