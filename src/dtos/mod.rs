pub mod shipment;
pub mod stock_item;
