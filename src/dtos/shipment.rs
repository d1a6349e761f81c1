use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::ledger::LedgerError;
use crate::models::inbound_shipment::NewInboundShipment;
use crate::models::outbound_shipment::NewOutboundShipment;

// ==================== Requests ====================

// Every field is optional on the wire so a missing field is reported by
// name instead of as a generic body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct InboundShipmentRequest {
    pub shipping_date: Option<NaiveDate>,
    pub box_label: Option<String>,
    pub sku: Option<String>,
    pub warehouse_code: Option<String>,
    pub quantity: Option<i32>,
    pub arriving_date: Option<NaiveDate>,
    pub tracking_number: Option<String>,
    pub vendor_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutboundShipmentRequest {
    pub order_date: Option<NaiveDate>,
    pub shipping_date: Option<NaiveDate>,
    pub sku: Option<String>,
    pub warehouse_code: Option<String>,
    pub quantity: Option<i32>,
    pub customer_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Deserialize)]
pub struct ShipmentQueryParams {
    pub sku: Option<String>,
    pub warehouse_code: Option<String>,
    pub order_date: Option<NaiveDate>,
}

// ==================== Responses ====================

#[derive(Serialize)]
pub struct BulkCreateResponse<T> {
    pub count: usize,
    pub shipments: Vec<T>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: i64,
}

// ==================== Validation ====================

fn required<T>(value: Option<T>, field: &str) -> Result<T, LedgerError> {
    value.ok_or_else(|| LedgerError::validation(format!("{field} is required")))
}

fn required_text(value: Option<String>, field: &str) -> Result<String, LedgerError> {
    optional_text(value).ok_or_else(|| LedgerError::validation(format!("{field} is required")))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive_quantity(value: Option<i32>) -> Result<i32, LedgerError> {
    let quantity = required(value, "quantity")?;
    if quantity <= 0 {
        return Err(LedgerError::validation("quantity must be greater than 0"));
    }
    Ok(quantity)
}

impl TryFrom<InboundShipmentRequest> for NewInboundShipment {
    type Error = LedgerError;

    fn try_from(req: InboundShipmentRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            shipping_date: required(req.shipping_date, "shipping_date")?,
            box_label: required_text(req.box_label, "box_label")?,
            sku: required_text(req.sku, "sku")?,
            warehouse_code: required_text(req.warehouse_code, "warehouse_code")?,
            quantity: positive_quantity(req.quantity)?,
            arriving_date: required(req.arriving_date, "arriving_date")?,
            tracking_number: required_text(req.tracking_number, "tracking_number")?,
            vendor_number: required_text(req.vendor_number, "vendor_number")?,
        })
    }
}

impl TryFrom<OutboundShipmentRequest> for NewOutboundShipment {
    type Error = LedgerError;

    fn try_from(req: OutboundShipmentRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            order_date: req.order_date,
            shipping_date: required(req.shipping_date, "shipping_date")?,
            sku: required_text(req.sku, "sku")?,
            warehouse_code: required_text(req.warehouse_code, "warehouse_code")?,
            quantity: positive_quantity(req.quantity)?,
            customer_name: required_text(req.customer_name, "customer_name")?,
            address_line1: required_text(req.address_line1, "address_line1")?,
            address_line2: optional_text(req.address_line2),
            city: required_text(req.city, "city")?,
            state: required_text(req.state, "state")?,
            zip_code: required_text(req.zip_code, "zip_code")?,
            country: required_text(req.country, "country")?,
            phone: optional_text(req.phone),
            tracking_number: optional_text(req.tracking_number),
        })
    }
}

/// Validates every element in order, reporting the first failure with
/// its index.
pub fn validate_batch<R, T>(requests: Vec<R>) -> Result<Vec<T>, LedgerError>
where
    T: TryFrom<R, Error = LedgerError>,
{
    if requests.is_empty() {
        return Err(LedgerError::validation("At least one shipment is required"));
    }
    requests
        .into_iter()
        .enumerate()
        .map(|(index, req)| T::try_from(req).map_err(|e| e.at_index(index)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_inbound() -> InboundShipmentRequest {
        serde_json::from_value(serde_json::json!({
            "shipping_date": "2026-03-01",
            "box_label": "BOX-1",
            "sku": " SKU-1 ",
            "warehouse_code": "WH-A",
            "quantity": 50,
            "arriving_date": "2026-03-05",
            "tracking_number": "1Z999",
            "vendor_number": "V-100"
        }))
        .unwrap()
    }

    #[test]
    fn complete_inbound_request_is_accepted_and_trimmed() {
        let shipment = NewInboundShipment::try_from(complete_inbound()).unwrap();
        assert_eq!(shipment.sku, "SKU-1");
        assert_eq!(shipment.quantity, 50);
    }

    #[test]
    fn missing_or_blank_fields_are_named() {
        let mut req = complete_inbound();
        req.vendor_number = None;
        let err = NewInboundShipment::try_from(req).unwrap_err();
        assert_eq!(err.to_string(), "vendor_number is required");

        let mut req = complete_inbound();
        req.box_label = Some("   ".into());
        let err = NewInboundShipment::try_from(req).unwrap_err();
        assert_eq!(err.to_string(), "box_label is required");
    }

    #[test]
    fn quantity_must_be_positive() {
        let mut req = complete_inbound();
        req.quantity = Some(0);
        let err = NewInboundShipment::try_from(req).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn outbound_requires_address_but_not_tracking() {
        let req: OutboundShipmentRequest = serde_json::from_value(serde_json::json!({
            "shipping_date": "2026-03-08",
            "sku": "SKU-1",
            "warehouse_code": "WH-A",
            "quantity": 3,
            "customer_name": "Ada Lovelace",
            "address_line1": "12 Analytical Way",
            "address_line2": "",
            "city": "London",
            "state": "LDN",
            "zip_code": "N1 9GU",
            "country": "UK"
        }))
        .unwrap();
        let shipment = NewOutboundShipment::try_from(req).unwrap();
        assert_eq!(shipment.address_line2, None);
        assert_eq!(shipment.tracking_number, None);
        assert_eq!(shipment.order_date, None);

        let err = NewOutboundShipment::try_from(OutboundShipmentRequest {
            sku: Some("SKU-1".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "shipping_date is required");
    }

    #[test]
    fn batch_validation_reports_first_bad_index() {
        let mut bad = complete_inbound();
        bad.sku = None;
        let err = validate_batch::<_, NewInboundShipment>(vec![complete_inbound(), bad, complete_inbound()])
            .unwrap_err();
        assert_eq!(err.to_string(), "shipments[1]: sku is required");

        let err = validate_batch::<InboundShipmentRequest, NewInboundShipment>(vec![]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
