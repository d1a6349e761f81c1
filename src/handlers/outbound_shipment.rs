// src/handlers/outbound_shipment.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::shipment::{
    validate_batch, BulkCreateResponse, DeleteResponse, OutboundShipmentRequest, ShipmentQueryParams,
};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::ledger::postgres::OUTBOUND_COLUMNS;
use crate::models::outbound_shipment::{NewOutboundShipment, OutboundShipment};
use crate::state::AppState;

// GET /outbound-shipments
#[instrument(skip(state, params))]
pub async fn list_outbound_shipments(
    State(state): State<AppState>,
    Query(params): Query<ShipmentQueryParams>,
) -> Result<Json<Vec<OutboundShipment>>, AppError> {
    let shipments = sqlx::query_as::<_, OutboundShipment>(&format!(
        "SELECT {OUTBOUND_COLUMNS} FROM outbound_shipments
         WHERE ($1::TEXT IS NULL OR sku = $1)
           AND ($2::TEXT IS NULL OR warehouse_code = $2)
           AND ($3::DATE IS NULL OR order_date = $3)
         ORDER BY order_date DESC, id DESC"
    ))
    .bind(params.sku)
    .bind(params.warehouse_code)
    .bind(params.order_date)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(shipments))
}

// GET /outbound-shipments/{id}
#[instrument(skip(state))]
pub async fn get_outbound_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OutboundShipment>, AppError> {
    let shipment = sqlx::query_as::<_, OutboundShipment>(&format!(
        "SELECT {OUTBOUND_COLUMNS} FROM outbound_shipments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Outbound shipment not found"))?;

    Ok(Json(shipment))
}

// POST /outbound-shipments
#[instrument(skip(state, req))]
pub async fn create_outbound_shipment(
    State(state): State<AppState>,
    AppJson(req): AppJson<OutboundShipmentRequest>,
) -> Result<(StatusCode, Json<OutboundShipment>), AppError> {
    let shipment = NewOutboundShipment::try_from(req)?;
    let created = state.ledger.create_outbound(shipment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// POST /outbound-shipments/bulk
#[instrument(skip(state, req), fields(count = req.len()))]
pub async fn bulk_create_outbound_shipments(
    State(state): State<AppState>,
    AppJson(req): AppJson<Vec<OutboundShipmentRequest>>,
) -> Result<(StatusCode, Json<BulkCreateResponse<OutboundShipment>>), AppError> {
    let shipments = validate_batch::<_, NewOutboundShipment>(req)?;
    let created = state.ledger.bulk_create_outbound(shipments).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse {
            count: created.len(),
            shipments: created,
        }),
    ))
}

// PUT /outbound-shipments/{id}
#[instrument(skip(state, req))]
pub async fn update_outbound_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<OutboundShipmentRequest>,
) -> Result<Json<OutboundShipment>, AppError> {
    let shipment = NewOutboundShipment::try_from(req)?;
    let updated = state.ledger.update_outbound(id, shipment).await?;
    Ok(Json(updated))
}

// DELETE /outbound-shipments/{id}
#[instrument(skip(state))]
pub async fn delete_outbound_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.ledger.delete_outbound(id).await?;
    Ok(Json(DeleteResponse { deleted: true, id }))
}
