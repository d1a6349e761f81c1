// src/handlers/inbound_shipment.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::shipment::{
    validate_batch, BulkCreateResponse, DeleteResponse, InboundShipmentRequest, ShipmentQueryParams,
};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::ledger::postgres::INBOUND_COLUMNS;
use crate::models::inbound_shipment::{InboundShipment, NewInboundShipment};
use crate::state::AppState;

// GET /inbound-shipments
#[instrument(skip(state, params))]
pub async fn list_inbound_shipments(
    State(state): State<AppState>,
    Query(params): Query<ShipmentQueryParams>,
) -> Result<Json<Vec<InboundShipment>>, AppError> {
    let shipments = sqlx::query_as::<_, InboundShipment>(&format!(
        "SELECT {INBOUND_COLUMNS} FROM inbound_shipments
         WHERE ($1::TEXT IS NULL OR sku = $1)
           AND ($2::TEXT IS NULL OR warehouse_code = $2)
         ORDER BY arriving_date DESC, id DESC"
    ))
    .bind(params.sku)
    .bind(params.warehouse_code)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(shipments))
}

// GET /inbound-shipments/{id}
#[instrument(skip(state))]
pub async fn get_inbound_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InboundShipment>, AppError> {
    let shipment = sqlx::query_as::<_, InboundShipment>(&format!(
        "SELECT {INBOUND_COLUMNS} FROM inbound_shipments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Inbound shipment not found"))?;

    Ok(Json(shipment))
}

// POST /inbound-shipments
#[instrument(skip(state, req))]
pub async fn create_inbound_shipment(
    State(state): State<AppState>,
    AppJson(req): AppJson<InboundShipmentRequest>,
) -> Result<(StatusCode, Json<InboundShipment>), AppError> {
    let shipment = NewInboundShipment::try_from(req)?;
    let created = state.ledger.create_inbound(shipment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// POST /inbound-shipments/bulk
#[instrument(skip(state, req), fields(count = req.len()))]
pub async fn bulk_create_inbound_shipments(
    State(state): State<AppState>,
    AppJson(req): AppJson<Vec<InboundShipmentRequest>>,
) -> Result<(StatusCode, Json<BulkCreateResponse<InboundShipment>>), AppError> {
    let shipments = validate_batch::<_, NewInboundShipment>(req)?;
    let created = state.ledger.bulk_create_inbound(shipments).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse {
            count: created.len(),
            shipments: created,
        }),
    ))
}

// PUT /inbound-shipments/{id}
#[instrument(skip(state, req))]
pub async fn update_inbound_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<InboundShipmentRequest>,
) -> Result<Json<InboundShipment>, AppError> {
    let shipment = NewInboundShipment::try_from(req)?;
    let updated = state.ledger.update_inbound(id, shipment).await?;
    Ok(Json(updated))
}

// DELETE /inbound-shipments/{id}
#[instrument(skip(state))]
pub async fn delete_inbound_shipment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.ledger.delete_inbound(id).await?;
    Ok(Json(DeleteResponse { deleted: true, id }))
}
