use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::errors::{respond, AppError, AppJson, AppResult};
use crate::models::payment::{PaymentAmountRequest, PaymentIdQuery, PaymentIdRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/payments",
        get(list_payments)
            .post(record_payment)
            .put(verify_payment)
            .patch(edit_payment)
            .delete(delete_payment),
    )
}

// GET /api/payments
async fn list_payments(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let payments = state.ledger().list().await?;
    Ok(respond(StatusCode::OK, "Data pembayaran", payments))
}

// POST /api/payments
async fn record_payment(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<PaymentAmountRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = state.ledger().record(req, Utc::now()).await?;
    Ok(respond(StatusCode::CREATED, "Pembayaran berhasil disimpan", entry))
}

// PUT /api/payments
async fn verify_payment(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<PaymentIdRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = state.ledger().verify(&req.id, Utc::now()).await?;
    Ok(respond(StatusCode::OK, "Status pembayaran dikonfirmasi", entry))
}

// PATCH /api/payments
async fn edit_payment(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<PaymentAmountRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = state.ledger().edit(req, Utc::now()).await?;
    Ok(respond(StatusCode::OK, "Jumlah pembayaran diperbarui", entry))
}

// DELETE /api/payments?id=
async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaymentIdQuery>,
) -> AppResult<impl IntoResponse> {
    let id = query.id.ok_or_else(|| AppError::MissingFields(vec!["id"]))?;
    let entry = state.ledger().delete(&id).await?;
    Ok(respond(StatusCode::OK, "Pembayaran dihapus", entry))
}
