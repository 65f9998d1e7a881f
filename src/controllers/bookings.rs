use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::errors::{respond, AppJson, AppResult};
use crate::models::booking::{BookingIdRequest, CreateBookingRequest, RejectRequest, UpdateBookingRequest};
use crate::services::lifecycle::Completion;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/bookings",
            get(list_bookings)
                .post(create_booking)
                .put(update_booking)
                .delete(delete_booking),
        )
        .route("/bookings/schedule", get(schedule))
        .route("/bookings/{id}/complete", post(complete_booking))
        .route("/bookings/{id}/approve", patch(approve_booking))
        .route("/bookings/{id}/reject", patch(reject_booking))
}

/* ---------- BOOKINGS ---------- */

// GET /api/bookings
async fn list_bookings(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let bookings = state.lifecycle().list(Utc::now()).await?;
    Ok(respond(StatusCode::OK, "Data booking", bookings))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state.lifecycle().create(req, Utc::now()).await?;
    Ok(respond(StatusCode::CREATED, "Booking berhasil disimpan", booking))
}

// PUT /api/bookings
async fn update_booking(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UpdateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state.lifecycle().update(req, Utc::now()).await?;
    Ok(respond(StatusCode::OK, "Booking berhasil diperbarui", booking))
}

// DELETE /api/bookings
async fn delete_booking(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<BookingIdRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state.lifecycle().delete(&req.id).await?;
    Ok(respond(StatusCode::OK, "Booking berhasil dihapus", booking))
}

/* ---------- LIFECYCLE ---------- */

// GET /api/bookings/schedule
async fn schedule(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let bookings = state.lifecycle().schedule(Utc::now()).await?;
    Ok(respond(StatusCode::OK, "Jadwal booking", bookings))
}

// POST /api/bookings/{id}/complete
async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let response = match state.lifecycle().complete(&id, Utc::now()).await? {
        Completion::Archived(record) => respond(
            StatusCode::CREATED,
            "Booking selesai dan dipindahkan ke riwayat",
            record,
        ),
        Completion::AlreadyArchived(record) => respond(StatusCode::OK, "Booking sudah ada di riwayat", record),
    };
    Ok(response)
}

// PATCH /api/bookings/{id}/approve
async fn approve_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let booking = state.lifecycle().approve(&id, Utc::now()).await?;
    Ok(respond(StatusCode::OK, "Booking disetujui", booking))
}

// PATCH /api/bookings/{id}/reject
async fn reject_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state.lifecycle().reject(&id, req.alasan, Utc::now()).await?;
    Ok(respond(StatusCode::OK, "Booking ditolak", booking))
}
