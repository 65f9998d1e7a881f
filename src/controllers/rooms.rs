use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{parse_id, respond, AppError, AppJson, AppResult};
use crate::models::room::{CreateRoomRequest, RoomIdRequest, UpdateRoomRequest};
use crate::models::Room;
use crate::services::availability;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/rooms",
            get(list_rooms).post(create_room).put(update_room).delete(delete_room),
        )
        .route("/rooms/status", get(rooms_status))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn capacity(raw: i64) -> AppResult<i32> {
    i32::try_from(raw).map_err(|_| AppError::validation("Kapasitas tidak valid"))
}

// GET /api/rooms
async fn list_rooms(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let rooms = state.store.list_rooms().await?;
    Ok(respond(StatusCode::OK, "Data ruangan", rooms))
}

// POST /api/rooms
async fn create_room(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateRoomRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let missing = req.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let now = Utc::now();
    let room = Room {
        id: Uuid::new_v4(),
        name: trimmed(req.nama).unwrap_or_default(),
        location: trimmed(req.lokasi).unwrap_or_default(),
        capacity: capacity(req.kapasitas.unwrap_or(0))?,
        facilities: req.fasilitas.map(|f| f.into_list()).unwrap_or_default(),
        status: req.status.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };
    state.store.insert_room(&room).await?;

    tracing::info!("Room {} ({}) created", room.id, room.name);
    Ok(respond(StatusCode::CREATED, "Berhasil menambahkan ruangan", room))
}

// PUT /api/rooms
async fn update_room(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UpdateRoomRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let id = parse_id(&req.id, "ruangan")?;
    let mut room = state
        .store
        .find_room(id)
        .await?
        .ok_or_else(|| AppError::not_found("Ruangan tidak ditemukan"))?;

    if let Some(name) = trimmed(req.nama) {
        room.name = name;
    }
    if let Some(location) = trimmed(req.lokasi) {
        room.location = location;
    }
    if let Some(raw) = req.kapasitas {
        room.capacity = capacity(raw)?;
    }
    if let Some(facilities) = req.fasilitas.map(|f| f.into_list()).filter(|f| !f.is_empty()) {
        room.facilities = facilities;
    }
    if let Some(status) = req.status {
        room.status = status;
    }
    room.updated_at = Utc::now();

    if !state.store.update_room(&room).await? {
        return Err(AppError::not_found("Ruangan tidak ditemukan"));
    }
    Ok(respond(StatusCode::OK, "Berhasil mengedit ruangan", room))
}

// DELETE /api/rooms
async fn delete_room(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RoomIdRequest>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&req.id, "ruangan")?;
    let room = state
        .store
        .delete_room(id)
        .await?
        .ok_or_else(|| AppError::not_found("Ruangan tidak ditemukan"))?;

    tracing::info!("Room {} ({}) deleted", room.id, room.name);
    Ok(respond(StatusCode::OK, "Berhasil menghapus ruangan", room))
}

// GET /api/rooms/status
async fn rooms_status(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let (rooms, bookings) = futures::try_join!(state.store.list_rooms(), state.store.list_bookings())?;
    let view = availability::rooms_today(&rooms, &bookings, Utc::now(), state.offset());
    Ok(respond(StatusCode::OK, "Status ruangan hari ini", view))
}
