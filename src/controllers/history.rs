use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{respond, AppError, AppJson, AppResult};
use crate::models::history::{HistoryView, NewHistoryRecord};
use crate::models::room::RoomSummary;
use crate::models::HistoryRecord;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/history", get(list_history).post(insert_history))
}

// GET /api/history
async fn list_history(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let (history, rooms) = futures::try_join!(state.store.list_history(), state.store.list_rooms())?;
    let rooms: HashMap<Uuid, RoomSummary> = rooms.iter().map(|r| (r.id, RoomSummary::from(r))).collect();

    let data: Vec<HistoryView> = history
        .into_iter()
        .map(|record| HistoryView {
            ruangan: record.room_id.and_then(|id| rooms.get(&id).cloned()),
            record,
        })
        .collect();
    Ok(respond(StatusCode::OK, "Data riwayat", data))
}

// POST /api/history
async fn insert_history(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<Vec<NewHistoryRecord>>,
) -> AppResult<impl IntoResponse> {
    if body.is_empty() {
        return Err(AppError::validation("Data kosong"));
    }

    let now = Utc::now();
    let offset = state.offset();
    let records = body
        .into_iter()
        .map(|item| item.into_record(offset, now))
        .collect::<Result<Vec<HistoryRecord>, String>>()
        .map_err(AppError::Validation)?;

    let inserted = state.store.insert_history(&records).await?;
    let skipped = records.len() as u64 - inserted;
    tracing::info!("History bulk insert: {} written, {} already archived", inserted, skipped);

    Ok(respond(
        StatusCode::CREATED,
        "Data riwayat disimpan",
        json!({ "disimpan": inserted, "dilewati": skipped }),
    ))
}
