use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::{respond, AppResult};
use crate::models::Room;
use crate::services::availability::{self, Calendar, DayStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/calendar", get(calendar))
}

#[derive(Debug, Default, Deserialize)]
struct CalendarQuery {
    ruangan: Option<String>,
}

#[derive(Debug, Serialize)]
struct CalendarResponse {
    ruangan: Vec<String>,
    kalender: Calendar,
    /// Tile colour per date that has bookings; absent dates are available.
    status: BTreeMap<NaiveDate, DayStatus>,
}

// GET /api/calendar?ruangan=
async fn calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<impl IntoResponse> {
    let (bookings, rooms) = futures::try_join!(state.store.list_bookings(), state.store.list_rooms())?;
    let active: Vec<Room> = rooms.into_iter().filter(Room::is_active).collect();

    let calendar = availability::aggregate(&bookings, &active);
    let filter = query.ruangan.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let status = calendar
        .days
        .keys()
        .map(|date| (*date, calendar.day_status(*date, filter)))
        .collect();

    Ok(respond(
        StatusCode::OK,
        "Data kalender",
        CalendarResponse {
            ruangan: active.into_iter().map(|r| r.name).collect(),
            kalender: calendar,
            status,
        },
    ))
}
