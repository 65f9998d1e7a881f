use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{respond, AppError, AppResult};
use crate::models::parse_date;
use crate::services::report::{self, DateRange, ReportRow};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/report", get(revenue_report))
        .route("/dashboard", get(dashboard))
}

#[derive(Debug, Default, Deserialize)]
struct ReportQuery {
    dari: Option<String>,
    sampai: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    success: bool,
    message: &'static str,
    data: Vec<ReportRow>,
    #[serde(rename = "totalPendapatan")]
    total_revenue: i64,
}

// GET /api/report?dari=&sampai=
async fn revenue_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let offset = state.offset();
    let bound = |raw: Option<String>, name: &str| -> AppResult<_> {
        match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => parse_date(value, offset)
                .map(Some)
                .ok_or_else(|| AppError::validation(format!("Format tanggal {name} tidak valid"))),
            None => Ok(None),
        }
    };
    let range = DateRange {
        from: bound(query.dari, "dari")?,
        to: bound(query.sampai, "sampai")?,
    };

    let (history, rooms) = futures::try_join!(state.store.list_history(), state.store.list_rooms())?;
    let report = report::revenue_report(&history, &rooms, range, Utc::now(), offset);

    Ok(Json(ReportResponse {
        success: true,
        message: "Laporan pendapatan",
        data: report.rows,
        total_revenue: report.total_revenue,
    }))
}

// GET /api/dashboard
async fn dashboard(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let (bookings, rooms) = futures::try_join!(state.store.list_bookings(), state.store.list_rooms())?;
    let counters = report::dashboard(&bookings, &rooms, Utc::now(), state.offset());
    Ok(respond(StatusCode::OK, "Ringkasan dashboard", counters))
}
