//! Revenue report over archived bookings and the admin dashboard counters.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::{local_date, local_to_utc, ApprovalStatus, Booking, HistoryRecord, Room};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub id: Uuid,
    pub nama: String,
    pub ruang: String,
    pub lokasi: String,
    pub tanggal: NaiveDate,
    pub jam: String,
    pub durasi: i32,
    pub status: ApprovalStatus,
    pub pembayaran: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub total_revenue: i64,
}

/// Inclusive booking-date window; either end may be open.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Approved history whose end time has passed, with revenue summed over
/// what was paid.
pub fn revenue_report(
    history: &[HistoryRecord],
    rooms: &[Room],
    range: DateRange,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Report {
    let rooms: HashMap<Uuid, &Room> = rooms.iter().map(|r| (r.id, r)).collect();

    let rows: Vec<ReportRow> = history
        .iter()
        .filter(|r| r.status == ApprovalStatus::Approved)
        .filter(|r| range.contains(r.date))
        .filter(|r| local_to_utc(r.date.and_time(r.end_time), offset).is_some_and(|end| end < now))
        .map(|r| {
            let room = r.room_id.and_then(|id| rooms.get(&id));
            ReportRow {
                id: r.id,
                nama: if r.requester_name.is_empty() { "-".to_string() } else { r.requester_name.clone() },
                ruang: room.map_or_else(|| "-".to_string(), |room| room.name.clone()),
                lokasi: room.map_or_else(|| "-".to_string(), |room| room.location.clone()),
                tanggal: r.date,
                jam: format!("{} - {}", r.start_time.format("%H:%M"), r.end_time.format("%H:%M")),
                durasi: r.duration_hours,
                status: r.status,
                pembayaran: r.amount_paid,
            }
        })
        .collect();

    let total_revenue = rows.iter().map(|row| row.pembayaran).sum();
    Report { rows, total_revenue }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    #[serde(rename = "bookingToday")]
    pub booking_today: usize,
    #[serde(rename = "pendingBooking")]
    pub pending_booking: usize,
    #[serde(rename = "totalRuangan")]
    pub total_rooms: usize,
    #[serde(rename = "ruanganTerpakai")]
    pub rooms_in_use: usize,
}

pub fn dashboard(bookings: &[Booking], rooms: &[Room], now: DateTime<Utc>, offset: FixedOffset) -> Dashboard {
    let today = local_date(now, offset);
    let rooms_in_use: HashSet<Uuid> = bookings
        .iter()
        .filter(|b| b.date == today && b.status == ApprovalStatus::Approved)
        .map(|b| b.room_id)
        .collect();

    Dashboard {
        booking_today: bookings.iter().filter(|b| b.date == today).count(),
        pending_booking: bookings.iter().filter(|b| b.status == ApprovalStatus::Pending).count(),
        total_rooms: rooms.len(),
        rooms_in_use: rooms_in_use.len(),
    }
}
