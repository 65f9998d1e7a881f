use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{hhmm, lenient_int, parse_date, room::RoomSummary, ApprovalStatus, Booking};

/// Immutable snapshot of a booking that has run its course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Booking this snapshot came from; unique, so archiving twice is a no-op.
    pub booking_id: Option<Uuid>,
    #[serde(rename = "nama_pemesan")]
    pub requester_name: String,
    #[serde(rename = "nama_acara")]
    pub event_name: String,
    #[serde(rename = "tanggal_booking")]
    pub date: NaiveDate,
    #[serde(rename = "waktu_mulai", with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(rename = "waktu_selesai", with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(rename = "durasi")]
    pub duration_hours: i32,
    #[serde(rename = "id_ruangan")]
    pub room_id: Option<Uuid>,
    #[serde(rename = "pembayaran")]
    pub amount_paid: i64,
    pub status: ApprovalStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn from_booking(booking: &Booking, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: Some(booking.id),
            requester_name: booking.requester_name.clone(),
            event_name: booking.event_name.clone(),
            date: booking.date,
            start_time: booking.start_time,
            end_time: booking.end_time,
            duration_hours: booking.duration_hours,
            room_id: Some(booking.room_id),
            amount_paid: booking.amount_paid,
            status: booking.status,
            created_at: now,
        }
    }
}

/// One element of the bulk `POST /api/history` body: a completed booking as
/// the schedule page holds it. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewHistoryRecord {
    #[serde(rename = "_id")]
    pub booking_id: Option<Uuid>,
    pub nama_pemesan: String,
    pub nama_acara: String,
    pub tanggal_booking: String,
    #[serde(with = "hhmm")]
    pub waktu_mulai: NaiveTime,
    #[serde(with = "hhmm")]
    pub waktu_selesai: NaiveTime,
    #[serde(default, deserialize_with = "lenient_int")]
    pub durasi: Option<i64>,
    pub id_ruangan: Option<Uuid>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub pembayaran: Option<i64>,
    pub status: Option<ApprovalStatus>,
}

impl NewHistoryRecord {
    /// Status defaults to approved: the schedule page only ever sends
    /// bookings it has seen finish.
    pub fn into_record(self, offset: FixedOffset, now: DateTime<Utc>) -> Result<HistoryRecord, String> {
        let date = parse_date(&self.tanggal_booking, offset)
            .ok_or_else(|| format!("Format tanggal_booking tidak valid: {}", self.tanggal_booking))?;
        let duration = self.durasi.unwrap_or(0);
        if !(0..=24).contains(&duration) {
            return Err(format!("Durasi tidak valid: {duration}"));
        }
        Ok(HistoryRecord {
            id: Uuid::new_v4(),
            booking_id: self.booking_id,
            requester_name: self.nama_pemesan.trim().to_string(),
            event_name: self.nama_acara.trim().to_string(),
            date,
            start_time: self.waktu_mulai,
            end_time: self.waktu_selesai,
            duration_hours: duration as i32,
            room_id: self.id_ruangan,
            amount_paid: self.pembayaran.unwrap_or(0).max(0),
            status: self.status.unwrap_or(ApprovalStatus::Approved),
            created_at: now,
        })
    }
}

/// History row with its room, as the history page lists it.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    #[serde(flatten)]
    pub record: HistoryRecord,
    pub ruangan: Option<RoomSummary>,
}
