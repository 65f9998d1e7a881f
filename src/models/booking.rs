use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    hhmm, lenient_int, local_to_utc, room::RoomSummary, ApprovalStatus, PaymentMirror, PaymentSource,
    PaymentStatus, VerificationStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "id_ruangan")]
    pub room_id: Uuid,
    #[serde(rename = "nama_pemesan")]
    pub requester_name: String,
    #[serde(rename = "telp")]
    pub phone: String,
    #[serde(rename = "alamat")]
    pub address: String,
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
    #[serde(rename = "pembayaran")]
    pub amount_paid: i64,
    #[serde(rename = "total_harga")]
    pub total_price: i64,
    #[serde(rename = "dp_minimal")]
    pub min_deposit: i64,
    pub status: ApprovalStatus,
    #[serde(rename = "statusBayar")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "statusPembayaran")]
    pub verification: VerificationStatus,
    #[serde(rename = "keterangan_penolakan")]
    pub rejection_reason: String,
    #[serde(rename = "tanggalBayar")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(rename = "sumber_pembayaran")]
    pub payment_source: Option<PaymentSource>,
    /// Set while the booking is being moved into history.
    #[serde(rename = "archivingAt", skip_serializing_if = "Option::is_none")]
    pub archiving_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn starts_at(&self, offset: FixedOffset) -> Option<DateTime<Utc>> {
        local_to_utc(self.date.and_time(self.start_time), offset)
    }

    pub fn ends_at(&self, offset: FixedOffset) -> Option<DateTime<Utc>> {
        local_to_utc(self.date.and_time(self.end_time), offset)
    }

    /// Approved and already over: ready to move into history.
    pub fn is_due_for_archive(&self, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        self.status == ApprovalStatus::Approved && self.ends_at(offset).is_some_and(|end| end < now)
    }

    /// Copies the payment facts of the latest entry onto the booking.
    pub fn apply_mirror(&mut self, mirror: &PaymentMirror) {
        self.amount_paid = mirror.amount_paid;
        self.payment_status = mirror.payment_status;
        self.verification = mirror.verification;
        self.paid_at = mirror.paid_at;
        self.payment_source = mirror.source;
    }
}

/// Listing row: the booking plus its room and the "done" flag the schedule
/// page highlights.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub ruangan: Option<RoomSummary>,
    #[serde(rename = "isSelesai")]
    pub is_finished: bool,
}

// POST /api/bookings
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(max = 120))]
    pub nama_pemesan: Option<String>,
    #[validate(length(max = 200))]
    pub nama_acara: Option<String>,
    pub tanggal_booking: Option<String>,
    pub waktu_mulai: Option<String>,
    pub waktu_selesai: Option<String>,
    pub id_ruangan: Option<String>,
    #[validate(length(max = 30))]
    pub telp: Option<String>,
    #[validate(length(max = 300))]
    pub alamat: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    #[validate(range(min = 1, max = 8, message = "Durasi harus antara 1 sampai 8 jam"))]
    pub durasi: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    #[validate(range(min = 0, message = "Pembayaran tidak boleh negatif"))]
    pub pembayaran: Option<i64>,
    /// `Approved` books immediately; anything else starts as `Pending`.
    pub status: Option<ApprovalStatus>,
}

// PUT /api/bookings
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub status: Option<ApprovalStatus>,
    pub alasan: Option<String>,
    #[serde(rename = "statusPembayaran")]
    pub verification: Option<VerificationStatus>,
    #[validate(length(max = 120))]
    pub nama_pemesan: Option<String>,
    #[validate(length(max = 200))]
    pub nama_acara: Option<String>,
    pub tanggal_booking: Option<String>,
    pub waktu_mulai: Option<String>,
    pub waktu_selesai: Option<String>,
    pub id_ruangan: Option<String>,
    #[validate(length(max = 30))]
    pub telp: Option<String>,
    #[validate(length(max = 300))]
    pub alamat: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    #[validate(range(min = 1, max = 8, message = "Durasi harus antara 1 sampai 8 jam"))]
    pub durasi: Option<i64>,
}

// DELETE /api/bookings
#[derive(Debug, Deserialize)]
pub struct BookingIdRequest {
    pub id: String,
}

// PATCH /api/bookings/{id}/reject
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub alasan: Option<String>,
}
