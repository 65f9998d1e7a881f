use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{lenient_int, room::RoomSummary, PaymentSource, PaymentStatus, VerificationStatus};

/// One recorded payment against a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub booking_id: Uuid,
    #[serde(rename = "nama_pemesan")]
    pub requester_name: String,
    #[serde(rename = "ruangan")]
    pub room_id: Uuid,
    #[serde(rename = "tanggalBayar")]
    pub paid_at: DateTime<Utc>,
    #[serde(rename = "jumlahBayar")]
    pub amount: i64,
    #[serde(rename = "statusBayar")]
    pub status: PaymentStatus,
    #[serde(rename = "statusPembayaran")]
    pub verification: VerificationStatus,
    #[serde(rename = "sumber_pembayaran")]
    pub source: PaymentSource,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl PaymentEntry {
    /// Ordering key for "most recent": payment date, then creation time,
    /// then id so ties resolve the same way in every store.
    pub fn recency(&self) -> (DateTime<Utc>, DateTime<Utc>, Uuid) {
        (self.paid_at, self.created_at, self.id)
    }
}

/// Payment facts copied onto the booking. The store writes it in the same
/// transaction as the payment entry it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMirror {
    pub booking_id: Uuid,
    pub amount_paid: i64,
    pub payment_status: PaymentStatus,
    pub verification: VerificationStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub source: Option<PaymentSource>,
}

impl PaymentMirror {
    pub fn of(entry: &PaymentEntry) -> Self {
        Self {
            booking_id: entry.booking_id,
            amount_paid: entry.amount,
            payment_status: entry.status,
            verification: entry.verification,
            paid_at: Some(entry.paid_at),
            source: Some(entry.source),
        }
    }

    /// What the booking looks like once its payment is gone.
    pub fn cleared(booking_id: Uuid) -> Self {
        Self {
            booking_id,
            amount_paid: 0,
            payment_status: PaymentStatus::Unpaid,
            verification: VerificationStatus::Unverified,
            paid_at: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub entry: PaymentEntry,
    #[serde(rename = "ruanganInfo")]
    pub ruangan: Option<RoomSummary>,
}

// POST /api/payments, PATCH /api/payments
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentAmountRequest {
    pub id: String,
    #[serde(rename = "jumlahBayar", default, deserialize_with = "lenient_int")]
    #[validate(range(min = 1, message = "Jumlah bayar tidak valid"))]
    pub amount: Option<i64>,
    #[serde(rename = "sumber_pembayaran")]
    pub source: Option<PaymentSource>,
}

// PUT /api/payments
#[derive(Debug, Deserialize)]
pub struct PaymentIdRequest {
    pub id: String,
}

// DELETE /api/payments?id=
#[derive(Debug, Deserialize)]
pub struct PaymentIdQuery {
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_mirror_resets_everything() {
        let id = Uuid::new_v4();
        let mirror = PaymentMirror::cleared(id);
        assert_eq!(mirror.amount_paid, 0);
        assert_eq!(mirror.payment_status, PaymentStatus::Unpaid);
        assert_eq!(mirror.paid_at, None);
        assert_eq!(mirror.source, None);
    }

    #[test]
    fn zero_amount_is_not_a_payment() {
        let req: PaymentAmountRequest = serde_json::from_str(r#"{"id": "x", "jumlahBayar": "0"}"#).unwrap();
        assert!(req.validate().is_err());
        let req: PaymentAmountRequest = serde_json::from_str(r#"{"id": "x", "jumlahBayar": "150000"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.amount, Some(150_000));
    }
}
