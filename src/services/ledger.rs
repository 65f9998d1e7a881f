//! Payment ledger. Owns payment facts; every write carries the mirror the
//! store applies to the booking in the same transaction. The store drops the
//! mirror when the entry written is not the booking's latest, so editing or
//! verifying an older payment never rolls the booking back.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{parse_id, AppError, AppResult};
use crate::models::payment::{PaymentAmountRequest, PaymentView};
use crate::models::room::RoomSummary;
use crate::models::{Booking, PaymentEntry, PaymentMirror, PaymentSource, VerificationStatus};
use crate::services::pricing::{status_against_total, Pricing};
use crate::store::Repository;

/// A fresh, unverified payment entry for `booking`, classified against its
/// total.
pub fn new_entry(
    booking: &Booking,
    amount: i64,
    source: PaymentSource,
    pricing: &Pricing,
    now: DateTime<Utc>,
) -> PaymentEntry {
    PaymentEntry {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        requester_name: booking.requester_name.clone(),
        room_id: booking.room_id,
        paid_at: now,
        amount,
        status: status_against_total(amount, total_for(booking, pricing)),
        verification: VerificationStatus::Unverified,
        source,
        created_at: now,
        updated_at: now,
    }
}

/// The cached total, or the price at the current rate when none was stored.
pub fn total_for(booking: &Booking, pricing: &Pricing) -> i64 {
    if booking.total_price > 0 {
        booking.total_price
    } else {
        pricing.total_price(booking.duration_hours as i64)
    }
}

fn checked_amount(req: &PaymentAmountRequest) -> AppResult<i64> {
    req.validate()?;
    req.amount.ok_or_else(|| AppError::MissingFields(vec!["jumlahBayar"]))
}

pub struct PaymentLedger {
    store: Arc<dyn Repository>,
    pricing: Pricing,
}

impl PaymentLedger {
    pub fn new(store: Arc<dyn Repository>, pricing: Pricing) -> Self {
        Self { store, pricing }
    }

    async fn booking(&self, id: Uuid) -> AppResult<Booking> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking tidak ditemukan"))
    }

    async fn payment(&self, id: Uuid) -> AppResult<PaymentEntry> {
        self.store
            .find_payment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Data pembayaran tidak ditemukan"))
    }

    /// Payments with their room, latest payment date first.
    pub async fn list(&self) -> AppResult<Vec<PaymentView>> {
        let (payments, rooms) = futures::try_join!(self.store.list_payments(), self.store.list_rooms())?;
        let rooms: HashMap<Uuid, RoomSummary> = rooms.iter().map(|r| (r.id, RoomSummary::from(r))).collect();
        Ok(payments
            .into_iter()
            .map(|entry| PaymentView {
                ruangan: rooms.get(&entry.room_id).cloned(),
                entry,
            })
            .collect())
    }

    /// `req.id` is the booking being paid for.
    pub async fn record(&self, req: PaymentAmountRequest, now: DateTime<Utc>) -> AppResult<PaymentEntry> {
        let amount = checked_amount(&req)?;
        let booking = self.booking(parse_id(&req.id, "booking")?).await?;

        let entry = new_entry(&booking, amount, req.source.unwrap_or_default(), &self.pricing, now);
        self.store.insert_payment(&entry, &PaymentMirror::of(&entry)).await?;

        info!(
            "Payment {} recorded for booking {}: {} ({})",
            entry.id, booking.id, entry.amount, entry.status
        );
        Ok(entry)
    }

    /// `req.id` is the payment entry. Verification is left as it was.
    pub async fn edit(&self, req: PaymentAmountRequest, now: DateTime<Utc>) -> AppResult<PaymentEntry> {
        let amount = checked_amount(&req)?;
        let mut entry = self.payment(parse_id(&req.id, "pembayaran")?).await?;
        let booking = self
            .store
            .find_booking(entry.booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking terkait tidak ditemukan"))?;

        entry.amount = amount;
        entry.status = status_against_total(amount, total_for(&booking, &self.pricing));
        if let Some(source) = req.source {
            entry.source = source;
        }
        entry.updated_at = now;

        if !self.store.update_payment(&entry, &PaymentMirror::of(&entry)).await? {
            return Err(AppError::not_found("Data pembayaran tidak ditemukan"));
        }

        info!("Payment {} edited: {} ({})", entry.id, entry.amount, entry.status);
        Ok(entry)
    }

    /// One-way: a verified payment stays verified.
    pub async fn verify(&self, raw_id: &str, now: DateTime<Utc>) -> AppResult<PaymentEntry> {
        let mut entry = self.payment(parse_id(raw_id, "pembayaran")?).await?;
        if entry.verification == VerificationStatus::Verified {
            return Ok(entry);
        }

        entry.verification = VerificationStatus::Verified;
        entry.updated_at = now;
        if !self.store.update_payment(&entry, &PaymentMirror::of(&entry)).await? {
            return Err(AppError::not_found("Data pembayaran tidak ditemukan"));
        }

        info!("Payment {} verified for booking {}", entry.id, entry.booking_id);
        Ok(entry)
    }

    /// Removes the entry and clears the booking's payment fields.
    pub async fn delete(&self, raw_id: &str) -> AppResult<PaymentEntry> {
        let entry = self.payment(parse_id(raw_id, "pembayaran")?).await?;
        if !self
            .store
            .delete_payment(entry.id, &PaymentMirror::cleared(entry.booking_id))
            .await?
        {
            return Err(AppError::not_found("Data pembayaran tidak ditemukan"));
        }

        info!("Payment {} deleted, booking {} reset", entry.id, entry.booking_id);
        Ok(entry)
    }
}
