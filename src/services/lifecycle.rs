//! Booking lifecycle: create, edit, approve/reject, delete, and the move of
//! finished bookings into history.
//!
//! Moving into history is mark-then-move: the booking is tagged
//! `archiving_at`, the snapshot is written (unique per booking), then the
//! live row is deleted. A crash anywhere in between leaves the tag behind,
//! and `recover` finishes the move on the next start.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{parse_id, AppError, AppResult};
use crate::models::booking::{BookingView, CreateBookingRequest, UpdateBookingRequest};
use crate::models::room::RoomSummary;
use crate::models::{
    blank, parse_date, parse_time, ApprovalStatus, Booking, HistoryRecord, PaymentMirror, PaymentStatus, Room,
    VerificationStatus,
};
use crate::services::ledger;
use crate::services::pricing::{status_against_total, Pricing};
use crate::store::{Repository, StoreResult};

/// Outcome of a manual "mark complete".
#[derive(Debug, Clone)]
pub enum Completion {
    Archived(HistoryRecord),
    /// The booking had already been moved; nothing was written.
    AlreadyArchived(HistoryRecord),
}

impl Completion {
    pub fn record(&self) -> &HistoryRecord {
        match self {
            Completion::Archived(record) | Completion::AlreadyArchived(record) => record,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SweepReport {
    pub archived: usize,
    pub failed: usize,
}

fn required_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn date_field(raw: &str, offset: FixedOffset) -> AppResult<NaiveDate> {
    parse_date(raw, offset).ok_or_else(|| AppError::validation("Format tanggal_booking tidak valid"))
}

fn time_field(raw: &str, name: &str) -> AppResult<NaiveTime> {
    parse_time(raw).ok_or_else(|| AppError::validation(format!("Format {name} tidak valid (HH:MM)")))
}

fn check_time_range(start: NaiveTime, end: NaiveTime) -> AppResult<()> {
    if end <= start {
        return Err(AppError::validation("Waktu selesai harus setelah waktu mulai"));
    }
    Ok(())
}

/// Applies an approval decision. Only pending requests can be decided;
/// repeating the current decision is a no-op.
pub fn transition(booking: &mut Booking, to: ApprovalStatus, reason: Option<String>) -> AppResult<()> {
    if booking.status == to {
        if let (ApprovalStatus::Rejected, Some(reason)) = (to, required_text(&reason)) {
            booking.rejection_reason = reason;
        }
        return Ok(());
    }
    match (booking.status, to) {
        (_, ApprovalStatus::Pending) => Err(AppError::validation(
            "Status booking tidak bisa dikembalikan ke Menunggu",
        )),
        (ApprovalStatus::Pending, ApprovalStatus::Approved) => {
            booking.status = ApprovalStatus::Approved;
            booking.rejection_reason.clear();
            Ok(())
        }
        (ApprovalStatus::Pending, ApprovalStatus::Rejected) => {
            booking.status = ApprovalStatus::Rejected;
            booking.rejection_reason = required_text(&reason).unwrap_or_default();
            Ok(())
        }
        (from, to) => Err(AppError::conflict(format!(
            "Booking berstatus {from} tidak bisa diubah menjadi {to}"
        ))),
    }
}

/// `isSelesai`: approved, something paid, and already over.
pub fn is_finished(booking: &Booking, now: DateTime<Utc>, offset: FixedOffset) -> bool {
    booking.status == ApprovalStatus::Approved
        && booking.amount_paid > 0
        && booking.ends_at(offset).is_some_and(|end| end < now)
}

pub struct BookingLifecycle {
    store: Arc<dyn Repository>,
    pricing: Pricing,
    offset: FixedOffset,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn Repository>, pricing: Pricing, offset: FixedOffset) -> Self {
        Self { store, pricing, offset }
    }

    async fn room(&self, raw_id: &str) -> AppResult<Room> {
        let id = parse_id(raw_id, "ruangan")?;
        self.store
            .find_room(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ruangan tidak ditemukan"))
    }

    async fn booking(&self, id: Uuid) -> AppResult<Booking> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking tidak ditemukan"))
    }

    async fn save(&self, booking: &Booking) -> AppResult<()> {
        if !self.store.update_booking(booking).await? {
            return Err(AppError::not_found("Booking tidak ditemukan"));
        }
        Ok(())
    }

    fn reprice(&self, booking: &mut Booking) {
        let quote = self.pricing.quote(booking.duration_hours as i64);
        booking.total_price = quote.total_price;
        booking.min_deposit = quote.min_deposit;
        booking.payment_status = status_against_total(booking.amount_paid, quote.total_price);
    }

    /// Every booking with its room and completion flag, newest first.
    pub async fn list(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingView>> {
        let (bookings, rooms) = futures::try_join!(self.store.list_bookings(), self.store.list_rooms())?;
        Ok(self.views(bookings, &rooms, now))
    }

    fn views(&self, bookings: Vec<Booking>, rooms: &[Room], now: DateTime<Utc>) -> Vec<BookingView> {
        let rooms: HashMap<Uuid, RoomSummary> = rooms.iter().map(|r| (r.id, RoomSummary::from(r))).collect();
        bookings
            .into_iter()
            .map(|booking| BookingView {
                ruangan: rooms.get(&booking.room_id).cloned(),
                is_finished: is_finished(&booking, now, self.offset),
                booking,
            })
            .collect()
    }

    /// Operational schedule: sweeps finished bookings first, then returns
    /// the approved ones left, earliest first.
    pub async fn schedule(&self, now: DateTime<Utc>) -> AppResult<Vec<BookingView>> {
        self.sweep(now).await?;
        let (bookings, rooms) = futures::try_join!(self.store.list_bookings(), self.store.list_rooms())?;
        let mut approved: Vec<Booking> = bookings
            .into_iter()
            .filter(|b| b.status == ApprovalStatus::Approved)
            .collect();
        approved.sort_by_key(|b| (b.date, b.start_time));
        Ok(self.views(approved, &rooms, now))
    }

    pub async fn create(&self, req: CreateBookingRequest, now: DateTime<Utc>) -> AppResult<Booking> {
        req.validate()?;

        let fields = [
            ("nama_pemesan", &req.nama_pemesan),
            ("nama_acara", &req.nama_acara),
            ("tanggal_booking", &req.tanggal_booking),
            ("waktu_mulai", &req.waktu_mulai),
            ("waktu_selesai", &req.waktu_selesai),
            ("id_ruangan", &req.id_ruangan),
            ("telp", &req.telp),
            ("alamat", &req.alamat),
        ];
        let mut missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| blank(value))
            .map(|(name, _)| *name)
            .collect();
        if req.durasi.is_none() {
            missing.push("durasi");
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let text = |value: &Option<String>| required_text(value).unwrap_or_default();
        let date = date_field(&text(&req.tanggal_booking), self.offset)?;
        let start_time = time_field(&text(&req.waktu_mulai), "waktu_mulai")?;
        let end_time = time_field(&text(&req.waktu_selesai), "waktu_selesai")?;
        check_time_range(start_time, end_time)?;
        let room = self.room(&text(&req.id_ruangan)).await?;

        let duration = req.durasi.unwrap_or_default();
        let amount_paid = req.pembayaran.unwrap_or(0);
        let quote = self.pricing.quote(duration);
        let status = match req.status {
            Some(ApprovalStatus::Approved) => ApprovalStatus::Approved,
            _ => ApprovalStatus::Pending,
        };

        let mut booking = Booking {
            id: Uuid::new_v4(),
            room_id: room.id,
            requester_name: text(&req.nama_pemesan),
            phone: text(&req.telp),
            address: text(&req.alamat),
            event_name: text(&req.nama_acara),
            date,
            start_time,
            end_time,
            duration_hours: duration as i32,
            amount_paid: 0,
            total_price: quote.total_price,
            min_deposit: quote.min_deposit,
            status,
            payment_status: PaymentStatus::Unpaid,
            verification: VerificationStatus::Unverified,
            rejection_reason: String::new(),
            paid_at: None,
            payment_source: None,
            archiving_at: None,
            created_at: now,
            updated_at: now,
        };
        if amount_paid > 0 {
            let entry = ledger::new_entry(&booking, amount_paid, Default::default(), &self.pricing, now);
            booking.apply_mirror(&PaymentMirror::of(&entry));
            self.store.insert_booking_with_payment(&booking, &entry).await?;
        } else {
            self.store.insert_booking(&booking).await?;
        }

        info!(
            "Booking {} created for room {} on {} ({}, {})",
            booking.id, room.name, booking.date, booking.status, booking.payment_status
        );
        Ok(booking)
    }

    /// Edits fields, decides approval, or marks the payment verified. Price
    /// and payment status are re-derived when the room or duration changes.
    pub async fn update(&self, req: UpdateBookingRequest, now: DateTime<Utc>) -> AppResult<Booking> {
        req.validate()?;
        let raw_id = required_text(&req.id).ok_or_else(|| AppError::MissingFields(vec!["_id"]))?;
        let mut booking = self.booking(parse_id(&raw_id, "booking")?).await?;

        if let Some(status) = req.status {
            transition(&mut booking, status, req.alasan.clone())?;
        }

        match (booking.verification, req.verification) {
            (VerificationStatus::Verified, Some(VerificationStatus::Unverified)) => {
                return Err(AppError::conflict("Verifikasi pembayaran tidak bisa dibatalkan"));
            }
            (_, Some(verification)) => booking.verification = verification,
            _ => {}
        }

        if let Some(name) = required_text(&req.nama_pemesan) {
            booking.requester_name = name;
        }
        if let Some(event) = required_text(&req.nama_acara) {
            booking.event_name = event;
        }
        if let Some(phone) = required_text(&req.telp) {
            booking.phone = phone;
        }
        if let Some(address) = required_text(&req.alamat) {
            booking.address = address;
        }
        if let Some(raw) = required_text(&req.tanggal_booking) {
            booking.date = date_field(&raw, self.offset)?;
        }
        if let Some(raw) = required_text(&req.waktu_mulai) {
            booking.start_time = time_field(&raw, "waktu_mulai")?;
        }
        if let Some(raw) = required_text(&req.waktu_selesai) {
            booking.end_time = time_field(&raw, "waktu_selesai")?;
        }
        check_time_range(booking.start_time, booking.end_time)?;

        let mut reprice = false;
        if let Some(raw) = required_text(&req.id_ruangan) {
            let room = self.room(&raw).await?;
            reprice |= room.id != booking.room_id;
            booking.room_id = room.id;
        }
        if let Some(duration) = req.durasi {
            reprice |= duration != booking.duration_hours as i64;
            booking.duration_hours = duration as i32;
        }
        if reprice {
            self.reprice(&mut booking);
        }

        booking.updated_at = now;
        self.save(&booking).await?;
        info!("Booking {} updated ({}, {})", booking.id, booking.status, booking.payment_status);
        Ok(booking)
    }

    pub async fn approve(&self, raw_id: &str, now: DateTime<Utc>) -> AppResult<Booking> {
        self.decide(raw_id, ApprovalStatus::Approved, None, now).await
    }

    pub async fn reject(&self, raw_id: &str, reason: Option<String>, now: DateTime<Utc>) -> AppResult<Booking> {
        self.decide(raw_id, ApprovalStatus::Rejected, reason, now).await
    }

    async fn decide(
        &self,
        raw_id: &str,
        to: ApprovalStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let mut booking = self.booking(parse_id(raw_id, "booking")?).await?;
        transition(&mut booking, to, reason)?;
        booking.updated_at = now;
        self.save(&booking).await?;
        info!("Booking {} is now {}", booking.id, booking.status);
        Ok(booking)
    }

    /// Administrative removal; nothing is archived.
    pub async fn delete(&self, raw_id: &str) -> AppResult<Booking> {
        let id = parse_id(raw_id, "booking")?;
        let booking = self
            .store
            .delete_booking(id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking tidak ditemukan"))?;
        info!("Booking {} deleted", booking.id);
        Ok(booking)
    }

    /// Moves one approved booking into history regardless of its end time.
    pub async fn complete(&self, raw_id: &str, now: DateTime<Utc>) -> AppResult<Completion> {
        let id = parse_id(raw_id, "booking")?;
        let Some(booking) = self.store.find_booking(id).await? else {
            return match self.store.find_history_by_booking(id).await? {
                Some(record) => Ok(Completion::AlreadyArchived(record)),
                None => Err(AppError::not_found("Booking tidak ditemukan")),
            };
        };

        if booking.status != ApprovalStatus::Approved {
            return Err(AppError::conflict("Hanya booking yang disetujui yang bisa diselesaikan"));
        }

        match self.archive(booking.id, now).await? {
            Some(record) => Ok(Completion::Archived(record)),
            None => match self.store.find_history_by_booking(id).await? {
                Some(record) => Ok(Completion::AlreadyArchived(record)),
                None => Err(AppError::not_found("Booking tidak ditemukan")),
            },
        }
    }

    /// Mark, snapshot, delete. Returns `None` when the booking vanished
    /// before it could be marked.
    async fn archive(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<Option<HistoryRecord>> {
        let Some(booking) = self.store.mark_archiving(id, now).await? else {
            return Ok(None);
        };

        let record = HistoryRecord::from_booking(&booking, now);
        let written = self.store.insert_history(std::slice::from_ref(&record)).await?;
        self.store.delete_booking(id).await?;

        if written == 0 {
            // a previous, interrupted move already wrote the snapshot
            return self.store.find_history_by_booking(id).await;
        }
        info!("Booking {} moved to history", id);
        Ok(Some(record))
    }

    /// Archives every approved booking whose end time has passed. Failures
    /// are logged and counted; the rest of the sweep continues.
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let due: Vec<Uuid> = self
            .store
            .list_bookings()
            .await?
            .into_iter()
            .filter(|b| b.is_due_for_archive(now, self.offset))
            .map(|b| b.id)
            .collect();

        let mut report = SweepReport::default();
        for id in due {
            match self.archive(id, now).await {
                Ok(Some(_)) => report.archived += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("sweep: failed to archive booking {}: {:?}", id, e);
                    report.failed += 1;
                }
            }
        }

        if report.archived > 0 || report.failed > 0 {
            info!("Sweep finished: {} archived, {} failed", report.archived, report.failed);
        }
        Ok(report)
    }

    /// Finishes moves interrupted by a crash.
    pub async fn recover(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let stuck = self.store.list_archiving().await?;
        if !stuck.is_empty() {
            warn!("Found {} bookings left mid-archive, finishing", stuck.len());
        }

        let mut report = SweepReport::default();
        for booking in stuck {
            match self.archive(booking.id, now).await {
                Ok(Some(_)) => report.archived += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("recovery: failed to archive booking {}: {:?}", booking.id, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{booking_on, hm, room, wib, ymd};
    use crate::models::local_to_utc;
    use crate::store::MemoryStore;
    use fake::{faker::name::raw::Name, locales::EN, Fake};

    struct Setup {
        lifecycle: BookingLifecycle,
        store: Arc<dyn Repository>,
        room: Room,
    }

    async fn setup() -> Setup {
        let store: Arc<dyn Repository> = Arc::new(MemoryStore::new());
        let hall = room("Aula");
        store.insert_room(&hall).await.unwrap();
        Setup {
            lifecycle: BookingLifecycle::new(store.clone(), Pricing::default(), wib()),
            store,
            room: hall,
        }
    }

    fn create_request(room_id: Uuid, durasi: i64) -> CreateBookingRequest {
        let name: String = Name(EN).fake();
        CreateBookingRequest {
            nama_pemesan: Some(name),
            nama_acara: Some("Resepsi".to_string()),
            tanggal_booking: Some("2025-06-14".to_string()),
            waktu_mulai: Some("09:00".to_string()),
            waktu_selesai: Some("12:00".to_string()),
            id_ruangan: Some(room_id.to_string()),
            telp: Some("0812".to_string()),
            alamat: Some("Jl. Mawar".to_string()),
            durasi: Some(durasi),
            pembayaran: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_prices_and_defaults_to_pending() {
        let s = setup().await;
        let booking = s.lifecycle.create(create_request(s.room.id, 3), Utc::now()).await.unwrap();

        assert_eq!(booking.total_price, 3_000_000);
        assert_eq!(booking.min_deposit, 900_000);
        assert_eq!(booking.status, ApprovalStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
        assert!(s.store.find_booking(booking.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_with_payment_records_a_ledger_entry() {
        let s = setup().await;
        let mut req = create_request(s.room.id, 2);
        req.pembayaran = Some(600_000);
        req.status = Some(ApprovalStatus::Approved);

        let booking = s.lifecycle.create(req, Utc::now()).await.unwrap();
        assert_eq!(booking.status, ApprovalStatus::Approved);
        assert_eq!(booking.payment_status, PaymentStatus::Deposit);

        let payments = s.store.list_payments().await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].booking_id, booking.id);
        let stored = s.store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_paid, 600_000);
        assert_eq!(stored.paid_at, Some(payments[0].paid_at));
        assert_eq!(stored.payment_source, Some(payments[0].source));
        assert_eq!(s.store.list_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn out_of_range_dates_are_refused_on_create_and_update() {
        let s = setup().await;
        let mut req = create_request(s.room.id, 2);
        req.tanggal_booking = Some("-262143-01-01".to_string());
        req.status = Some(ApprovalStatus::Approved);
        assert!(matches!(s.lifecycle.create(req, Utc::now()).await.unwrap_err(), AppError::Validation(_)));
        assert!(s.store.list_bookings().await.unwrap().is_empty());

        let booking = s.lifecycle.create(create_request(s.room.id, 2), Utc::now()).await.unwrap();
        let update = UpdateBookingRequest {
            id: Some(booking.id.to_string()),
            tanggal_booking: Some("0001-01-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(s.lifecycle.update(update, Utc::now()).await.unwrap_err(), AppError::Validation(_)));
        assert!(s.lifecycle.schedule(Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn create_lists_every_missing_field() {
        let s = setup().await;
        let req = CreateBookingRequest {
            nama_pemesan: Some("Dewi".to_string()),
            telp: Some("   ".to_string()),
            ..Default::default()
        };
        match s.lifecycle.create(req, Utc::now()).await.unwrap_err() {
            AppError::MissingFields(fields) => assert_eq!(
                fields,
                vec![
                    "nama_acara",
                    "tanggal_booking",
                    "waktu_mulai",
                    "waktu_selesai",
                    "id_ruangan",
                    "telp",
                    "alamat",
                    "durasi"
                ]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_room_and_bad_times() {
        let s = setup().await;
        let err = s.lifecycle.create(create_request(Uuid::new_v4(), 2), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let mut req = create_request(s.room.id, 2);
        req.id_ruangan = Some("bukan-id".to_string());
        assert!(matches!(s.lifecycle.create(req, Utc::now()).await.unwrap_err(), AppError::Validation(_)));

        let mut req = create_request(s.room.id, 2);
        req.waktu_selesai = Some("08:00".to_string());
        assert!(matches!(s.lifecycle.create(req, Utc::now()).await.unwrap_err(), AppError::Validation(_)));
        assert!(s.store.list_bookings().await.unwrap().is_empty());
    }

    #[test]
    fn decisions_only_leave_pending() {
        let mut booking = booking_on(Uuid::new_v4(), ymd(2025, 1, 1), hm(8, 0), hm(9, 0), ApprovalStatus::Pending);
        transition(&mut booking, ApprovalStatus::Rejected, Some(" Jadwal bentrok ".to_string())).unwrap();
        assert_eq!(booking.rejection_reason, "Jadwal bentrok");

        let err = transition(&mut booking, ApprovalStatus::Approved, None).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = transition(&mut booking, ApprovalStatus::Pending, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        transition(&mut booking, ApprovalStatus::Rejected, None).unwrap();
        assert_eq!(booking.status, ApprovalStatus::Rejected);
    }

    #[tokio::test]
    async fn update_reprices_on_duration_change_and_keeps_amount() {
        let s = setup().await;
        let mut req = create_request(s.room.id, 2);
        req.pembayaran = Some(1_000_000);
        let booking = s.lifecycle.create(req, Utc::now()).await.unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Deposit);

        let update = UpdateBookingRequest {
            id: Some(booking.id.to_string()),
            durasi: Some(1),
            waktu_selesai: Some("10:00".to_string()),
            ..Default::default()
        };
        let updated = s.lifecycle.update(update, Utc::now()).await.unwrap();
        assert_eq!(updated.total_price, 1_000_000);
        assert_eq!(updated.min_deposit, 300_000);
        assert_eq!(updated.amount_paid, 1_000_000);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn update_refuses_to_unverify() {
        let s = setup().await;
        let booking = s.lifecycle.create(create_request(s.room.id, 2), Utc::now()).await.unwrap();
        let verify = UpdateBookingRequest {
            id: Some(booking.id.to_string()),
            verification: Some(VerificationStatus::Verified),
            ..Default::default()
        };
        s.lifecycle.update(verify, Utc::now()).await.unwrap();

        let unverify = UpdateBookingRequest {
            id: Some(booking.id.to_string()),
            verification: Some(VerificationStatus::Unverified),
            ..Default::default()
        };
        let err = s.lifecycle.update(unverify, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn sweep_moves_only_finished_approved_bookings() {
        let s = setup().await;
        let day = ymd(2025, 4, 10);
        let done = booking_on(s.room.id, day, hm(8, 0), hm(10, 0), ApprovalStatus::Approved);
        let running = booking_on(s.room.id, day, hm(11, 0), hm(13, 0), ApprovalStatus::Approved);
        let waiting = booking_on(s.room.id, day, hm(6, 0), hm(7, 0), ApprovalStatus::Pending);
        for b in [&done, &running, &waiting] {
            s.store.insert_booking(b).await.unwrap();
        }

        let now = local_to_utc(day.and_time(hm(12, 0)), wib()).unwrap();
        let report = s.lifecycle.sweep(now).await.unwrap();
        assert_eq!(report, SweepReport { archived: 1, failed: 0 });

        let history = s.store.list_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].booking_id, Some(done.id));
        assert!(s.store.find_booking(done.id).await.unwrap().is_none());
        assert!(s.store.find_booking(running.id).await.unwrap().is_some());
        assert!(s.store.find_booking(waiting.id).await.unwrap().is_some());

        let again = s.lifecycle.sweep(now).await.unwrap();
        assert_eq!(again.archived, 0);
        assert_eq!(s.store.list_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completing_twice_writes_one_snapshot() {
        let s = setup().await;
        let booking = booking_on(s.room.id, ymd(2099, 1, 1), hm(8, 0), hm(10, 0), ApprovalStatus::Approved);
        s.store.insert_booking(&booking).await.unwrap();
        let id = booking.id.to_string();

        assert!(matches!(s.lifecycle.complete(&id, Utc::now()).await.unwrap(), Completion::Archived(_)));
        assert!(matches!(
            s.lifecycle.complete(&id, Utc::now()).await.unwrap(),
            Completion::AlreadyArchived(_)
        ));
        assert_eq!(s.store.list_history().await.unwrap().len(), 1);

        let err = s.lifecycle.complete(&Uuid::new_v4().to_string(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn pending_bookings_cannot_be_completed() {
        let s = setup().await;
        let booking = booking_on(s.room.id, ymd(2025, 1, 1), hm(8, 0), hm(10, 0), ApprovalStatus::Pending);
        s.store.insert_booking(&booking).await.unwrap();
        let err = s.lifecycle.complete(&booking.id.to_string(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn recovery_finishes_interrupted_moves() {
        let s = setup().await;
        let booking = booking_on(s.room.id, ymd(2025, 2, 2), hm(8, 0), hm(10, 0), ApprovalStatus::Approved);
        s.store.insert_booking(&booking).await.unwrap();

        // crash after the snapshot was written but before the delete
        let marked = s.store.mark_archiving(booking.id, Utc::now()).await.unwrap().unwrap();
        s.store
            .insert_history(&[HistoryRecord::from_booking(&marked, Utc::now())])
            .await
            .unwrap();

        s.lifecycle.recover(Utc::now()).await.unwrap();
        assert!(s.store.find_booking(booking.id).await.unwrap().is_none());
        assert!(s.store.list_archiving().await.unwrap().is_empty());
        assert_eq!(s.store.list_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_flags_finished_bookings() {
        let s = setup().await;
        let day = ymd(2025, 3, 3);
        let mut paid = booking_on(s.room.id, day, hm(8, 0), hm(10, 0), ApprovalStatus::Approved);
        paid.amount_paid = 2_000_000;
        let unpaid = booking_on(s.room.id, day, hm(8, 0), hm(10, 0), ApprovalStatus::Approved);
        s.store.insert_booking(&paid).await.unwrap();
        s.store.insert_booking(&unpaid).await.unwrap();

        let views = s.lifecycle.list(local_to_utc(day.and_time(hm(11, 0)), wib()).unwrap()).await.unwrap();
        let flag = |id: Uuid| views.iter().find(|v| v.booking.id == id).unwrap().is_finished;
        assert!(flag(paid.id));
        assert!(!flag(unpaid.id));
        assert_eq!(views[0].ruangan.as_ref().unwrap().nama, "Aula");
    }
}
