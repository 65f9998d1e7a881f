use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Repository, StoreError, StoreResult};
use crate::models::{Booking, HistoryRecord, PaymentEntry, PaymentMirror, Room};

#[derive(Default)]
struct Tables {
    rooms: HashMap<Uuid, Room>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, PaymentEntry>,
    history: Vec<HistoryRecord>,
}

impl Tables {
    fn apply_mirror(&mut self, mirror: &PaymentMirror) {
        if let Some(booking) = self.bookings.get_mut(&mirror.booking_id) {
            booking.apply_mirror(mirror);
            booking.updated_at = Utc::now();
        }
    }

    fn is_latest(&self, entry: &PaymentEntry) -> bool {
        self.payments
            .values()
            .filter(|p| p.booking_id == entry.booking_id)
            .max_by_key(|p| p.recency())
            .map_or(true, |latest| latest.id == entry.id)
    }

    fn mirror_if_latest(&mut self, entry: &PaymentEntry, mirror: &PaymentMirror) {
        if self.is_latest(entry) {
            self.apply_mirror(mirror);
        }
    }
}

/// Process-local store. Each operation holds the lock once, so mirrored
/// payment writes are as atomic here as in a database transaction.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        let tables = self.tables.read().await;
        let mut rooms: Vec<Room> = tables.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(rooms)
    }

    async fn find_room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        Ok(self.tables.read().await.rooms.get(&id).cloned())
    }

    async fn insert_room(&self, room: &Room) -> StoreResult<()> {
        self.tables.write().await.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn update_room(&self, room: &Room) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.rooms.get_mut(&room.id) {
            Some(existing) => {
                *existing = room.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        Ok(self.tables.write().await.rooms.remove(&id))
    }

    async fn list_bookings(&self) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables.bookings.values().cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        self.tables.write().await.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn insert_booking_with_payment(&self, booking: &Booking, entry: &PaymentEntry) -> StoreResult<()> {
        if entry.booking_id != booking.id {
            return Err(StoreError::Corrupt(format!(
                "payment {} belongs to booking {}, not {}",
                entry.id, entry.booking_id, booking.id
            )));
        }
        let mut tables = self.tables.write().await;
        tables.bookings.insert(booking.id, booking.clone());
        tables.payments.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update_booking(&self, booking: &Booking) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get_mut(&booking.id) {
            Some(existing) => {
                *existing = booking.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.tables.write().await.bookings.remove(&id))
    }

    async fn mark_archiving(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<Booking>> {
        let mut tables = self.tables.write().await;
        Ok(tables.bookings.get_mut(&id).map(|booking| {
            booking.archiving_at.get_or_insert(at);
            booking.clone()
        }))
    }

    async fn list_archiving(&self) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.archiving_at.is_some())
            .cloned()
            .collect())
    }

    async fn list_payments(&self) -> StoreResult<Vec<PaymentEntry>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<PaymentEntry> = tables.payments.values().cloned().collect();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(payments)
    }

    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<PaymentEntry>> {
        Ok(self.tables.read().await.payments.get(&id).cloned())
    }

    async fn insert_payment(&self, entry: &PaymentEntry, mirror: &PaymentMirror) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.payments.insert(entry.id, entry.clone());
        tables.mirror_if_latest(entry, mirror);
        Ok(())
    }

    async fn update_payment(&self, entry: &PaymentEntry, mirror: &PaymentMirror) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.payments.get_mut(&entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => return Ok(false),
        }
        tables.mirror_if_latest(entry, mirror);
        Ok(true)
    }

    async fn delete_payment(&self, id: Uuid, mirror: &PaymentMirror) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.payments.remove(&id).is_none() {
            return Ok(false);
        }
        tables.apply_mirror(mirror);
        Ok(true)
    }

    async fn list_history(&self) -> StoreResult<Vec<HistoryRecord>> {
        let tables = self.tables.read().await;
        let mut history = tables.history.clone();
        history.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(history)
    }

    async fn find_history_by_booking(&self, booking_id: Uuid) -> StoreResult<Option<HistoryRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .history
            .iter()
            .find(|r| r.booking_id == Some(booking_id))
            .cloned())
    }

    async fn insert_history(&self, records: &[HistoryRecord]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0;
        for record in records {
            let duplicate = record.booking_id.is_some()
                && tables.history.iter().any(|r| r.booking_id == record.booking_id);
            if !duplicate {
                tables.history.push(record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
