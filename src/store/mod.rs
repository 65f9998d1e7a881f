//! Persistence seam. Controllers and services only see `Repository`; the
//! binary picks PostgreSQL when `DATABASE_URL` is set and the in-memory
//! store otherwise.
//!
//! Payment writes take a `PaymentMirror` and apply it to the booking in the
//! same transaction, but only when the written entry is the booking's latest
//! (`PaymentEntry::recency`). A booking's payment fields therefore never
//! drift from its latest payment entry. Deleting an entry applies the
//! mirror unconditionally; the ledger passes a cleared one.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Booking, HistoryRecord, PaymentEntry, PaymentMirror, Room};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_rooms(&self) -> StoreResult<Vec<Room>>;
    async fn find_room(&self, id: Uuid) -> StoreResult<Option<Room>>;
    async fn insert_room(&self, room: &Room) -> StoreResult<()>;
    /// Returns false when the room no longer exists.
    async fn update_room(&self, room: &Room) -> StoreResult<bool>;
    async fn delete_room(&self, id: Uuid) -> StoreResult<Option<Room>>;

    /// Newest first.
    async fn list_bookings(&self) -> StoreResult<Vec<Booking>>;
    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;
    /// Inserts a booking together with its first payment, both or neither.
    /// The booking already carries the mirrored payment fields.
    async fn insert_booking_with_payment(&self, booking: &Booking, entry: &PaymentEntry) -> StoreResult<()>;
    async fn update_booking(&self, booking: &Booking) -> StoreResult<bool>;
    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
    /// Tags a booking as being moved into history and returns it, or `None`
    /// if it is already gone.
    async fn mark_archiving(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<Booking>>;
    /// Bookings left tagged by an interrupted move.
    async fn list_archiving(&self) -> StoreResult<Vec<Booking>>;

    /// Latest payment date first.
    async fn list_payments(&self) -> StoreResult<Vec<PaymentEntry>>;
    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<PaymentEntry>>;
    async fn insert_payment(&self, entry: &PaymentEntry, mirror: &PaymentMirror) -> StoreResult<()>;
    async fn update_payment(&self, entry: &PaymentEntry, mirror: &PaymentMirror) -> StoreResult<bool>;
    async fn delete_payment(&self, id: Uuid, mirror: &PaymentMirror) -> StoreResult<bool>;

    /// Latest booking date first.
    async fn list_history(&self) -> StoreResult<Vec<HistoryRecord>>;
    async fn find_history_by_booking(&self, booking_id: Uuid) -> StoreResult<Option<HistoryRecord>>;
    /// Skips records whose `booking_id` is already archived; returns how many
    /// were written.
    async fn insert_history(&self, records: &[HistoryRecord]) -> StoreResult<u64>;
}
