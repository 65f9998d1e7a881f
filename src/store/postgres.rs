use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{postgres::PgPool, FromRow, PgConnection, Postgres, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use super::{Repository, StoreError, StoreResult};
use crate::database::Database;
use crate::models::{Booking, HistoryRecord, PaymentEntry, PaymentMirror, Room};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool.clone() }
    }
}

fn parse_text<T>(column: &str, raw: &str) -> StoreResult<T>
where
    T: FromStr<Err = String>,
{
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

/* ---------- rows ---------- */

#[derive(FromRow)]
struct RoomRow {
    id: Uuid,
    name: String,
    location: String,
    capacity: i32,
    facilities: Vec<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = StoreError;

    fn try_from(row: RoomRow) -> StoreResult<Self> {
        Ok(Room {
            id: row.id,
            name: row.name,
            location: row.location,
            capacity: row.capacity,
            facilities: row.facilities,
            status: parse_text("rooms.status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    room_id: Uuid,
    requester_name: String,
    phone: String,
    address: String,
    event_name: String,
    booking_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    duration_hours: i32,
    amount_paid: i64,
    total_price: i64,
    min_deposit: i64,
    status: String,
    payment_status: String,
    verification: String,
    rejection_reason: String,
    paid_at: Option<DateTime<Utc>>,
    payment_source: Option<String>,
    archiving_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> StoreResult<Self> {
        let payment_source = match row.payment_source.as_deref() {
            Some(raw) => Some(parse_text("bookings.payment_source", raw)?),
            None => None,
        };
        Ok(Booking {
            id: row.id,
            room_id: row.room_id,
            requester_name: row.requester_name,
            phone: row.phone,
            address: row.address,
            event_name: row.event_name,
            date: row.booking_date,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_hours: row.duration_hours,
            amount_paid: row.amount_paid,
            total_price: row.total_price,
            min_deposit: row.min_deposit,
            status: parse_text("bookings.status", &row.status)?,
            payment_status: parse_text("bookings.payment_status", &row.payment_status)?,
            verification: parse_text("bookings.verification", &row.verification)?,
            rejection_reason: row.rejection_reason,
            paid_at: row.paid_at,
            payment_source,
            archiving_at: row.archiving_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    requester_name: String,
    room_id: Uuid,
    paid_at: DateTime<Utc>,
    amount: i64,
    status: String,
    verification: String,
    source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentEntry {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> StoreResult<Self> {
        Ok(PaymentEntry {
            id: row.id,
            booking_id: row.booking_id,
            requester_name: row.requester_name,
            room_id: row.room_id,
            paid_at: row.paid_at,
            amount: row.amount,
            status: parse_text("payments.status", &row.status)?,
            verification: parse_text("payments.verification", &row.verification)?,
            source: parse_text("payments.source", &row.source)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct HistoryRow {
    id: Uuid,
    booking_id: Option<Uuid>,
    requester_name: String,
    event_name: String,
    booking_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    duration_hours: i32,
    room_id: Option<Uuid>,
    amount_paid: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = StoreError;

    fn try_from(row: HistoryRow) -> StoreResult<Self> {
        Ok(HistoryRecord {
            id: row.id,
            booking_id: row.booking_id,
            requester_name: row.requester_name,
            event_name: row.event_name,
            date: row.booking_date,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_hours: row.duration_hours,
            room_id: row.room_id,
            amount_paid: row.amount_paid,
            status: parse_text("history.status", &row.status)?,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const ROOM_COLUMNS: &str =
    "id, name, location, capacity, facilities, status, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, room_id, requester_name, phone, address, event_name, \
     booking_date, start_time, end_time, duration_hours, amount_paid, total_price, min_deposit, \
     status, payment_status, verification, rejection_reason, paid_at, payment_source, \
     archiving_at, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, booking_id, requester_name, room_id, paid_at, amount, \
     status, verification, source, created_at, updated_at";

const HISTORY_COLUMNS: &str = "id, booking_id, requester_name, event_name, booking_date, \
     start_time, end_time, duration_hours, room_id, amount_paid, status, created_at";

async fn write_mirror(tx: &mut Transaction<'_, Postgres>, mirror: &PaymentMirror) -> StoreResult<()> {
    sqlx::query(
        "UPDATE bookings
         SET amount_paid = $2, payment_status = $3, verification = $4,
             paid_at = $5, payment_source = $6, updated_at = NOW()
         WHERE id = $1",
    )
    .bind(mirror.booking_id)
    .bind(mirror.amount_paid)
    .bind(mirror.payment_status.as_str())
    .bind(mirror.verification.as_str())
    .bind(mirror.paid_at)
    .bind(mirror.source.map(|s| s.as_str()))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_booking_row(conn: &mut PgConnection, b: &Booking) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO bookings ({BOOKING_COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)"
    ))
    .bind(b.id)
    .bind(b.room_id)
    .bind(&b.requester_name)
    .bind(&b.phone)
    .bind(&b.address)
    .bind(&b.event_name)
    .bind(b.date)
    .bind(b.start_time)
    .bind(b.end_time)
    .bind(b.duration_hours)
    .bind(b.amount_paid)
    .bind(b.total_price)
    .bind(b.min_deposit)
    .bind(b.status.as_str())
    .bind(b.payment_status.as_str())
    .bind(b.verification.as_str())
    .bind(&b.rejection_reason)
    .bind(b.paid_at)
    .bind(b.payment_source.map(|s| s.as_str()))
    .bind(b.archiving_at)
    .bind(b.created_at)
    .bind(b.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_payment_row(conn: &mut PgConnection, p: &PaymentEntry) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
    ))
    .bind(p.id)
    .bind(p.booking_id)
    .bind(&p.requester_name)
    .bind(p.room_id)
    .bind(p.paid_at)
    .bind(p.amount)
    .bind(p.status.as_str())
    .bind(p.verification.as_str())
    .bind(p.source.as_str())
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

// Serializes payment writes for one booking until the transaction ends
async fn lock_booking(tx: &mut Transaction<'_, Postgres>, booking_id: Uuid) -> StoreResult<()> {
    sqlx::query("SELECT id FROM bookings WHERE id = $1 FOR UPDATE")
        .bind(booking_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Same order as `PaymentEntry::recency`.
async fn mirror_if_latest(
    tx: &mut Transaction<'_, Postgres>,
    entry: &PaymentEntry,
    mirror: &PaymentMirror,
) -> StoreResult<()> {
    let latest: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM payments WHERE booking_id = $1
         ORDER BY paid_at DESC, created_at DESC, id DESC LIMIT 1",
    )
    .bind(entry.booking_id)
    .fetch_optional(&mut **tx)
    .await?;
    if latest == Some(entry.id) {
        write_mirror(tx, mirror).await?;
    }
    Ok(())
}

#[async_trait]
impl Repository for PgStore {
    /* ---------- rooms ---------- */

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        let rows: Vec<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY created_at, name"))
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn find_room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        let row: Option<RoomRow> = sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Room::try_from).transpose()
    }

    async fn insert_room(&self, room: &Room) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO rooms ({ROOM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.location)
        .bind(room.capacity)
        .bind(&room.facilities)
        .bind(room.status.as_str())
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_room(&self, room: &Room) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE rooms
             SET name = $2, location = $3, capacity = $4, facilities = $5, status = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.location)
        .bind(room.capacity)
        .bind(&room.facilities)
        .bind(room.status.as_str())
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        let row: Option<RoomRow> =
            sqlx::query_as(&format!("DELETE FROM rooms WHERE id = $1 RETURNING {ROOM_COLUMNS}"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Room::try_from).transpose()
    }

    /* ---------- bookings ---------- */

    async fn list_bookings(&self) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"))
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn insert_booking(&self, b: &Booking) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_booking_row(&mut conn, b).await
    }

    async fn insert_booking_with_payment(&self, b: &Booking, p: &PaymentEntry) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_booking_row(&mut tx, b).await?;
        insert_payment_row(&mut tx, p).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_booking(&self, b: &Booking) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings
             SET room_id = $2, requester_name = $3, phone = $4, address = $5, event_name = $6,
                 booking_date = $7, start_time = $8, end_time = $9, duration_hours = $10,
                 amount_paid = $11, total_price = $12, min_deposit = $13, status = $14,
                 payment_status = $15, verification = $16, rejection_reason = $17,
                 paid_at = $18, payment_source = $19, updated_at = $20
             WHERE id = $1",
        )
        .bind(b.id)
        .bind(b.room_id)
        .bind(&b.requester_name)
        .bind(&b.phone)
        .bind(&b.address)
        .bind(&b.event_name)
        .bind(b.date)
        .bind(b.start_time)
        .bind(b.end_time)
        .bind(b.duration_hours)
        .bind(b.amount_paid)
        .bind(b.total_price)
        .bind(b.min_deposit)
        .bind(b.status.as_str())
        .bind(b.payment_status.as_str())
        .bind(b.verification.as_str())
        .bind(&b.rejection_reason)
        .bind(b.paid_at)
        .bind(b.payment_source.map(|s| s.as_str()))
        .bind(b.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("DELETE FROM bookings WHERE id = $1 RETURNING {BOOKING_COLUMNS}"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn mark_archiving(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "UPDATE bookings SET archiving_at = COALESCE(archiving_at, $2)
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_archiving(&self) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE archiving_at IS NOT NULL ORDER BY archiving_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    /* ---------- payments ---------- */

    async fn list_payments(&self) -> StoreResult<Vec<PaymentEntry>> {
        let rows: Vec<PaymentRow> =
            sqlx::query_as(&format!("SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY paid_at DESC"))
                .fetch_all(&self.pool)
                .await?;
        convert_all(rows)
    }

    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<PaymentEntry>> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(PaymentEntry::try_from).transpose()
    }

    async fn insert_payment(&self, p: &PaymentEntry, mirror: &PaymentMirror) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_booking(&mut tx, p.booking_id).await?;
        insert_payment_row(&mut tx, p).await?;
        mirror_if_latest(&mut tx, p, mirror).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_payment(&self, p: &PaymentEntry, mirror: &PaymentMirror) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        lock_booking(&mut tx, p.booking_id).await?;
        let result = sqlx::query(
            "UPDATE payments
             SET paid_at = $2, amount = $3, status = $4, verification = $5, source = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(p.id)
        .bind(p.paid_at)
        .bind(p.amount)
        .bind(p.status.as_str())
        .bind(p.verification.as_str())
        .bind(p.source.as_str())
        .bind(p.updated_at)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        mirror_if_latest(&mut tx, p, mirror).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_payment(&self, id: Uuid, mirror: &PaymentMirror) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        write_mirror(&mut tx, mirror).await?;
        tx.commit().await?;
        Ok(true)
    }

    /* ---------- history ---------- */

    async fn list_history(&self) -> StoreResult<Vec<HistoryRecord>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "SELECT {HISTORY_COLUMNS} FROM history ORDER BY booking_date DESC, start_time DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn find_history_by_booking(&self, booking_id: Uuid) -> StoreResult<Option<HistoryRecord>> {
        let row: Option<HistoryRow> =
            sqlx::query_as(&format!("SELECT {HISTORY_COLUMNS} FROM history WHERE booking_id = $1"))
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(HistoryRecord::try_from).transpose()
    }

    async fn insert_history(&self, records: &[HistoryRecord]) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for r in records {
            let result = sqlx::query(&format!(
                "INSERT INTO history ({HISTORY_COLUMNS})
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                 ON CONFLICT (booking_id) DO NOTHING"
            ))
            .bind(r.id)
            .bind(r.booking_id)
            .bind(&r.requester_name)
            .bind(&r.event_name)
            .bind(r.date)
            .bind(r.start_time)
            .bind(r.end_time)
            .bind(r.duration_hours)
            .bind(r.room_id)
            .bind(r.amount_paid)
            .bind(r.status.as_str())
            .bind(r.created_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }
}
