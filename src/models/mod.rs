pub mod status;
pub mod room;
pub mod booking;
pub mod payment;
pub mod history;

pub use status::{ApprovalStatus, PaymentSource, PaymentStatus, RoomStatus, VerificationStatus};
pub use room::Room;
pub use booking::Booking;
pub use payment::{PaymentEntry, PaymentMirror};
pub use history::HistoryRecord;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer};

/// Booking dates outside these years are refused at the edge.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

/// Interprets a wall-clock timestamp at the venue as an instant. `None` when
/// the shift leaves chrono's range.
pub fn local_to_utc(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    naive
        .checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc() as i64))
        .map(|shifted| DateTime::from_naive_utc_and_offset(shifted, Utc))
}

/// Calendar date at the venue for an instant.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp; the latter is read
/// in the venue's timezone before the time part is dropped. Years outside
/// `MIN_YEAR..=MAX_YEAR` are rejected.
pub fn parse_date(raw: &str, offset: FixedOffset) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| local_date(dt.with_timezone(&Utc), offset))
        })
        .filter(|date| (MIN_YEAR..=MAX_YEAR).contains(&date.year()))
}

/// Time of day as `HH:MM`, tolerating a trailing `:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

pub fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Serializes `NaiveTime` the way the booking forms send it.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).ok_or_else(|| D::Error::custom(format!("invalid time of day: {raw}")))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Numeric form fields arrive either as JSON numbers or as the text typed
/// into an input; blank text counts as absent.
pub fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    use serde::de::Error;

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Int(n)) => Ok(Some(n)),
        Some(NumberOrText::Float(f)) if f.is_finite() => Ok(Some(f.trunc() as i64)),
        Some(NumberOrText::Float(f)) => Err(D::Error::custom(format!("not a number: {f}"))),
        Some(NumberOrText::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("not a number: {text}")))
        }
    }
}


#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use uuid::Uuid;

    pub fn room(name: &str) -> Room {
        let now = Utc::now();
        Room {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: "Lantai 1".to_string(),
            capacity: 200,
            facilities: vec!["AC".to_string()],
            status: RoomStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn booking_on(
        room_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        status: ApprovalStatus,
    ) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            room_id,
            requester_name: "Sari".to_string(),
            phone: "081234567890".to_string(),
            address: "Jl. Melati 5".to_string(),
            event_name: "Arisan".to_string(),
            date,
            start_time: start,
            end_time: end,
            duration_hours: 2,
            amount_paid: 0,
            total_price: 2_000_000,
            min_deposit: 600_000,
            status,
            payment_status: PaymentStatus::Unpaid,
            verification: VerificationStatus::Unverified,
            rejection_reason: String::new(),
            paid_at: None,
            payment_source: None,
            archiving_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }
}
