//! Calendar aggregation: bookings bucketed per date and room, with the
//! colour each cell and each day tile gets on the calendar page.
//!
//! Every active room offers one slot per day. Approved bookings occupy it,
//! pending ones are counted separately, rejected ones are listed but not
//! counted.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::{local_date, ApprovalStatus, Booking, Room};

/// Slots per room per day when nothing else is known.
pub const DEFAULT_ROOM_CAPACITY: u32 = 1;

/// What the aggregator needs to know about a booking.
pub trait CalendarSource {
    /// `None` when the stored date cannot be read; such rows are skipped.
    fn calendar_date(&self) -> Option<NaiveDate>;
    fn room_ref(&self) -> Uuid;
    fn requester(&self) -> &str;
    fn approval(&self) -> ApprovalStatus;
}

impl CalendarSource for Booking {
    fn calendar_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn room_ref(&self) -> Uuid {
        self.room_id
    }

    fn requester(&self) -> &str {
        &self.requester_name
    }

    fn approval(&self) -> ApprovalStatus {
        self.status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Full,
    Pending,
    Partial,
    Available,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarBooker {
    pub nama: String,
    pub status: ApprovalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomDay {
    #[serde(rename = "jumlah")]
    pub capacity: u32,
    #[serde(rename = "terisi")]
    pub occupied: u32,
    pub pending: u32,
    #[serde(rename = "pemesan")]
    pub bookers: Vec<CalendarBooker>,
}

impl RoomDay {
    fn new(capacity: u32) -> Self {
        Self {
            capacity,
            occupied: 0,
            pending: 0,
            bookers: Vec::new(),
        }
    }

    pub fn status(&self) -> DayStatus {
        if self.occupied >= self.capacity {
            DayStatus::Full
        } else if self.pending > 0 {
            DayStatus::Pending
        } else if self.occupied > 0 {
            DayStatus::Partial
        } else {
            DayStatus::Available
        }
    }

    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied)
    }
}

/// date -> room name -> cell
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Calendar {
    pub days: BTreeMap<NaiveDate, BTreeMap<String, RoomDay>>,
}

impl Calendar {
    pub fn cell(&self, date: NaiveDate, room: &str) -> Option<&RoomDay> {
        self.days.get(&date).and_then(|rooms| rooms.get(room))
    }

    /// Colour of a day tile, looking only at `room` when given. A day with
    /// any full room is full, then any pending request wins, then any
    /// approved booking.
    pub fn day_status(&self, date: NaiveDate, room: Option<&str>) -> DayStatus {
        let Some(rooms) = self.days.get(&date) else {
            return DayStatus::Available;
        };

        let mut full = false;
        let mut pending = false;
        let mut booked = false;
        for (name, cell) in rooms {
            if room.is_some_and(|wanted| wanted != name) {
                continue;
            }
            full |= cell.occupied >= cell.capacity;
            pending |= cell.pending > 0;
            booked |= cell.occupied > 0;
        }

        if full {
            DayStatus::Full
        } else if pending {
            DayStatus::Pending
        } else if booked {
            DayStatus::Partial
        } else {
            DayStatus::Available
        }
    }
}

/// Buckets `bookings` by date and room name. Bookings for rooms not in
/// `rooms` and bookings without a readable date are left out.
pub fn aggregate<B: CalendarSource>(bookings: &[B], rooms: &[Room]) -> Calendar {
    let names: HashMap<Uuid, &str> = rooms.iter().map(|r| (r.id, r.name.as_str())).collect();
    let mut calendar = Calendar::default();

    for booking in bookings {
        let Some(date) = booking.calendar_date() else {
            tracing::debug!("calendar: skipping booking by {} with unreadable date", booking.requester());
            continue;
        };
        let Some(room) = names.get(&booking.room_ref()) else {
            tracing::debug!("calendar: skipping booking for unknown room {}", booking.room_ref());
            continue;
        };

        let cell = calendar
            .days
            .entry(date)
            .or_default()
            .entry(room.to_string())
            .or_insert_with(|| RoomDay::new(DEFAULT_ROOM_CAPACITY));

        match booking.approval() {
            ApprovalStatus::Approved => cell.occupied += 1,
            ApprovalStatus::Pending => cell.pending += 1,
            ApprovalStatus::Rejected => {}
        }

        let name = booking.requester().trim();
        cell.bookers.push(CalendarBooker {
            nama: if name.is_empty() { "Tanpa Nama".to_string() } else { name.to_string() },
            status: booking.approval(),
        });
    }

    calendar
}

/// A room and what is happening in it today.
#[derive(Debug, Clone, Serialize)]
pub struct RoomToday {
    pub ruangan: Room,
    #[serde(rename = "bookingHariIni")]
    pub bookings: Vec<Booking>,
    /// Some approved booking is running right now.
    #[serde(rename = "sedangDipakai")]
    pub in_use: bool,
}

/// Today's approved bookings per room, in start order.
pub fn rooms_today(rooms: &[Room], bookings: &[Booking], now: DateTime<Utc>, offset: FixedOffset) -> Vec<RoomToday> {
    let today = local_date(now, offset);
    rooms
        .iter()
        .map(|room| {
            let mut todays: Vec<Booking> = bookings
                .iter()
                .filter(|b| b.room_id == room.id && b.date == today && b.status == ApprovalStatus::Approved)
                .cloned()
                .collect();
            todays.sort_by_key(|b| b.start_time);
            let in_use = todays
                .iter()
                .any(|b| match (b.starts_at(offset), b.ends_at(offset)) {
                    (Some(start), Some(end)) => start <= now && now <= end,
                    _ => false,
                });
            RoomToday {
                ruangan: room.clone(),
                bookings: todays,
                in_use,
            }
        })
        .collect()
}
