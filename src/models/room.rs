use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{blank, lenient_int, RoomStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "lokasi")]
    pub location: String,
    #[serde(rename = "kapasitas")]
    pub capacity: i32,
    #[serde(rename = "fasilitas")]
    pub facilities: Vec<String>,
    pub status: RoomStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn is_active(&self) -> bool {
        self.status == RoomStatus::Active
    }
}

/// Short form embedded in booking and payment listings.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub nama: String,
    pub lokasi: String,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            nama: room.name.clone(),
            lokasi: room.location.clone(),
        }
    }
}

/// Facilities come either as a list or as the comma-separated text from the
/// room form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FacilityInput {
    List(Vec<String>),
    Text(String),
}

impl FacilityInput {
    pub fn into_list(self) -> Vec<String> {
        let raw = match self {
            FacilityInput::List(items) => items,
            FacilityInput::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

// POST /api/rooms
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(max = 120))]
    pub nama: Option<String>,
    #[validate(length(max = 200))]
    pub lokasi: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    #[validate(range(min = 0, max = 100000))]
    pub kapasitas: Option<i64>,
    pub fasilitas: Option<FacilityInput>,
    pub status: Option<RoomStatus>,
}

impl CreateRoomRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if blank(&self.nama) {
            missing.push("nama");
        }
        let no_facilities = self
            .fasilitas
            .clone()
            .map_or(true, |f| f.into_list().is_empty());
        if no_facilities {
            missing.push("fasilitas");
        }
        if blank(&self.lokasi) {
            missing.push("lokasi");
        }
        missing
    }
}

// PUT /api/rooms
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    #[serde(rename = "_id")]
    pub id: String,
    #[validate(length(max = 120))]
    pub nama: Option<String>,
    #[validate(length(max = 200))]
    pub lokasi: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    #[validate(range(min = 0, max = 100000))]
    pub kapasitas: Option<i64>,
    pub fasilitas: Option<FacilityInput>,
    pub status: Option<RoomStatus>,
}

// DELETE /api/rooms
#[derive(Debug, Deserialize)]
pub struct RoomIdRequest {
    pub id: String,
}
