use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::limits::*;

/// One of the building's fixed rooms, stored as its index into [`ROOMS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Room(u8);

impl Room {
    pub fn parse(code: &str) -> Option<Self> {
        ROOMS
            .iter()
            .position(|r| *r == code.trim())
            .map(|i| Room(i as u8))
    }

    pub fn code(&self) -> &'static str {
        ROOMS[self.0 as usize]
    }

    /// Every room, in display order.
    pub fn all() -> impl Iterator<Item = Room> {
        (0..ROOMS.len() as u8).map(Room)
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Room {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Room::parse(s).ok_or_else(|| format!("unknown room: {s}"))
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Room {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// One hour of room time on a given day. Text form: `YYYY-MM-DD_HH:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub hour: u8,
}

impl SlotKey {
    pub fn new(date: NaiveDate, hour: u8) -> Self {
        Self { date, hour }
    }

    /// The slots covered by a booking of `duration` hours starting at `start_hour`.
    pub fn span(date: NaiveDate, start_hour: u8, duration: u8) -> impl Iterator<Item = SlotKey> {
        (start_hour..start_hour.saturating_add(duration)).map(move |hour| SlotKey { date, hour })
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:02}:00", self.date.format("%Y-%m-%d"), self.hour)
    }
}

impl FromStr for SlotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date, time) = s
            .split_once('_')
            .ok_or_else(|| format!("malformed slot key: {s}"))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("malformed slot date in {s}: {e}"))?;
        let hour = parse_hour_label(time).ok_or_else(|| format!("malformed slot hour: {s}"))?;
        Ok(SlotKey { date, hour })
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse `HH:00` into an hour of day.
fn parse_hour_label(label: &str) -> Option<u8> {
    let hour: u8 = label.strip_suffix(":00")?.parse().ok()?;
    (hour < 24).then_some(hour)
}

/// `HH:00` text form for hour fields in the ledger document.
mod hour_label {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hour: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{hour:02}:00"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let label = String::deserialize(deserializer)?;
        super::parse_hour_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("malformed hour label: {label}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    Free,
    #[serde(alias = "Booked (Extended)")]
    Booked,
}

/// Display tag derived from a booking's duration. Both categories follow the
/// same rules apart from their duration bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCategory {
    Regular,
    Extended,
}

impl BookingCategory {
    pub fn for_duration(duration: u8) -> Self {
        if duration <= REGULAR_MAX_DURATION_HOURS {
            BookingCategory::Regular
        } else {
            BookingCategory::Extended
        }
    }

    /// Whether some category admits a booking of `duration` hours.
    pub fn permits(duration: u8) -> bool {
        duration >= MIN_DURATION_HOURS && duration <= Self::for_duration(duration).max_duration()
    }

    pub fn max_duration(&self) -> u8 {
        match self {
            BookingCategory::Regular => REGULAR_MAX_DURATION_HOURS,
            BookingCategory::Extended => MAX_DURATION_HOURS,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            BookingCategory::Regular => "Booked",
            BookingCategory::Extended => "Booked (Extended)",
        }
    }
}

/// Occupancy of one room for one hour, as persisted in the ledger document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub status: SlotStatus,
    pub booked_by: String,
    pub duration: u8,
    #[serde(with = "hour_label")]
    pub end_time: u8,
    #[serde(rename = "matkul", default = "empty_label")]
    pub subject: String,
    /// Absent in documents written before categories were recorded.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BookingCategory>,
}

fn empty_label() -> String {
    EMPTY_LABEL.to_string()
}

impl BookingRecord {
    pub fn booked(holder: &str, start_hour: u8, duration: u8, subject: Option<&str>) -> Self {
        Self {
            status: SlotStatus::Booked,
            booked_by: holder.to_string(),
            duration,
            end_time: start_hour + duration,
            subject: subject.unwrap_or(EMPTY_LABEL).to_string(),
            category: Some(BookingCategory::for_duration(duration)),
        }
    }

    pub fn is_booked(&self) -> bool {
        self.status == SlotStatus::Booked
    }

    pub fn category(&self) -> BookingCategory {
        self.category
            .unwrap_or_else(|| BookingCategory::for_duration(self.duration))
    }

    pub fn subject(&self) -> Option<&str> {
        (self.subject != EMPTY_LABEL && !self.subject.is_empty()).then_some(self.subject.as_str())
    }

    /// Start hour of the span this record belongs to.
    pub fn start_hour(&self) -> u8 {
        self.end_time.saturating_sub(self.duration)
    }
}

/// The full occupancy document: slot → room → record.
/// A missing slot or room entry means the room is free at that hour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    slots: BTreeMap<SlotKey, BTreeMap<Room, BookingRecord>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: &SlotKey, room: Room) -> Option<&BookingRecord> {
        self.slots.get(slot).and_then(|rooms| rooms.get(&room))
    }

    /// True if the room holds an active booking at this slot.
    pub fn is_booked(&self, slot: &SlotKey, room: Room) -> bool {
        self.get(slot, room).is_some_and(BookingRecord::is_booked)
    }

    pub fn insert(&mut self, slot: SlotKey, room: Room, record: BookingRecord) {
        self.slots.entry(slot).or_default().insert(room, record);
    }

    /// Remove one room's record, dropping the slot bucket once it is empty.
    pub fn remove(&mut self, slot: &SlotKey, room: Room) -> Option<BookingRecord> {
        let rooms = self.slots.get_mut(slot)?;
        let removed = rooms.remove(&room);
        if rooms.is_empty() {
            self.slots.remove(slot);
        }
        removed
    }

    /// All slots on `date` with their per-room records, ordered by hour.
    pub fn slots_on(
        &self,
        date: NaiveDate,
    ) -> impl Iterator<Item = (&SlotKey, &BTreeMap<Room, BookingRecord>)> {
        self.slots
            .range(SlotKey::new(date, 0)..=SlotKey::new(date, 23))
    }
}

// ── Identity ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
}

/// Authenticated identity handed in by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
    /// Subjects a faculty member teaches. Empty for students.
    #[serde(default, rename = "matkul")]
    pub subjects: Vec<String>,
}

impl Actor {
    pub fn student(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Student,
            subjects: Vec::new(),
        }
    }

    pub fn faculty(name: impl Into<String>, subjects: Vec<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Faculty,
            subjects,
        }
    }

    /// The subject label to record for a booking by this actor.
    /// Students never record one; faculty may only record their own subjects.
    /// Returns `Err(requested)` when a faculty member asks for a subject they don't teach.
    pub fn resolve_subject<'a>(&self, requested: Option<&'a str>) -> Result<Option<&'a str>, &'a str> {
        match (self.role, requested) {
            (Role::Student, _) => Ok(None),
            (Role::Faculty, None) => Ok(None),
            (Role::Faculty, Some(s)) if s == EMPTY_LABEL => Ok(None),
            (Role::Faculty, Some(s)) => {
                if self.subjects.iter().any(|own| own == s) {
                    Ok(Some(s))
                } else {
                    Err(s)
                }
            }
        }
    }
}

// ── Change notifications ─────────────────────────────────────────

/// Committed ledger changes, broadcast per room after a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Booked {
        slot: SlotKey,
        room: Room,
        holder: String,
        duration: u8,
    },
    Cancelled {
        slot: SlotKey,
        room: Room,
        holder: String,
    },
}

impl LedgerEvent {
    pub fn room(&self) -> Room {
        match self {
            LedgerEvent::Booked { room, .. } | LedgerEvent::Cancelled { room, .. } => *room,
        }
    }
}

// ── Query result types ───────────────────────────────────────────

/// What the presentation layer shows for one room at one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyView {
    pub status: SlotStatus,
    pub booked_by: String,
    pub duration: u8,
    pub subject: String,
    pub category: Option<BookingCategory>,
}

impl OccupancyView {
    pub fn free() -> Self {
        Self {
            status: SlotStatus::Free,
            booked_by: EMPTY_LABEL.to_string(),
            duration: 0,
            subject: EMPTY_LABEL.to_string(),
            category: None,
        }
    }

    pub fn is_booked(&self) -> bool {
        self.status == SlotStatus::Booked
    }

    pub fn status_label(&self) -> &'static str {
        match (self.status, self.category) {
            (SlotStatus::Free, _) => "Free",
            (SlotStatus::Booked, Some(category)) => category.status_label(),
            (SlotStatus::Booked, None) => "Booked",
        }
    }
}

impl From<&BookingRecord> for OccupancyView {
    fn from(record: &BookingRecord) -> Self {
        if !record.is_booked() {
            return OccupancyView::free();
        }
        Self {
            status: SlotStatus::Booked,
            booked_by: record.booked_by.clone(),
            duration: record.duration,
            subject: record.subject.clone(),
            category: Some(record.category()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingInfo {
    pub slot: SlotKey,
    pub room: Room,
    pub holder: String,
    pub duration: u8,
    pub end_hour: u8,
    pub subject: Option<String>,
    pub category: BookingCategory,
}
