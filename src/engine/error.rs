use chrono::NaiveDate;

use crate::limits::*;
use crate::model::{Room, SlotKey};
use crate::store::StoreError;

#[derive(Debug)]
pub enum BookingError {
    InvalidDuration(i64),
    OutsideOperatingHours {
        start_hour: i64,
        duration: i64,
    },
    UnknownRoom(String),
    OutsideBookingWindow {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },
    InvalidHolder(&'static str),
    SubjectNotOffered(String),
    /// The first hour of the requested span that is already booked.
    SlotConflict {
        slot: SlotKey,
        room: Room,
    },
    NotBooked {
        slot: SlotKey,
        room: Room,
    },
    NotOwner {
        slot: SlotKey,
        room: Room,
    },
    PersistenceError(StoreError),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::InvalidDuration(d) => write!(
                f,
                "invalid duration {d}h: must be between {MIN_DURATION_HOURS} and {MAX_DURATION_HOURS} hours"
            ),
            BookingError::OutsideOperatingHours {
                start_hour,
                duration,
            } => write!(
                f,
                "booking {start_hour:02}:00-{:02}:00 is outside operating hours ({OPEN_HOUR:02}:00-{CLOSE_HOUR:02}:00)",
                start_hour + duration
            ),
            BookingError::UnknownRoom(code) => write!(f, "unknown room: {code}"),
            BookingError::OutsideBookingWindow { date, first, last } => {
                write!(f, "date {date} is outside the booking window {first}..{last}")
            }
            BookingError::InvalidHolder(reason) => write!(f, "invalid booking label: {reason}"),
            BookingError::SubjectNotOffered(subject) => {
                write!(f, "subject not taught by requester: {subject}")
            }
            BookingError::SlotConflict { slot, room } => {
                write!(f, "room {room} is already booked at {slot}")
            }
            BookingError::NotBooked { slot, room } => {
                write!(f, "room {room} has no booking at {slot}")
            }
            BookingError::NotOwner { slot, room } => {
                write!(f, "booking of room {room} at {slot} is held by someone else")
            }
            BookingError::PersistenceError(e) => write!(f, "booking not saved: {e}"),
        }
    }
}

impl std::error::Error for BookingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookingError::PersistenceError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        BookingError::PersistenceError(e)
    }
}
