use chrono::NaiveDate;

use crate::limits::*;
use crate::model::*;

use super::availability::{check_availability, first_booked_slot};
use super::BookingError;

/// Duration, operating-hour and room checks, in that order. First violation wins.
pub(crate) fn validate_request(
    start_hour: u8,
    duration: u8,
    room: &str,
) -> Result<Room, BookingError> {
    validate_duration(duration)?;
    if start_hour < OPEN_HOUR || start_hour > LAST_START_HOUR || start_hour + duration > CLOSE_HOUR {
        return Err(BookingError::OutsideOperatingHours {
            start_hour: start_hour.into(),
            duration: duration.into(),
        });
    }
    parse_room(room)
}

pub(crate) fn validate_duration(duration: u8) -> Result<(), BookingError> {
    if BookingCategory::permits(duration) {
        Ok(())
    } else {
        Err(BookingError::InvalidDuration(duration.into()))
    }
}

pub(crate) fn parse_room(room: &str) -> Result<Room, BookingError> {
    Room::parse(room).ok_or_else(|| BookingError::UnknownRoom(room.to_string()))
}

pub(crate) fn validate_window(
    date: NaiveDate,
    window: (NaiveDate, NaiveDate),
) -> Result<(), BookingError> {
    let (first, last) = window;
    if date < first || date > last {
        return Err(BookingError::OutsideBookingWindow { date, first, last });
    }
    Ok(())
}

pub(crate) fn validate_labels(holder: &str, subject: Option<&str>) -> Result<(), BookingError> {
    if holder.trim().is_empty() {
        return Err(BookingError::InvalidHolder("holder name is empty"));
    }
    if holder.len() > MAX_HOLDER_LEN {
        return Err(BookingError::InvalidHolder("holder name too long"));
    }
    if subject.is_some_and(|s| s.len() > MAX_SUBJECT_LEN) {
        return Err(BookingError::InvalidHolder("subject too long"));
    }
    Ok(())
}

/// Blank and placeholder subjects are recorded as "no subject".
pub(crate) fn normalize_subject(subject: Option<&str>) -> Option<&str> {
    subject
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != EMPTY_LABEL)
}

pub(crate) fn check_no_conflict(
    ledger: &Ledger,
    date: NaiveDate,
    start_hour: u8,
    duration: u8,
    room: Room,
) -> Result<(), BookingError> {
    if check_availability(ledger, date, start_hour, duration, room) {
        return Ok(());
    }
    let slot = first_booked_slot(ledger, date, start_hour, duration, room)
        .unwrap_or_else(|| SlotKey::new(date, start_hour));
    Err(BookingError::SlotConflict { slot, room })
}
