use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::limits::*;
use crate::model::*;

// ── Slot conflict detection ──────────────────────────────────────

/// First slot in `[start_hour, start_hour + duration)` where `room` is already booked.
pub fn first_booked_slot(
    ledger: &Ledger,
    date: NaiveDate,
    start_hour: u8,
    duration: u8,
    room: Room,
) -> Option<SlotKey> {
    SlotKey::span(date, start_hour, duration).find(|slot| ledger.is_booked(slot, room))
}

/// True only if every hour of the span is free for `room`.
/// Every booking path goes through this check.
pub fn check_availability(
    ledger: &Ledger,
    date: NaiveDate,
    start_hour: u8,
    duration: u8,
    room: Room,
) -> bool {
    first_booked_slot(ledger, date, start_hour, duration, room).is_none()
}

/// Start hours at which a booking of `duration` fits `room` on `date`
/// without crossing closing time.
pub fn free_start_hours(ledger: &Ledger, date: NaiveDate, room: Room, duration: u8) -> Vec<u8> {
    if duration == 0 || duration > CLOSE_HOUR - OPEN_HOUR {
        return Vec::new();
    }
    (OPEN_HOUR..=CLOSE_HOUR - duration)
        .filter(|&start| check_availability(ledger, date, start, duration, room))
        .collect()
}

// ── Occupancy views ──────────────────────────────────────────────

/// Occupancy of every room at one slot. Rooms without a record are free.
pub fn room_status(ledger: &Ledger, date: NaiveDate, hour: u8) -> BTreeMap<Room, OccupancyView> {
    let slot = SlotKey::new(date, hour);
    Room::all()
        .map(|room| {
            let view = ledger
                .get(&slot, room)
                .map(OccupancyView::from)
                .unwrap_or_else(OccupancyView::free);
            (room, view)
        })
        .collect()
}

/// Every booked (hour, room) entry on `date`, ordered by hour then room.
pub fn bookings_on(ledger: &Ledger, date: NaiveDate) -> Vec<BookingInfo> {
    ledger
        .slots_on(date)
        .flat_map(|(slot, rooms)| {
            rooms
                .iter()
                .filter(|(_, record)| record.is_booked())
                .map(move |(room, record)| BookingInfo {
                    slot: *slot,
                    room: *room,
                    holder: record.booked_by.clone(),
                    duration: record.duration,
                    end_hour: record.end_time,
                    subject: record.subject().map(str::to_string),
                    category: record.category(),
                })
        })
        .collect()
}
