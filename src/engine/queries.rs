use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::limits::*;
use crate::model::*;

use super::availability::{bookings_on, free_start_hours, room_status};
use super::conflict::{parse_room, validate_duration};
use super::{BookingError, Engine};

impl Engine {
    /// Occupancy of every room at `date`/`hour`. An unreadable ledger shows
    /// every room as free.
    pub async fn get_room_status(&self, date: NaiveDate, hour: u8) -> BTreeMap<Room, OccupancyView> {
        let ledger = self.store.load().await;
        room_status(&ledger, date, hour)
    }

    /// All booked hours on `date`, ordered by hour then room.
    pub async fn list_bookings(&self, date: NaiveDate) -> Vec<BookingInfo> {
        let ledger = self.store.load().await;
        bookings_on(&ledger, date)
    }

    /// Bookings on `date` held by `holder`.
    pub async fn list_bookings_for(&self, date: NaiveDate, holder: &str) -> Vec<BookingInfo> {
        let mut bookings = self.list_bookings(date).await;
        bookings.retain(|b| b.holder == holder);
        bookings
    }

    /// Start hours on `date` where `room` could currently take a booking of `duration`.
    pub async fn free_start_hours(
        &self,
        date: NaiveDate,
        room: &str,
        duration: u8,
    ) -> Result<Vec<u8>, BookingError> {
        validate_duration(duration)?;
        let room = parse_room(room)?;
        let ledger = self.store.load().await;
        Ok(free_start_hours(&ledger, date, room, duration))
    }

    /// Every date in the booking window, today first.
    pub fn bookable_dates(&self) -> Vec<NaiveDate> {
        let (first, _) = self.booking_window();
        (0..=BOOKING_HORIZON_DAYS)
            .filter_map(|offset| first.checked_add_days(Days::new(offset)))
            .collect()
    }
}
