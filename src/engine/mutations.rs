use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::*;
use crate::observability::{
    outcome_label, BOOKINGS_TOTAL, CANCELLATIONS_TOTAL, MUTATION_DURATION_SECONDS,
};

use super::conflict::{
    check_no_conflict, normalize_subject, parse_room, validate_labels, validate_request,
    validate_window,
};
use super::{BookingError, Engine};

impl Engine {
    /// Book `room` for every hour of `[start_hour, start_hour + duration)` on `date`.
    ///
    /// All hours are written into one ledger copy and committed with a single
    /// save: either the whole span is booked or nothing is.
    pub async fn create_booking(
        &self,
        date: NaiveDate,
        start_hour: u8,
        duration: u8,
        room: &str,
        holder: &str,
        subject: Option<&str>,
    ) -> Result<BookingRecord, BookingError> {
        let start = Instant::now();
        let result = self
            .create_booking_locked(date, start_hour, duration, room, holder, subject)
            .await;
        let outcome = outcome_label(result.as_ref().map(|_| ()));
        metrics::counter!(BOOKINGS_TOTAL, "outcome" => outcome).increment(1);
        metrics::histogram!(MUTATION_DURATION_SECONDS, "op" => "create_booking")
            .record(start.elapsed().as_secs_f64());
        if let Err(ref e) = result {
            debug!("booking rejected ({outcome}): {e}");
        }
        result
    }

    async fn create_booking_locked(
        &self,
        date: NaiveDate,
        start_hour: u8,
        duration: u8,
        room: &str,
        holder: &str,
        subject: Option<&str>,
    ) -> Result<BookingRecord, BookingError> {
        let room = validate_request(start_hour, duration, room)?;
        if self.enforce_window {
            validate_window(date, self.booking_window())?;
        }
        let subject = normalize_subject(subject);
        validate_labels(holder, subject)?;

        let _guard = self.write_lock.lock().await;
        let mut ledger = self.store.read().await?;
        check_no_conflict(&ledger, date, start_hour, duration, room)?;

        let record = BookingRecord::booked(holder, start_hour, duration, subject);
        let mut events = Vec::with_capacity(duration as usize);
        for slot in SlotKey::span(date, start_hour, duration) {
            ledger.insert(slot, room, record.clone());
            events.push(LedgerEvent::Booked {
                slot,
                room,
                holder: holder.to_string(),
                duration,
            });
        }
        self.commit(&ledger, &events).await?;

        info!(
            "booked {room} on {date} {start_hour:02}:00-{:02}:00 for {holder}",
            record.end_time
        );
        Ok(record)
    }

    /// Book on behalf of an authenticated actor. The subject label is
    /// checked against the actor's role before the booking itself is validated.
    pub async fn book_as(
        &self,
        actor: &Actor,
        date: NaiveDate,
        start_hour: u8,
        duration: u8,
        room: &str,
        subject: Option<&str>,
    ) -> Result<BookingRecord, BookingError> {
        let subject = actor
            .resolve_subject(normalize_subject(subject))
            .map_err(|s| BookingError::SubjectNotOffered(s.to_string()))?;
        self.create_booking(date, start_hour, duration, room, &actor.name, subject)
            .await
    }

    /// Remove `requester`'s booking of `room` at one hour.
    ///
    /// Only that hour's entry is removed; other hours of a multi-hour
    /// booking stay booked and must be cancelled one by one.
    pub async fn cancel_booking(
        &self,
        date: NaiveDate,
        hour: u8,
        room: &str,
        requester: &str,
    ) -> Result<(), BookingError> {
        let start = Instant::now();
        let result = self.cancel_booking_locked(date, hour, room, requester).await;
        let outcome = outcome_label(result.as_ref().copied());
        metrics::counter!(CANCELLATIONS_TOTAL, "outcome" => outcome).increment(1);
        metrics::histogram!(MUTATION_DURATION_SECONDS, "op" => "cancel_booking")
            .record(start.elapsed().as_secs_f64());
        if let Err(ref e) = result {
            debug!("cancellation rejected ({outcome}): {e}");
        }
        result
    }

    async fn cancel_booking_locked(
        &self,
        date: NaiveDate,
        hour: u8,
        room: &str,
        requester: &str,
    ) -> Result<(), BookingError> {
        let room = parse_room(room)?;
        let slot = SlotKey::new(date, hour);

        let _guard = self.write_lock.lock().await;
        let mut ledger = self.store.read().await?;
        let holder = match ledger.get(&slot, room) {
            Some(record) if record.is_booked() => record.booked_by.clone(),
            _ => return Err(BookingError::NotBooked { slot, room }),
        };
        if holder != requester {
            return Err(BookingError::NotOwner { slot, room });
        }

        ledger.remove(&slot, room);
        let event = LedgerEvent::Cancelled { slot, room, holder };
        self.commit(&ledger, std::slice::from_ref(&event)).await?;

        info!("cancelled {room} at {slot} for {requester}");
        Ok(())
    }
}
