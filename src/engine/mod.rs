mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;

pub use availability::{check_availability, first_booked_slot, free_start_hours, room_status};
pub use error::BookingError;

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::limits::BOOKING_HORIZON_DAYS;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::store::LedgerStore;

/// Booking engine over a single ledger document.
///
/// Mutations run load → validate → save under `write_lock`, so two writers
/// never interleave. Reads go straight to the store without the lock.
pub struct Engine {
    pub(super) store: Arc<dyn LedgerStore>,
    pub(super) write_lock: Mutex<()>,
    pub notify: Arc<NotifyHub>,
    pub(super) clock: Arc<dyn Clock>,
    /// Reject dates outside today..=today+horizon.
    pub(super) enforce_window: bool,
}

impl Engine {
    pub fn new(store: Arc<dyn LedgerStore>, notify: Arc<NotifyHub>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            notify,
            clock: Arc::new(SystemClock),
            enforce_window: true,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_booking_window(mut self, enforce: bool) -> Self {
        self.enforce_window = enforce;
        self
    }

    /// First and last bookable date, inclusive.
    pub fn booking_window(&self) -> (NaiveDate, NaiveDate) {
        let today = self.clock.today();
        let last = today
            .checked_add_days(Days::new(BOOKING_HORIZON_DAYS))
            .unwrap_or(NaiveDate::MAX);
        (today, last)
    }

    /// Save + gauge + notify in one call. Caller holds `write_lock`.
    pub(super) async fn commit(
        &self,
        ledger: &Ledger,
        events: &[LedgerEvent],
    ) -> Result<(), BookingError> {
        self.store.save(ledger).await?;
        metrics::gauge!(crate::observability::LEDGER_SLOTS).set(ledger.slot_count() as f64);
        for event in events {
            self.notify.send(event);
        }
        Ok(())
    }
}
