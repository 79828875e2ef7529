use std::net::SocketAddr;

use crate::engine::BookingError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking requests. Labels: outcome.
pub const BOOKINGS_TOTAL: &str = "roomledger_bookings_total";

/// Counter: cancellation requests. Labels: outcome.
pub const CANCELLATIONS_TOTAL: &str = "roomledger_cancellations_total";

/// Histogram: end-to-end mutation latency (lock + load + save) in seconds. Labels: op.
pub const MUTATION_DURATION_SECONDS: &str = "roomledger_mutation_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: ledger document save duration in seconds.
pub const LEDGER_SAVE_DURATION_SECONDS: &str = "roomledger_ledger_save_duration_seconds";

/// Counter: reads that fell back to an empty ledger.
pub const LEDGER_LOAD_DEGRADED_TOTAL: &str = "roomledger_ledger_load_degraded_total";

/// Gauge: slots present in the ledger after the last commit.
pub const LEDGER_SLOTS: &str = "roomledger_ledger_slots";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a booking outcome to a short label for metrics.
pub fn outcome_label(result: Result<(), &BookingError>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(BookingError::InvalidDuration(_)) => "invalid_duration",
        Err(BookingError::OutsideOperatingHours { .. }) => "outside_operating_hours",
        Err(BookingError::UnknownRoom(_)) => "unknown_room",
        Err(BookingError::OutsideBookingWindow { .. }) => "outside_booking_window",
        Err(BookingError::InvalidHolder(_)) => "invalid_holder",
        Err(BookingError::SubjectNotOffered(_)) => "subject_not_offered",
        Err(BookingError::SlotConflict { .. }) => "slot_conflict",
        Err(BookingError::NotBooked { .. }) => "not_booked",
        Err(BookingError::NotOwner { .. }) => "not_owner",
        Err(BookingError::PersistenceError(_)) => "persistence_error",
    }
}
