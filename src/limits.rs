/// The fixed room set of the building, in display order.
pub const ROOMS: [&str; 10] = [
    "A10.01.01",
    "A10.01.02",
    "A10.01.03",
    "A10.01.04",
    "A10.01.05",
    "A10.01.06",
    "A10.01.07",
    "A10.01.08",
    "A10.01.09",
    "A10.01.10",
];

/// First bookable hour (07:00).
pub const OPEN_HOUR: u8 = 7;
/// Building closes at 17:00; no booking may end after this.
pub const CLOSE_HOUR: u8 = 17;
/// Last hour a booking may start at.
pub const LAST_START_HOUR: u8 = CLOSE_HOUR - 1;

pub const MIN_DURATION_HOURS: u8 = 1;
pub const MAX_DURATION_HOURS: u8 = 4;
/// Longest duration that still counts as a regular booking.
pub const REGULAR_MAX_DURATION_HOURS: u8 = 2;

/// Bookings may be placed from today up to and including today + this many days.
pub const BOOKING_HORIZON_DAYS: u64 = 7;

pub const MAX_HOLDER_LEN: usize = 128;
pub const MAX_SUBJECT_LEN: usize = 128;

/// Placeholder persisted for absent holder/subject labels.
pub const EMPTY_LABEL: &str = "-";
