use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use roomledger::engine::{BookingError, Engine};
use roomledger::model::BookingCategory;
use roomledger::notify::NotifyHub;
use roomledger::store::JsonFileStore;

const USAGE: &str = "usage:
  roomledger status <YYYY-MM-DD> <HH>
  roomledger list   <YYYY-MM-DD>
  roomledger free   <YYYY-MM-DD> <ROOM> <HOURS>
  roomledger book   <YYYY-MM-DD> <HH> <HOURS> <ROOM> <HOLDER> [SUBJECT]
  roomledger cancel <YYYY-MM-DD> <HH> <ROOM> <HOLDER>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let metrics_port: Option<u16> = std::env::var("ROOMLEDGER_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    roomledger::observability::init(metrics_port)?;

    let data_dir = std::env::var("ROOMLEDGER_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let ledger_file =
        std::env::var("ROOMLEDGER_LEDGER_FILE").unwrap_or_else(|_| "ruangans.json".into());
    let enforce_window = std::env::var("ROOMLEDGER_ENFORCE_WINDOW")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(true);

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;
    let path = PathBuf::from(&data_dir).join(&ledger_file);
    info!("ledger: {}", path.display());

    let engine = Engine::new(Arc::new(JsonFileStore::new(path)), Arc::new(NotifyHub::new()))
        .with_booking_window(enforce_window);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match run(&engine, &args).await {
        Ok(()) => Ok(()),
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}\n{USAGE}");
            std::process::exit(2);
        }
        Err(CliError::Rejected(e)) => {
            eprintln!("rejected: {e}");
            std::process::exit(1);
        }
    }
}

enum CliError {
    Usage(String),
    Rejected(BookingError),
}

impl From<BookingError> for CliError {
    fn from(e: BookingError) -> Self {
        CliError::Rejected(e)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| CliError::Usage(format!("bad date {s}: {e}")))
}

/// Accepts `9`, `09` or `09:00`.
fn parse_hour(s: &str) -> Result<i64, CliError> {
    s.strip_suffix(":00")
        .unwrap_or(s)
        .parse()
        .map_err(|_| CliError::Usage(format!("bad hour: {s}")))
}

fn parse_hours(s: &str) -> Result<i64, CliError> {
    s.parse()
        .map_err(|_| CliError::Usage(format!("bad duration: {s}")))
}

/// Narrow a duration to the engine's type. Numbers no booking could have
/// get the engine's rejection.
fn narrow_duration(duration: i64) -> Result<u8, BookingError> {
    u8::try_from(duration).map_err(|_| BookingError::InvalidDuration(duration))
}

/// Narrow a start hour and duration, duration first like the engine does.
fn narrow_request(start_hour: i64, duration: i64) -> Result<(u8, u8), BookingError> {
    let narrowed = narrow_duration(duration)?;
    if !BookingCategory::permits(narrowed) {
        return Err(BookingError::InvalidDuration(duration));
    }
    let start = u8::try_from(start_hour)
        .map_err(|_| BookingError::OutsideOperatingHours { start_hour, duration })?;
    Ok((start, narrowed))
}

async fn run(engine: &Engine, args: &[&str]) -> Result<(), CliError> {
    match args {
        ["status", date, hour] => {
            let (date, hour) = (parse_date(date)?, parse_hour(hour)?);
            let hour = u8::try_from(hour).map_err(|_| CliError::Usage(format!("bad hour: {hour}")))?;
            for (room, view) in engine.get_room_status(date, hour).await {
                println!(
                    "{room}\t{}\t{}\t{}",
                    view.status_label(),
                    view.booked_by,
                    view.subject
                );
            }
        }
        ["list", date] => {
            for b in engine.list_bookings(parse_date(date)?).await {
                println!(
                    "{}\t{}\t{}\t{}h\t{}",
                    b.slot,
                    b.room,
                    b.holder,
                    b.duration,
                    b.subject.as_deref().unwrap_or("-")
                );
            }
        }
        ["free", date, room, hours] => {
            let duration = narrow_duration(parse_hours(hours)?)?;
            let starts = engine
                .free_start_hours(parse_date(date)?, room, duration)
                .await?;
            for start in starts {
                println!("{start:02}:00");
            }
        }
        ["book", date, hour, hours, room, holder, rest @ ..] if rest.len() <= 1 => {
            let (start_hour, duration) = narrow_request(parse_hour(hour)?, parse_hours(hours)?)?;
            let record = engine
                .create_booking(
                    parse_date(date)?,
                    start_hour,
                    duration,
                    room,
                    holder,
                    rest.first().copied(),
                )
                .await?;
            println!(
                "booked {room} {:02}:00-{:02}:00 ({})",
                record.start_hour(),
                record.end_time,
                record.category().status_label()
            );
        }
        ["cancel", date, hour, room, holder] => {
            let (hour, _) = narrow_request(parse_hour(hour)?, 1)?;
            engine
                .cancel_booking(parse_date(date)?, hour, room, holder)
                .await?;
            println!("cancelled {room} {hour:02}:00");
        }
        _ => return Err(CliError::Usage("unrecognized command".into())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomledger::clock::FixedClock;
    use roomledger::store::InMemoryStore;

    fn make_engine() -> Engine {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        Engine::new(Arc::new(InMemoryStore::new()), Arc::new(NotifyHub::new()))
            .with_clock(Arc::new(FixedClock(today)))
    }

    #[test]
    fn narrow_request_keeps_engine_order() {
        assert!(matches!(narrow_request(9, 2), Ok((9, 2))));
        assert!(matches!(narrow_request(9, 300), Err(BookingError::InvalidDuration(300))));
        assert!(matches!(narrow_request(9, -1), Err(BookingError::InvalidDuration(-1))));
        assert!(matches!(narrow_request(300, 9), Err(BookingError::InvalidDuration(9))));
        assert!(matches!(
            narrow_request(-1, 2),
            Err(BookingError::OutsideOperatingHours { start_hour: -1, duration: 2 })
        ));
    }

    #[tokio::test]
    async fn out_of_range_numbers_rejected_with_reason() {
        let engine = make_engine();

        let r = run(&engine, &["book", "2024-06-10", "9", "300", "A10.01.01", "Dosen A"]).await;
        assert!(matches!(r, Err(CliError::Rejected(BookingError::InvalidDuration(300)))));

        let r = run(&engine, &["book", "2024-06-10", "-1", "2", "A10.01.01", "Dosen A"]).await;
        assert!(matches!(r, Err(CliError::Rejected(BookingError::OutsideOperatingHours { .. }))));

        let r = run(&engine, &["book", "2024-06-10", "300", "2", "A10.01.01", "Dosen A"]).await;
        assert!(matches!(r, Err(CliError::Rejected(BookingError::OutsideOperatingHours { .. }))));

        let r = run(&engine, &["free", "2024-06-10", "A10.01.01", "-3"]).await;
        assert!(matches!(r, Err(CliError::Rejected(BookingError::InvalidDuration(-3)))));

        let r = run(&engine, &["book", "2024-06-10", "nine", "2", "A10.01.01", "Dosen A"]).await;
        assert!(matches!(r, Err(CliError::Usage(_))));

        assert!(run(&engine, &["book", "2024-06-10", "9", "2", "A10.01.01", "Dosen A"]).await.is_ok());
    }
}
