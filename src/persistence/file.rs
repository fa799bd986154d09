use super::{LedgerStore, PersistenceError, PersistenceResult};
use crate::booking::{Booking, BookingStatus};
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::recurrence::{DATE_PREVIEW_LIMIT, RecurrenceFrequency, format_dates_limited};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub fn save_ledger_to_json<P: AsRef<Path>>(ledger: &Ledger, path: P) -> PersistenceResult<()> {
    let snapshot = ledger.snapshot();
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    log::info!("saved ledger to {}", path.as_ref().display());
    Ok(())
}

pub fn load_ledger_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Ledger> {
    let file = File::open(path.as_ref())?;
    let snapshot: LedgerSnapshot = serde_json::from_reader(file)?;
    let ledger = Ledger::from_snapshot(snapshot)?;
    log::info!("loaded ledger from {}", path.as_ref().display());
    Ok(ledger)
}

/// A JSON snapshot file used as a store. A missing file means nothing has
/// been saved yet.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl LedgerStore for JsonLedgerStore {
    fn save_ledger(&self, ledger: &Ledger) -> PersistenceResult<()> {
        save_ledger_to_json(ledger, &self.path)
    }

    fn load_ledger(&self) -> PersistenceResult<Option<Ledger>> {
        match load_ledger_from_json(&self.path) {
            Ok(ledger) => Ok(Some(ledger)),
            Err(PersistenceError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BookingCsvRecord {
    id: i32,
    client_id: i32,
    service_code: String,
    scheduled_date: String,
    repeat: String,
    occurrences: i64,
    status: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    occurrence_dates: String,
}

impl From<&Booking> for BookingCsvRecord {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            client_id: booking.client_id,
            service_code: booking.service_code.clone(),
            scheduled_date: format_date(booking.scheduled_date),
            repeat: booking.repeat.as_str().to_string(),
            occurrences: booking.occurrences,
            status: booking.status.as_str().to_string(),
            notes: booking.notes.clone(),
            occurrence_dates: format_dates_limited(
                booking.recurrence_request().occurrences(),
                DATE_PREVIEW_LIMIT,
            ),
        }
    }
}

impl BookingCsvRecord {
    // The occurrence_dates column is derived output. Import ignores it and
    // accepts files without it.
    fn into_booking(self) -> PersistenceResult<Booking> {
        let scheduled_date = parse_date(&self.scheduled_date)?;
        let mut booking = Booking::new(self.id, self.client_id, &self.service_code, scheduled_date);
        booking.repeat = RecurrenceFrequency::from_input(&self.repeat);
        booking.occurrences = self.occurrences.max(1);
        booking.status = if self.status.trim().is_empty() {
            BookingStatus::Scheduled
        } else {
            BookingStatus::parse(&self.status).ok_or_else(|| {
                PersistenceError::InvalidData(format!("invalid status '{}'", self.status))
            })?
        };
        booking.notes = self.notes;
        Ok(booking)
    }
}

pub fn save_bookings_to_csv<P: AsRef<Path>>(ledger: &Ledger, path: P) -> PersistenceResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    for booking in ledger.bookings() {
        writer.serialize(BookingCsvRecord::from(booking))?;
    }
    writer.flush()?;
    log::info!(
        "wrote {} booking(s) to {}",
        ledger.booking_count(),
        path.as_ref().display()
    );
    Ok(())
}

/// Replace the ledger's bookings with the ones in a CSV file. Clients and
/// services stay as they are and every booking must refer to them.
pub fn load_bookings_from_csv<P: AsRef<Path>>(ledger: &mut Ledger, path: P) -> PersistenceResult<usize> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut bookings = Vec::new();
    for record in reader.deserialize::<BookingCsvRecord>() {
        let record = record?;
        bookings.push(record.into_booking()?);
    }

    if bookings.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no bookings".into(),
        ));
    }

    let count = bookings.len();
    ledger.replace_bookings(bookings)?;
    log::info!("loaded {count} booking(s) from {}", path.as_ref().display());
    Ok(count)
}

#[derive(Serialize)]
struct VisitCsvRecord<'a> {
    date: String,
    booking_id: i32,
    client_id: i32,
    client_name: String,
    service_code: &'a str,
    address: &'a str,
}

/// Write the agenda for `start..=end`, one row per visit.
pub fn save_occurrences_to_csv<P: AsRef<Path>>(
    ledger: &Ledger,
    start: NaiveDate,
    end: NaiveDate,
    path: P,
) -> PersistenceResult<usize> {
    let visits = ledger.occurrences_between(start, end);
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    for visit in &visits {
        let client = ledger.client(visit.client_id);
        writer.serialize(VisitCsvRecord {
            date: format_date(visit.date),
            booking_id: visit.booking_id,
            client_id: visit.client_id,
            client_name: client.map(|c| c.full_name()).unwrap_or_default(),
            service_code: &visit.service_code,
            address: client.map(|c| c.address.as_str()).unwrap_or(""),
        })?;
    }
    writer.flush()?;
    Ok(visits.len())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}
