#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use lawncare_tool::{
    BookingStatus, Ledger, LedgerStore, NewBooking, RecurrenceFrequency, Service,
    SqliteLedgerStore,
};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn sqlite_store_round_trip_ledger() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteLedgerStore::new(file.path()).unwrap();

    let mut ledger = Ledger::new();
    ledger.seed_demo_data().unwrap();
    ledger
        .add_service(Service::new("aer", "Aeration", "Core aeration", 120.0, 90))
        .unwrap();
    ledger
        .add_booking(
            NewBooking::new(2, "AER", d(2025, 4, 7))
                .repeating(RecurrenceFrequency::Monthly, 4)
                .with_notes("Has large dog, call ahead"),
        )
        .unwrap();
    ledger.add_booking(NewBooking::new(1, "MOW", d(2025, 4, 8))).unwrap();
    ledger.set_booking_status(2, BookingStatus::Completed).unwrap();
    ledger.delete_booking(2).unwrap();

    store.save_ledger(&ledger).expect("save ledger");

    let loaded = store
        .load_ledger()
        .expect("load ledger")
        .expect("ledger exists");
    assert_eq!(loaded.snapshot(), ledger.snapshot());

    let codes: Vec<&str> = loaded.services().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["MOW", "EDGE", "TRIM", "AER"]);
    let booking = loaded.booking(1).unwrap();
    assert_eq!(
        booking.occurrence_dates(),
        vec![d(2025, 4, 7), d(2025, 5, 7), d(2025, 6, 6), d(2025, 7, 6)]
    );
}

#[test]
fn sqlite_store_is_empty_until_saved() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteLedgerStore::new(file.path()).unwrap();
    assert!(store.load_ledger().unwrap().is_none());
}

#[test]
fn sqlite_save_replaces_previous_contents() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteLedgerStore::new(file.path()).unwrap();

    let mut ledger = Ledger::new();
    ledger.seed_demo_data().unwrap();
    ledger.add_booking(NewBooking::new(1, "MOW", d(2025, 4, 7))).unwrap();
    store.save_ledger(&ledger).unwrap();

    ledger.delete_client(1).unwrap();
    store.save_ledger(&ledger).unwrap();

    let mut loaded = store.load_ledger().unwrap().unwrap();
    assert_eq!(loaded.client_count(), 1);
    assert_eq!(loaded.booking_count(), 0);

    // counters survive even though the records that used them are gone
    let id = loaded
        .add_booking(NewBooking::new(2, "EDGE", d(2025, 4, 9)))
        .unwrap()
        .id;
    assert_eq!(id, 2);
}
