use chrono::NaiveDate;
use lawncare_tool::report::{
    bookings_frame, clients_frame, occurrences_frame, render_text_table, services_frame,
};
use lawncare_tool::{Ledger, NewBooking, RecurrenceFrequency};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ledger_with_booking() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.seed_demo_data().unwrap();
    ledger
        .add_booking(
            NewBooking::new(1, "MOW", d(2024, 1, 1)).repeating(RecurrenceFrequency::Weekly, 3),
        )
        .unwrap();
    ledger
}

#[test]
fn clients_frame_has_one_row_per_client() {
    let ledger = ledger_with_booking();
    let df = clients_frame(&ledger).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 6);
    let table = render_text_table(&df);
    assert!(table.contains("| Jane Doe "));
    assert!(table.contains("Has large dog in backyard"));
}

#[test]
fn services_frame_formats_prices_with_currency() {
    let ledger = ledger_with_booking();
    let table = render_text_table(&services_frame(&ledger).unwrap());
    assert!(table.contains("$60.00"), "{table}");
    assert!(table.contains("Edge trimming around paths and beds"));
}

#[test]
fn bookings_frame_lists_occurrence_dates() {
    let ledger = ledger_with_booking();
    let df = bookings_frame(&ledger, ledger.bookings()).unwrap();
    assert_eq!(df.height(), 1);
    let table = render_text_table(&df);
    assert!(table.contains("2024-01-01, 2024-01-08, 2024-01-15"), "{table}");
    assert!(table.contains("| Mowing "));
    assert!(table.contains("| weekly "));
}

#[test]
fn occurrences_frame_renders_dates_in_iso_form() {
    let ledger = ledger_with_booking();
    let df = occurrences_frame(&ledger, d(2024, 1, 5), d(2024, 1, 31)).unwrap();
    assert_eq!(df.height(), 2);
    let table = render_text_table(&df);
    let rows: Vec<&str> = table.lines().filter(|l| l.starts_with("| 2024")).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("| 2024-01-08 |"));
    assert!(rows[1].starts_with("| 2024-01-15 |"));
}

#[test]
fn text_table_pads_columns_to_widest_cell() {
    let ledger = Ledger::new();
    let table = render_text_table(&clients_frame(&ledger).unwrap());
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], lines[2]);
    assert_eq!(lines[0], lines[3]);
    assert_eq!(lines[1], "| id | name | email | phone | address | notes |");
}

#[test]
fn bookings_frame_cuts_long_date_lists_short() {
    let mut ledger = Ledger::new();
    ledger.seed_demo_data().unwrap();
    ledger
        .add_booking(
            NewBooking::new(2, "EDGE", d(2024, 1, 1)).repeating(RecurrenceFrequency::Weekly, i64::MAX),
        )
        .unwrap();
    let table = render_text_table(&bookings_frame(&ledger, ledger.bookings()).unwrap());
    assert!(table.contains("2024-01-01, 2024-01-08"), "{table}");
    assert!(table.contains("2024-12-23, ..."), "{table}");
    assert!(!table.contains("2024-12-30"), "{table}");
}
