use crate::ledger::Ledger;
use crate::recurrence::{DATE_PREVIEW_LIMIT, format_dates_limited};
use chrono::{Duration, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;

pub fn clients_frame(ledger: &Ledger) -> PolarsResult<DataFrame> {
    let clients: Vec<_> = ledger.clients().collect();
    let ids: Vec<i32> = clients.iter().map(|c| c.id).collect();
    let names: Vec<String> = clients.iter().map(|c| c.full_name()).collect();
    let emails: Vec<&str> = clients.iter().map(|c| c.email.as_str()).collect();
    let phones: Vec<&str> = clients.iter().map(|c| c.phone.as_str()).collect();
    let addresses: Vec<&str> = clients.iter().map(|c| c.address.as_str()).collect();
    let notes: Vec<Option<&str>> = clients
        .iter()
        .map(|c| (!c.notes.is_empty()).then_some(c.notes.as_str()))
        .collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("email"), emails).into_column(),
        Series::new(PlSmallStr::from_static("phone"), phones).into_column(),
        Series::new(PlSmallStr::from_static("address"), addresses).into_column(),
        Series::new(PlSmallStr::from_static("notes"), notes).into_column(),
    ])
}

pub fn services_frame(ledger: &Ledger) -> PolarsResult<DataFrame> {
    let services: Vec<_> = ledger.services().collect();
    let codes: Vec<&str> = services.iter().map(|s| s.code.as_str()).collect();
    let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
    let prices: Vec<String> = services
        .iter()
        .map(|s| format!("{}{:.2}", ledger.profile().currency_symbol, s.base_price))
        .collect();
    let minutes: Vec<i64> = services.iter().map(|s| s.duration_minutes).collect();
    let descriptions: Vec<&str> = services.iter().map(|s| s.description.as_str()).collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("code"), codes).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("base_price"), prices).into_column(),
        Series::new(PlSmallStr::from_static("duration_minutes"), minutes).into_column(),
        Series::new(PlSmallStr::from_static("description"), descriptions).into_column(),
    ])
}

pub fn bookings_frame<'a, I>(ledger: &Ledger, bookings: I) -> PolarsResult<DataFrame>
where
    I: IntoIterator<Item = &'a crate::booking::Booking>,
{
    let bookings: Vec<_> = bookings.into_iter().collect();
    let ids: Vec<i32> = bookings.iter().map(|b| b.id).collect();
    let clients: Vec<String> = bookings
        .iter()
        .map(|b| {
            ledger
                .client(b.client_id)
                .map(|c| c.full_name())
                .unwrap_or_else(|| "Unknown Client".to_string())
        })
        .collect();
    let services: Vec<String> = bookings
        .iter()
        .map(|b| {
            ledger
                .service(&b.service_code)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| b.service_code.clone())
        })
        .collect();
    let dates: Vec<Option<i32>> = bookings
        .iter()
        .map(|b| Some(date_to_i32(b.scheduled_date)))
        .collect();
    let repeats: Vec<&str> = bookings.iter().map(|b| b.repeat.as_str()).collect();
    let occurrences: Vec<i64> = bookings.iter().map(|b| b.occurrences).collect();
    let statuses: Vec<&str> = bookings.iter().map(|b| b.status.as_str()).collect();
    let dates_list: Vec<String> = bookings
        .iter()
        .map(|b| format_dates_limited(b.recurrence_request().occurrences(), DATE_PREVIEW_LIMIT))
        .collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("client"), clients).into_column(),
        Series::new(PlSmallStr::from_static("service"), services).into_column(),
        Series::new(PlSmallStr::from_static("scheduled_date"), dates)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("repeat"), repeats).into_column(),
        Series::new(PlSmallStr::from_static("occurrences"), occurrences).into_column(),
        Series::new(PlSmallStr::from_static("status"), statuses).into_column(),
        Series::new(PlSmallStr::from_static("dates"), dates_list).into_column(),
    ])
}

/// Agenda for `start..=end`: one row per visit, earliest first.
pub fn occurrences_frame(ledger: &Ledger, start: NaiveDate, end: NaiveDate) -> PolarsResult<DataFrame> {
    let visits = ledger.occurrences_between(start, end);
    let dates: Vec<Option<i32>> = visits.iter().map(|v| Some(date_to_i32(v.date))).collect();
    let booking_ids: Vec<i32> = visits.iter().map(|v| v.booking_id).collect();
    let clients: Vec<String> = visits
        .iter()
        .map(|v| {
            ledger
                .client(v.client_id)
                .map(|c| c.full_name())
                .unwrap_or_default()
        })
        .collect();
    let addresses: Vec<String> = visits
        .iter()
        .map(|v| {
            ledger
                .client(v.client_id)
                .map(|c| c.address.clone())
                .unwrap_or_default()
        })
        .collect();
    let services: Vec<&str> = visits.iter().map(|v| v.service_code.as_str()).collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("date"), dates)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("booking_id"), booking_ids).into_column(),
        Series::new(PlSmallStr::from_static("client"), clients).into_column(),
        Series::new(PlSmallStr::from_static("service"), services).into_column(),
        Series::new(PlSmallStr::from_static("address"), addresses).into_column(),
    ])
}

fn date_to_i32(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

fn date_from_i32(days: i32) -> NaiveDate {
    epoch() + Duration::days(days as i64)
}

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::String(s) => s.to_string(),
        AnyValue::Date(days) => date_from_i32(*days).format("%Y-%m-%d").to_string(),
        other => other.to_string(),
    }
}

/// Render a frame as a `+---+` bordered plain-text table.
pub fn render_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
            .collect::<Vec<_>>();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names, &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out.push('\n');
}
