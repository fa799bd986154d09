use crate::recurrence::{RecurrenceFrequency, RecurrenceRequest};
use crate::service::normalize_code;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    Skipped,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Some(BookingStatus::Scheduled),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" | "canceled" => Some(BookingStatus::Cancelled),
            "skipped" => Some(BookingStatus::Skipped),
            _ => None,
        }
    }

    /// Only scheduled bookings still produce upcoming visits.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Scheduled)
    }

    pub fn variants() -> [(&'static str, &'static str); 4] {
        [
            ("scheduled", "Booked and not yet done"),
            ("completed", "Work carried out"),
            ("cancelled", "Called off by the client or business"),
            ("skipped", "Missed this round (weather, access)"),
        ]
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i32,
    pub client_id: i32,
    pub service_code: String,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub repeat: RecurrenceFrequency,
    #[serde(default = "default_occurrences")]
    pub occurrences: i64,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: String,
}

fn default_occurrences() -> i64 {
    1
}

impl Booking {
    pub fn new(id: i32, client_id: i32, service_code: &str, scheduled_date: NaiveDate) -> Self {
        Self {
            id,
            client_id,
            service_code: normalize_code(service_code),
            scheduled_date,
            repeat: RecurrenceFrequency::None,
            occurrences: 1,
            status: BookingStatus::Scheduled,
            notes: String::new(),
        }
    }

    pub fn recurrence_request(&self) -> RecurrenceRequest {
        RecurrenceRequest::new(self.scheduled_date, self.repeat, self.occurrences)
    }

    pub fn occurrence_dates(&self) -> Vec<NaiveDate> {
        self.recurrence_request().expand()
    }

    pub fn last_occurrence(&self) -> NaiveDate {
        self.recurrence_request().last_occurrence()
    }

    /// True when any visit falls inside `start..=end`.
    pub fn occurs_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.recurrence_request()
            .occurrences()
            .take_while(|date| *date <= end)
            .any(|date| date >= start)
    }
}

/// Fields for a booking that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub client_id: i32,
    pub service_code: String,
    pub scheduled_date: NaiveDate,
    pub repeat: RecurrenceFrequency,
    pub occurrences: i64,
    pub notes: String,
}

impl NewBooking {
    pub fn new(client_id: i32, service_code: impl Into<String>, scheduled_date: NaiveDate) -> Self {
        Self {
            client_id,
            service_code: service_code.into(),
            scheduled_date,
            repeat: RecurrenceFrequency::None,
            occurrences: 1,
            notes: String::new(),
        }
    }

    pub fn repeating(mut self, repeat: RecurrenceFrequency, occurrences: i64) -> Self {
        self.repeat = repeat;
        self.occurrences = occurrences;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub(crate) fn into_booking(self, id: i32) -> Booking {
        Booking {
            id,
            client_id: self.client_id,
            service_code: normalize_code(&self.service_code),
            scheduled_date: self.scheduled_date,
            repeat: self.repeat,
            occurrences: self.occurrences.max(1),
            status: BookingStatus::Scheduled,
            notes: self.notes.trim().to_string(),
        }
    }
}
