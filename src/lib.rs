pub mod booking;
pub mod client;
pub mod config;
pub mod ledger;
pub mod logger;
pub mod persistence;
pub mod recurrence;
pub mod report;
pub mod service;
pub mod validation;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use client::{Client, NewClient};
pub use config::{AppConfig, BusinessProfile, ConfigError, StorageBackend, StorageConfig};
pub use ledger::{Ledger, LedgerError, LedgerSnapshot, Visit};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteLedgerStore;
pub use persistence::{
    JsonLedgerStore, LedgerStore, PersistenceError, PersistenceResult, load_bookings_from_csv,
    load_ledger_from_json, save_bookings_to_csv, save_ledger_to_json, save_occurrences_to_csv,
};
pub use recurrence::{
    MONTHLY_STEP_DAYS, Occurrences, RecurrenceFrequency, RecurrenceRequest, expand,
};
pub use service::Service;
pub use validation::ValidationError;
