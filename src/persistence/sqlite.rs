use super::{LedgerStore, PersistenceError, PersistenceResult};
use crate::booking::Booking;
use crate::client::Client;
use crate::config::BusinessProfile;
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::service::Service;
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use std::sync::Mutex;

pub struct SqliteLedgerStore {
    connection: Mutex<Connection>,
}

impl SqliteLedgerStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS business_profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                profile_json TEXT NOT NULL,
                next_client_id INTEGER NOT NULL,
                next_booking_id INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY,
                client_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS services (
                position INTEGER PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                service_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY,
                client_id INTEGER NOT NULL,
                service_code TEXT NOT NULL,
                booking_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_profile(tx: &rusqlite::Transaction, snapshot: &LedgerSnapshot) -> PersistenceResult<()> {
        let json = serde_json::to_string(&snapshot.profile)?;
        tx.execute("DELETE FROM business_profile", [])?;
        tx.execute(
            "INSERT INTO business_profile (id, profile_json, next_client_id, next_booking_id) VALUES (1, ?1, ?2, ?3)",
            params![json, snapshot.next_client_id, snapshot.next_booking_id],
        )?;
        Ok(())
    }

    fn save_records(tx: &rusqlite::Transaction, snapshot: &LedgerSnapshot) -> PersistenceResult<()> {
        tx.execute("DELETE FROM clients", [])?;
        tx.execute("DELETE FROM services", [])?;
        tx.execute("DELETE FROM bookings", [])?;

        let mut stmt = tx.prepare("INSERT INTO clients (id, client_json) VALUES (?1, ?2)")?;
        for client in &snapshot.clients {
            stmt.execute(params![client.id, serde_json::to_string(client)?])?;
        }

        let mut stmt =
            tx.prepare("INSERT INTO services (position, code, service_json) VALUES (?1, ?2, ?3)")?;
        for (position, service) in snapshot.services.iter().enumerate() {
            stmt.execute(params![
                position as i64,
                service.code,
                serde_json::to_string(service)?
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO bookings (id, client_id, service_code, booking_json) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for booking in &snapshot.bookings {
            stmt.execute(params![
                booking.id,
                booking.client_id,
                booking.service_code,
                serde_json::to_string(booking)?
            ])?;
        }
        Ok(())
    }

    fn load_rows<T: DeserializeOwned>(conn: &Connection, sql: &str) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }

    fn lock(&self) -> PersistenceResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection mutex poisoned".into()))
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn save_ledger(&self, ledger: &Ledger) -> PersistenceResult<()> {
        let snapshot = ledger.snapshot();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::save_profile(&tx, &snapshot)?;
        Self::save_records(&tx, &snapshot)?;
        tx.commit()?;
        log::info!(
            "saved {} client(s), {} service(s), {} booking(s) to sqlite",
            snapshot.clients.len(),
            snapshot.services.len(),
            snapshot.bookings.len()
        );
        Ok(())
    }

    fn load_ledger(&self) -> PersistenceResult<Option<Ledger>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT profile_json, next_client_id, next_booking_id FROM business_profile WHERE id = 1",
        )?;
        let header: Option<(String, i32, i32)> = stmt
            .query_row([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()?;

        let Some((profile_json, next_client_id, next_booking_id)) = header else {
            return Ok(None);
        };
        let profile: BusinessProfile = serde_json::from_str(&profile_json)?;

        let clients: Vec<Client> =
            Self::load_rows(&conn, "SELECT client_json FROM clients ORDER BY id ASC")?;
        let services: Vec<Service> =
            Self::load_rows(&conn, "SELECT service_json FROM services ORDER BY position ASC")?;
        let bookings: Vec<Booking> =
            Self::load_rows(&conn, "SELECT booking_json FROM bookings ORDER BY id ASC")?;

        let ledger = Ledger::from_snapshot(LedgerSnapshot {
            profile,
            clients,
            services,
            bookings,
            next_client_id,
            next_booking_id,
        })?;
        Ok(Some(ledger))
    }
}
