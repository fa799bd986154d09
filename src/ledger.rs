use crate::booking::{Booking, BookingStatus, NewBooking};
use crate::client::{Client, NewClient};
use crate::config::BusinessProfile;
use crate::recurrence::RecurrenceFrequency;
use crate::service::{Service, normalize_code};
use crate::validation::{
    ValidationError, validate_booking, validate_client, validate_collection, validate_service,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    UnknownClient(i32),
    UnknownService(String),
    UnknownBooking(i32),
    ServiceInUse { code: String, bookings: usize },
    IdsExhausted(&'static str),
    Invalid(ValidationError),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::UnknownClient(id) => write!(f, "no client with id {id}"),
            LedgerError::UnknownService(code) => write!(f, "no service with code {code}"),
            LedgerError::UnknownBooking(id) => write!(f, "no booking with id {id}"),
            LedgerError::ServiceInUse { code, bookings } => write!(
                f,
                "service {code} is still used by {bookings} booking(s)"
            ),
            LedgerError::IdsExhausted(kind) => write!(f, "no {kind} ids left to assign"),
            LedgerError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<ValidationError> for LedgerError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// One concrete visit on the agenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub date: NaiveDate,
    pub booking_id: i32,
    pub client_id: i32,
    pub service_code: String,
}

/// Serializable image of a ledger, shared by every persistence backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub profile: BusinessProfile,
    pub clients: Vec<Client>,
    pub services: Vec<Service>,
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub next_client_id: i32,
    #[serde(default)]
    pub next_booking_id: i32,
}

/// Clients, the service catalog and bookings, held in memory.
///
/// Client and booking ids come from counters that start at 1 and are never
/// reused, so iteration over the id-keyed maps is insertion order. Services
/// keep their catalog order; re-adding a code replaces the entry in place.
#[derive(Debug, Clone)]
pub struct Ledger {
    profile: BusinessProfile,
    clients: BTreeMap<i32, Client>,
    services: Vec<Service>,
    bookings: BTreeMap<i32, Booking>,
    next_client_id: i32,
    next_booking_id: i32,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_profile(BusinessProfile::default())
    }

    pub fn with_profile(profile: BusinessProfile) -> Self {
        Self {
            profile,
            clients: BTreeMap::new(),
            services: Vec::new(),
            bookings: BTreeMap::new(),
            next_client_id: 1,
            next_booking_id: 1,
        }
    }

    pub fn profile(&self) -> &BusinessProfile {
        &self.profile
    }

    // Clients

    pub fn add_client(&mut self, new_client: NewClient) -> Result<&Client, LedgerError> {
        let id = self.next_client_id;
        let next = id.checked_add(1).ok_or(LedgerError::IdsExhausted("client"))?;
        let client = new_client.into_client(id);
        validate_client(&client)?;
        self.next_client_id = next;
        log::info!("added client {} ({})", id, client.full_name());
        Ok(self.clients.entry(id).or_insert(client))
    }

    pub fn client(&self, id: i32) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn update_client(&mut self, client: Client) -> Result<(), LedgerError> {
        validate_client(&client)?;
        let slot = self
            .clients
            .get_mut(&client.id)
            .ok_or(LedgerError::UnknownClient(client.id))?;
        log::debug!("updated client {}", client.id);
        *slot = client;
        Ok(())
    }

    pub fn set_client_notes(&mut self, id: i32, notes: &str) -> Result<(), LedgerError> {
        let client = self
            .clients
            .get_mut(&id)
            .ok_or(LedgerError::UnknownClient(id))?;
        client.notes = notes.trim().to_string();
        Ok(())
    }

    /// Remove a client along with their bookings. Returns how many bookings
    /// went with them.
    pub fn delete_client(&mut self, id: i32) -> Result<usize, LedgerError> {
        if self.clients.remove(&id).is_none() {
            return Err(LedgerError::UnknownClient(id));
        }
        let before = self.bookings.len();
        self.bookings.retain(|_, booking| booking.client_id != id);
        let removed = before - self.bookings.len();
        log::info!("deleted client {id} and {removed} booking(s)");
        Ok(removed)
    }

    pub fn find_clients(&self, query: &str) -> Vec<&Client> {
        self.clients
            .values()
            .filter(|client| client.matches(query))
            .collect()
    }

    // Services

    /// Insert a service, replacing any entry with the same code.
    pub fn add_service(&mut self, service: Service) -> Result<&Service, LedgerError> {
        let service = Service {
            code: normalize_code(&service.code),
            ..service
        };
        validate_service(&service)?;
        let idx = match self.services.iter().position(|s| s.code == service.code) {
            Some(idx) => {
                log::debug!("replaced service {}", service.code);
                self.services[idx] = service;
                idx
            }
            None => {
                log::info!("added service {}", service.code);
                self.services.push(service);
                self.services.len() - 1
            }
        };
        Ok(&self.services[idx])
    }

    pub fn service(&self, code: &str) -> Option<&Service> {
        let code = normalize_code(code);
        self.services.iter().find(|s| s.code == code)
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    pub fn set_service_description(&mut self, code: &str, description: &str) -> Result<(), LedgerError> {
        let key = normalize_code(code);
        let service = self
            .services
            .iter_mut()
            .find(|s| s.code == key)
            .ok_or(LedgerError::UnknownService(key))?;
        service.description = description.trim().to_string();
        Ok(())
    }

    /// Remove a service from the catalog. Refused while bookings use it.
    pub fn delete_service(&mut self, code: &str) -> Result<Service, LedgerError> {
        let key = normalize_code(code);
        let idx = self
            .services
            .iter()
            .position(|s| s.code == key)
            .ok_or_else(|| LedgerError::UnknownService(key.clone()))?;
        let in_use = self
            .bookings
            .values()
            .filter(|b| b.service_code == key)
            .count();
        if in_use > 0 {
            return Err(LedgerError::ServiceInUse {
                code: key,
                bookings: in_use,
            });
        }
        log::info!("deleted service {key}");
        Ok(self.services.remove(idx))
    }

    // Bookings

    pub fn add_booking(&mut self, new_booking: NewBooking) -> Result<&Booking, LedgerError> {
        if !self.clients.contains_key(&new_booking.client_id) {
            return Err(LedgerError::UnknownClient(new_booking.client_id));
        }
        let code = normalize_code(&new_booking.service_code);
        if self.service(&code).is_none() {
            return Err(LedgerError::UnknownService(code));
        }
        let id = self.next_booking_id;
        let next = id.checked_add(1).ok_or(LedgerError::IdsExhausted("booking"))?;
        let booking = new_booking.into_booking(id);
        validate_booking(&booking)?;
        self.next_booking_id = next;
        log::info!(
            "added booking {} for client {} ({} on {}, repeat={}, occurrences={})",
            id,
            booking.client_id,
            booking.service_code,
            booking.scheduled_date,
            booking.repeat,
            booking.occurrences
        );
        Ok(self.bookings.entry(id).or_insert(booking))
    }

    pub fn booking(&self, id: i32) -> Option<&Booking> {
        self.bookings.get(&id)
    }

    pub fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    fn booking_mut(&mut self, id: i32) -> Result<&mut Booking, LedgerError> {
        self.bookings
            .get_mut(&id)
            .ok_or(LedgerError::UnknownBooking(id))
    }

    pub fn set_booking_status(&mut self, id: i32, status: BookingStatus) -> Result<(), LedgerError> {
        let booking = self.booking_mut(id)?;
        log::debug!("booking {id} status {} -> {status}", booking.status);
        booking.status = status;
        Ok(())
    }

    pub fn reschedule_booking(&mut self, id: i32, date: NaiveDate) -> Result<(), LedgerError> {
        let booking = self.booking_mut(id)?;
        log::debug!("booking {id} moved from {} to {date}", booking.scheduled_date);
        booking.scheduled_date = date;
        Ok(())
    }

    pub fn set_booking_repeat(
        &mut self,
        id: i32,
        repeat: RecurrenceFrequency,
        occurrences: i64,
    ) -> Result<(), LedgerError> {
        let booking = self.booking_mut(id)?;
        booking.repeat = repeat;
        booking.occurrences = occurrences.max(1);
        Ok(())
    }

    pub fn set_booking_notes(&mut self, id: i32, notes: &str) -> Result<(), LedgerError> {
        let booking = self.booking_mut(id)?;
        booking.notes = notes.trim().to_string();
        Ok(())
    }

    pub fn delete_booking(&mut self, id: i32) -> Result<Booking, LedgerError> {
        let booking = self
            .bookings
            .remove(&id)
            .ok_or(LedgerError::UnknownBooking(id))?;
        log::info!("deleted booking {id}");
        Ok(booking)
    }

    pub fn bookings_for_client(&self, client_id: i32) -> Vec<&Booking> {
        self.bookings
            .values()
            .filter(|b| b.client_id == client_id)
            .collect()
    }

    pub fn bookings_for_service(&self, code: &str) -> Vec<&Booking> {
        let code = normalize_code(code);
        self.bookings
            .values()
            .filter(|b| b.service_code == code)
            .collect()
    }

    pub fn bookings_with_status(&self, status: BookingStatus) -> Vec<&Booking> {
        self.bookings
            .values()
            .filter(|b| b.status == status)
            .collect()
    }

    /// Bookings with at least one visit in `start..=end`, any status.
    pub fn bookings_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Booking> {
        self.bookings
            .values()
            .filter(|b| b.occurs_between(start, end))
            .collect()
    }

    /// Visits of scheduled bookings in `start..=end`, ordered by date and then
    /// booking id.
    pub fn occurrences_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Visit> {
        let mut visits: Vec<Visit> = self
            .bookings
            .values()
            .filter(|b| b.status.is_active())
            .flat_map(|b| {
                b.recurrence_request()
                    .occurrences()
                    .take_while(move |date| *date <= end)
                    .filter(move |date| *date >= start)
                    .map(move |date| Visit {
                        date,
                        booking_id: b.id,
                        client_id: b.client_id,
                        service_code: b.service_code.clone(),
                    })
            })
            .collect();
        visits.sort_by_key(|v| (v.date, v.booking_id));
        visits
    }

    /// Fill empty collections with the demo clients and services.
    pub fn seed_demo_data(&mut self) -> Result<(), LedgerError> {
        if self.clients.is_empty() {
            self.add_client(NewClient::new(
                "Jane",
                "Doe",
                "jane@example.com",
                "+1-555-1111",
                "12 Green St, Springfield 12345",
            ))?;
            self.add_client(
                NewClient::new(
                    "John",
                    "Smith",
                    "john@example.com",
                    "+1-555-2222",
                    "34 Oak Ave, Shelbyville 67890",
                )
                .with_notes("Has large dog in backyard"),
            )?;
        }
        if self.services.is_empty() {
            self.add_service(Service::new("MOW", "Mowing", "Standard lawn mowing", 60.0, 45))?;
            self.add_service(Service::new(
                "EDGE",
                "Edging",
                "Edge trimming around paths and beds",
                35.0,
                30,
            ))?;
            self.add_service(Service::new("TRIM", "Trimming", "Hedge/bush trimming", 80.0, 60))?;
        }
        Ok(())
    }

    // Snapshots

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            profile: self.profile.clone(),
            clients: self.clients.values().cloned().collect(),
            services: self.services.clone(),
            bookings: self.bookings.values().cloned().collect(),
            next_client_id: self.next_client_id,
            next_booking_id: self.next_booking_id,
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        validate_collection(&snapshot.clients, &snapshot.services, &snapshot.bookings)?;

        let next_client_id = next_free_id(
            snapshot.next_client_id,
            snapshot.clients.iter().map(|c| c.id),
            "client",
        )?;
        let next_booking_id = next_free_id(
            snapshot.next_booking_id,
            snapshot.bookings.iter().map(|b| b.id),
            "booking",
        )?;

        Ok(Self {
            profile: snapshot.profile,
            clients: snapshot.clients.into_iter().map(|c| (c.id, c)).collect(),
            services: snapshot.services,
            bookings: snapshot.bookings.into_iter().map(|b| (b.id, b)).collect(),
            next_client_id,
            next_booking_id,
        })
    }

    /// Swap in a new set of bookings after checking them against the current
    /// clients and catalog.
    pub fn replace_bookings(&mut self, bookings: Vec<Booking>) -> Result<(), LedgerError> {
        let clients: Vec<Client> = self.clients.values().cloned().collect();
        validate_collection(&clients, &self.services, &bookings)?;
        self.next_booking_id =
            next_free_id(self.next_booking_id, bookings.iter().map(|b| b.id), "booking")?;
        self.bookings = bookings.into_iter().map(|b| (b.id, b)).collect();
        Ok(())
    }
}

/// Counter value to resume from: past every id in use, and never below the
/// stored counter or 1.
fn next_free_id(
    stored: i32,
    ids: impl Iterator<Item = i32>,
    kind: &str,
) -> Result<i32, ValidationError> {
    let max_id = ids.max().unwrap_or(0);
    let after_max = max_id.checked_add(1).ok_or_else(|| {
        ValidationError::new(format!("{kind} id {max_id} leaves no room for new ids"))
    })?;
    Ok(stored.max(after_max).max(1))
}
