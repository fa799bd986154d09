use crate::booking::Booking;
use crate::client::Client;
use crate::service::Service;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_client(client: &Client) -> Result<(), ValidationError> {
    if client.id < 1 {
        return Err(ValidationError::new(format!(
            "client id {} must be positive",
            client.id
        )));
    }
    if client.full_name().is_empty() {
        return Err(ValidationError::new(format!(
            "client {} requires a first or last name",
            client.id
        )));
    }
    Ok(())
}

pub fn validate_service(service: &Service) -> Result<(), ValidationError> {
    if service.code.trim().is_empty() {
        return Err(ValidationError::new("service code must not be empty"));
    }
    if service.code != service.code.trim().to_ascii_uppercase() {
        return Err(ValidationError::new(format!(
            "service code '{}' must be trimmed upper-case",
            service.code
        )));
    }
    if !service.base_price.is_finite() || service.base_price < 0.0 {
        return Err(ValidationError::new(format!(
            "service {} has invalid base_price {}",
            service.code, service.base_price
        )));
    }
    if service.duration_minutes < 0 {
        return Err(ValidationError::new(format!(
            "service {} has negative duration {}",
            service.code, service.duration_minutes
        )));
    }
    Ok(())
}

pub fn validate_booking(booking: &Booking) -> Result<(), ValidationError> {
    if booking.id < 1 {
        return Err(ValidationError::new(format!(
            "booking id {} must be positive",
            booking.id
        )));
    }
    if booking.service_code.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "booking {} has no service code",
            booking.id
        )));
    }
    if booking.occurrences < 1 {
        return Err(ValidationError::new(format!(
            "booking {} has occurrences {} (must be at least 1)",
            booking.id, booking.occurrences
        )));
    }
    Ok(())
}

/// Checks every record plus cross-record rules: unique keys and bookings that
/// point at known clients and services.
pub fn validate_collection(
    clients: &[Client],
    services: &[Service],
    bookings: &[Booking],
) -> Result<(), ValidationError> {
    let mut client_ids = HashSet::with_capacity(clients.len());
    for client in clients {
        if !client_ids.insert(client.id) {
            return Err(ValidationError::new(format!(
                "duplicate client id {}",
                client.id
            )));
        }
        validate_client(client)?;
    }

    let mut codes = HashSet::with_capacity(services.len());
    for service in services {
        validate_service(service)?;
        if !codes.insert(service.code.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate service code {}",
                service.code
            )));
        }
    }

    let mut booking_ids = HashSet::with_capacity(bookings.len());
    for booking in bookings {
        if !booking_ids.insert(booking.id) {
            return Err(ValidationError::new(format!(
                "duplicate booking id {}",
                booking.id
            )));
        }
        validate_booking(booking)?;
        if !client_ids.contains(&booking.client_id) {
            return Err(ValidationError::new(format!(
                "booking {} references unknown client {}",
                booking.id, booking.client_id
            )));
        }
        if !codes.contains(booking.service_code.as_str()) {
            return Err(ValidationError::new(format!(
                "booking {} references unknown service {}",
                booking.id, booking.service_code
            )));
        }
    }
    Ok(())
}
