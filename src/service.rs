use serde::{Deserialize, Serialize};

/// A billable service in the catalog, keyed by its upper-cased code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub code: String,
    pub name: String,
    pub description: String,
    pub base_price: f64,
    pub duration_minutes: i64,
}

impl Service {
    pub fn new(
        code: &str,
        name: impl Into<String>,
        description: impl Into<String>,
        base_price: f64,
        duration_minutes: i64,
    ) -> Self {
        Self {
            code: normalize_code(code),
            name: name.into(),
            description: description.into(),
            base_price,
            duration_minutes,
        }
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
