use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days added per step for `monthly`. This is a fixed offset, not a calendar
/// month, and stored bookings depend on it.
pub const MONTHLY_STEP_DAYS: i64 = 30;

/// Dates shown before a listing is cut short with `...`. A year of weekly
/// visits.
pub const DATE_PREVIEW_LIMIT: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecurrenceFrequency {
    #[default]
    None,
    Weekly,
    Fortnightly,
    Monthly,
}

impl RecurrenceFrequency {
    pub const ALL: [RecurrenceFrequency; 4] = [
        RecurrenceFrequency::None,
        RecurrenceFrequency::Weekly,
        RecurrenceFrequency::Fortnightly,
        RecurrenceFrequency::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceFrequency::None => "none",
            RecurrenceFrequency::Weekly => "weekly",
            RecurrenceFrequency::Fortnightly => "fortnightly",
            RecurrenceFrequency::Monthly => "monthly",
        }
    }

    /// Strict, case-insensitive parse. Returns `None` for anything that is not
    /// one of the four names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(RecurrenceFrequency::None),
            "weekly" => Some(RecurrenceFrequency::Weekly),
            "fortnightly" => Some(RecurrenceFrequency::Fortnightly),
            "monthly" => Some(RecurrenceFrequency::Monthly),
            _ => None,
        }
    }

    /// Lenient parse used for user-entered and stored values: blank or
    /// unrecognized input means no repeat.
    pub fn from_input(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            if !value.trim().is_empty() {
                log::warn!("unrecognized repeat frequency '{value}', treating as none");
            }
            RecurrenceFrequency::None
        })
    }

    pub fn step_days(&self) -> Option<i64> {
        match self {
            RecurrenceFrequency::None => None,
            RecurrenceFrequency::Weekly => Some(7),
            RecurrenceFrequency::Fortnightly => Some(14),
            RecurrenceFrequency::Monthly => Some(MONTHLY_STEP_DAYS),
        }
    }

    pub fn variants() -> [(&'static str, &'static str); 4] {
        [
            ("none", "One-off visit"),
            ("weekly", "Every 7 days"),
            ("fortnightly", "Every 14 days"),
            ("monthly", "Every 30 days"),
        ]
    }
}

impl fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RecurrenceFrequency {
    fn from(value: String) -> Self {
        Self::from_input(&value)
    }
}

impl From<RecurrenceFrequency> for String {
    fn from(value: RecurrenceFrequency) -> Self {
        value.as_str().to_string()
    }
}

/// The inputs needed to lay out a booking's visits. Built on demand from a
/// booking and never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRequest {
    pub anchor_date: NaiveDate,
    pub frequency: RecurrenceFrequency,
    pub occurrence_count: i64,
}

impl RecurrenceRequest {
    pub fn new(anchor_date: NaiveDate, frequency: RecurrenceFrequency, occurrence_count: i64) -> Self {
        Self {
            anchor_date,
            frequency,
            occurrence_count,
        }
    }

    /// Occurrence count clamped to at least one.
    pub fn normalized_count(&self) -> i64 {
        self.occurrence_count.max(1)
    }

    pub fn expand(&self) -> Vec<NaiveDate> {
        expand(self)
    }

    /// Visit dates in order, produced one at a time.
    pub fn occurrences(&self) -> Occurrences {
        let step = self.frequency.step_days().map(Duration::days);
        Occurrences {
            next: Some(self.anchor_date),
            step,
            remaining: if step.is_some() { self.normalized_count() } else { 1 },
        }
    }

    /// Date of the final visit, without walking the ones before it.
    pub fn last_occurrence(&self) -> NaiveDate {
        let Some(step_days) = self.frequency.step_days() else {
            return self.anchor_date;
        };
        let room = (NaiveDate::MAX - self.anchor_date).num_days() / step_days;
        let steps = (self.normalized_count() - 1).min(room);
        self.anchor_date + Duration::days(steps * step_days)
    }
}

/// Lazy walk over a request's visit dates. See [`RecurrenceRequest::occurrences`].
#[derive(Debug, Clone)]
pub struct Occurrences {
    next: Option<NaiveDate>,
    step: Option<Duration>,
    remaining: i64,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.remaining <= 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = match self.step {
            Some(step) if self.remaining > 0 => current.checked_add_signed(step),
            _ => None,
        };
        Some(current)
    }
}

/// Expand a request into its ordered visit dates, anchor first.
///
/// Never fails. A zero or negative count is treated as one, and `none`
/// always yields just the anchor. Should a step run past the last date chrono
/// can represent, the sequence ends at the last representable occurrence.
pub fn expand(request: &RecurrenceRequest) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(request.normalized_count().min(1024) as usize);
    dates.extend(request.occurrences());
    dates
}

pub fn format_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Like [`format_dates`], but stops after `limit` dates and marks the cut.
pub fn format_dates_limited<I>(dates: I, limit: usize) -> String
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut dates = dates.into_iter();
    let shown: Vec<NaiveDate> = dates.by_ref().take(limit).collect();
    let mut out = format_dates(&shown);
    if dates.next().is_some() {
        out.push_str(", ...");
    }
    out
}
