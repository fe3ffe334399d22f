//! Account and timer domain records.
//!
//! # Responsibility
//! - Define the canonical account/timer shapes shared by engine and services.
//! - Provide constructors that assign stable ids and preset timers.
//!
//! # Invariants
//! - `id` values are stable for the lifetime of a loaded snapshot.
//! - `end_timestamp == None` means the timer is available.
//! - Names are non-blank after trim.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an account.
pub type AccountId = Uuid;

/// Stable identifier for a timer, unique across the snapshot.
pub type TimerId = Uuid;

/// Timers every new account starts with, in storage order.
pub const DEFAULT_TIMER_NAMES: [&str; 7] = [
    "Builder 1",
    "Builder 2",
    "Builder 3",
    "Builder 4",
    "Builder 5",
    "Laboratory",
    "Pet House",
];

/// Validation failures raised at the edit/create boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account name is blank after trim.
    BlankAccountName,
    /// Timer name is blank after trim.
    BlankTimerName,
    /// Another account already uses this name (case-insensitive).
    DuplicateAccountName(String),
    /// Another timer in the same account already uses this name.
    DuplicateTimerName { account: String, timer: String },
    /// Duration input could not be parsed.
    InvalidDuration(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankAccountName => write!(f, "account name must not be blank"),
            Self::BlankTimerName => write!(f, "timer name must not be blank"),
            Self::DuplicateAccountName(name) => {
                write!(f, "account name already in use: `{name}`")
            }
            Self::DuplicateTimerName { account, timer } => {
                write!(f, "timer name `{timer}` already in use in account `{account}`")
            }
            Self::InvalidDuration(input) => write!(f, "invalid duration: `{input}`"),
        }
    }
}

impl Error for ValidationError {}

/// One named countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: TimerId,
    pub name: String,
    /// Completion instant in Unix epoch milliseconds.
    pub end_timestamp: Option<i64>,
}

impl Timer {
    /// Creates an available timer with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            end_timestamp: None,
        }
    }

    /// Creates a timer that completes at `end_timestamp`.
    pub fn running(name: impl Into<String>, end_timestamp: i64) -> Self {
        Self {
            end_timestamp: Some(end_timestamp),
            ..Self::new(name)
        }
    }

    /// Returns a copy with the completion instant cleared.
    pub fn reset(&self) -> Self {
        Self {
            end_timestamp: None,
            ..self.clone()
        }
    }
}

/// Named collection of timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub timers: Vec<Timer>,
}

impl Account {
    /// Creates an account with the preset timer set.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_timers(
            name,
            DEFAULT_TIMER_NAMES.iter().map(|name| Timer::new(*name)).collect(),
        )
    }

    /// Creates an account with caller-provided timers.
    ///
    /// Used by import/load paths where the timer set already exists.
    pub fn with_timers(name: impl Into<String>, timers: Vec<Timer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timers,
        }
    }

    pub fn timer(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|timer| timer.id == id)
    }

    pub fn timer_mut(&mut self, id: TimerId) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|timer| timer.id == id)
    }

    /// Finds a timer by name, ignoring case and surrounding whitespace.
    pub fn find_timer(&self, name: &str) -> Option<&Timer> {
        let key = name_key(name);
        self.timers.iter().find(|timer| name_key(&timer.name) == key)
    }
}

/// Normalizes a user-supplied name, rejecting blank input.
pub fn normalize_name(value: &str, blank: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(blank);
    }
    Ok(trimmed.to_string())
}

/// Comparison key for name uniqueness and lookup.
pub fn name_key(value: &str) -> String {
    value.trim().to_lowercase()
}
