//! Timer duration input.
//!
//! # Responsibility
//! - Parse form fields (`hours`, `minutes`) and compact text (`1d 2h 30m`).
//! - Clamp negative form input to zero instead of producing past instants.
//!
//! # Invariants
//! - A zero duration means "clear the timer", never "complete now".

use crate::model::account::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

static DURATION_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)\s*d)?\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?$").expect("valid duration regex")
});

/// Countdown length entered by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerDuration {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

impl TimerDuration {
    pub fn new(days: u32, hours: u32, minutes: u32) -> Self {
        Self {
            days,
            hours,
            minutes,
        }
    }

    /// Builds a duration from raw form fields.
    ///
    /// Blank fields count as zero and negative numbers clamp to zero.
    ///
    /// # Errors
    /// - `ValidationError::InvalidDuration` when a field is not an integer.
    pub fn from_form(hours: &str, minutes: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(0, parse_form_field(hours)?, parse_form_field(minutes)?))
    }

    /// Parses compact text such as `2h 30m`, `1d4h`, or `90m`.
    ///
    /// # Errors
    /// - `ValidationError::InvalidDuration` when no component is present or
    ///   the text contains anything else.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim().to_ascii_lowercase();
        let invalid = || ValidationError::InvalidDuration(text.to_string());
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let captures = DURATION_TEXT_RE.captures(&trimmed).ok_or_else(invalid)?;
        let component = |index: usize| -> Result<Option<u32>, ValidationError> {
            captures
                .get(index)
                .map(|value| value.as_str().parse::<u32>().map_err(|_| invalid()))
                .transpose()
        };

        let days = component(1)?;
        let hours = component(2)?;
        let minutes = component(3)?;
        if days.is_none() && hours.is_none() && minutes.is_none() {
            return Err(invalid());
        }

        Ok(Self::new(
            days.unwrap_or(0),
            hours.unwrap_or(0),
            minutes.unwrap_or(0),
        ))
    }

    pub fn as_millis(&self) -> i64 {
        i64::from(self.days) * DAY_MS
            + i64::from(self.hours) * HOUR_MS
            + i64::from(self.minutes) * MINUTE_MS
    }

    pub fn is_zero(&self) -> bool {
        self.as_millis() == 0
    }
}

fn parse_form_field(value: &str) -> Result<u32, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let parsed = trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidDuration(value.to_string()))?;
    Ok(u32::try_from(parsed.max(0)).unwrap_or(u32::MAX))
}
