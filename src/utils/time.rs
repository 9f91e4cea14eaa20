//! Timecode parsing and formatting utilities

use crate::domain::errors::DomainError;
use crate::domain::model::TimeOffset;

/// Converts between `HH:MM:SS` style timecodes and millisecond offsets
pub struct TimeCodec;

impl TimeCodec {
    /// Parse `HH:MM:SS`, `MM:SS` or `SS` into an offset.
    ///
    /// Every field must be a non-negative integer. Minute and second fields
    /// above 59 are accepted and simply summed.
    pub fn parse(text: &str) -> Result<TimeOffset, DomainError> {
        let trimmed = text.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();

        if parts.is_empty() || parts.len() > 3 {
            return Err(DomainError::format(
                text,
                "expected HH:MM:SS, MM:SS or SS",
            ));
        }

        let mut total_seconds: u64 = 0;
        for part in &parts {
            let value = Self::parse_field(text, part)?;
            total_seconds = total_seconds
                .checked_mul(60)
                .and_then(|acc| acc.checked_add(value))
                .ok_or_else(|| DomainError::format(text, "timecode is too large"))?;
        }

        total_seconds
            .checked_mul(1000)
            .filter(|ms| *ms <= TimeOffset::MAX_MILLIS)
            .map(TimeOffset::from_millis)
            .ok_or_else(|| DomainError::format(text, "timecode is too large"))
    }

    /// Format milliseconds as `HH:MM:SS`, truncating sub-second precision
    pub fn format(ms: u64) -> String {
        let total_seconds = ms / 1000;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }

    /// Format a millisecond span as decimal seconds for the encoder's `-t` flag
    pub fn format_seconds(ms: u64) -> String {
        format!("{}.{:03}", ms / 1000, ms % 1000)
    }

    fn parse_field(text: &str, field: &str) -> Result<u64, DomainError> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::format(
                text,
                format!("'{}' is not a non-negative integer", field),
            ));
        }
        field
            .parse::<u64>()
            .map_err(|_| DomainError::format(text, "timecode is too large"))
    }
}
