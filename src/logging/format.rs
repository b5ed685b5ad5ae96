//! Line format
//!
//! Every sink receives the same text: `LEVEL [RFC3339 timestamp] message`.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};

use super::level::Severity;

/// Render one log line, without the trailing newline
pub fn format_line<Tz>(level: Severity, timestamp: &DateTime<Tz>, message: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} [{}] {}",
        level.as_str(),
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        message
    )
}

/// A line split back into its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub level: Severity,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
}

/// Parse a line produced by [`format_line`]
///
/// Returns None for anything else, including torn or interleaved output.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.strip_suffix('\n').unwrap_or(line);

    let (name, rest) = line.split_once(' ')?;
    // Exact names only; `FromStr` is lenient, the writer is not
    let level = Severity::ALL
        .into_iter()
        .find(|level| level.as_str() == name)?;

    let rest = rest.strip_prefix('[')?;
    let (timestamp, message) = rest.split_once("] ")?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp).ok()?;

    Some(ParsedLine {
        level,
        timestamp,
        message: message.to_string(),
    })
}
