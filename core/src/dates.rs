//! Conversion between wire events (string dates) and calendar events.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::ApiError;
use crate::types::{CalendarEvent, WireEvent};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an RFC 3339 timestamp, or a naive date-time taken as UTC.
pub fn parse_wire_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::InvalidDate(raw.to_string()))
}

/// Format a timestamp as RFC 3339 in UTC, keeping every fractional digit.
pub fn format_wire_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl TryFrom<WireEvent> for CalendarEvent {
    type Error = ApiError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        Ok(CalendarEvent {
            start: parse_wire_date(&wire.start)?,
            end: parse_wire_date(&wire.end)?,
            id: wire.id,
            title: wire.title,
            notes: wire.notes,
            user: wire.user,
        })
    }
}

impl CalendarEvent {
    pub fn to_wire(&self) -> WireEvent {
        WireEvent {
            id: self.id.clone(),
            title: self.title.clone(),
            notes: self.notes.clone(),
            start: format_wire_date(&self.start),
            end: format_wire_date(&self.end),
            user: self.user.clone(),
        }
    }
}

/// Map a batch of wire events to calendar events, keeping order.
///
/// Fails as a whole if any date is unparseable; nothing is dropped silently.
pub fn convert_events_to_date_events(
    events: Vec<WireEvent>,
) -> Result<Vec<CalendarEvent>, ApiError> {
    events.into_iter().map(CalendarEvent::try_from).collect()
}
