//! Date/time values accepted by time-bound filters, and the flexible parser
//! used when a bound arrives as raw text from job configuration.

use crate::error::ExportError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// A point in time, either already structured or still raw text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateTimeValue {
    At(OffsetDateTime),
    Raw(String),
}

impl DateTimeValue {
    /// Resolve to a structured instant. `field` is only used to name the filter
    /// target in the error.
    pub fn resolve(&self, field: &str) -> Result<OffsetDateTime, ExportError> {
        match self {
            DateTimeValue::At(dt) => Ok(*dt),
            DateTimeValue::Raw(s) => parse_flexible(s).ok_or_else(|| ExportError::InvalidArgument {
                field: field.to_string(),
                expected: "date-time",
                received_kind: "string",
                received_value: s.clone(),
            }),
        }
    }
}

impl From<OffsetDateTime> for DateTimeValue {
    fn from(dt: OffsetDateTime) -> Self {
        DateTimeValue::At(dt)
    }
}

impl From<&str> for DateTimeValue {
    fn from(s: &str) -> Self {
        DateTimeValue::Raw(s.to_string())
    }
}

impl From<String> for DateTimeValue {
    fn from(s: String) -> Self {
        DateTimeValue::Raw(s)
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeValue::At(dt) => match dt.format(&Rfc3339) {
                Ok(s) => f.write_str(&s),
                Err(_) => write!(f, "{}", dt.unix_timestamp()),
            },
            DateTimeValue::Raw(s) => f.write_str(s),
        }
    }
}

fn loose_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[Tt ](\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?\s*([Zz]|[+-]\d{2}:?\d{2})?$",
        )
        .expect("static date pattern compiles")
    })
}

/// Parse the date/time spellings job configuration commonly carries:
/// - RFC 3339 (`2024-01-01T10:00:00Z`, `2024-01-01T12:00:00+02:00`)
/// - `YYYY-MM-DD HH:MM[:SS[.frac]]` or with a `T` separator, optional `Z`/offset
/// - `YYYY-MM-DD` (midnight)
///
/// Values without an offset are taken as UTC. Returns None when nothing matches
/// or the calendar fields are out of range.
pub fn parse_flexible(raw: &str) -> Option<OffsetDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }

    let caps = loose_pattern().captures(s)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month = Month::try_from(u8::try_from(num(2)?).ok()?).ok()?;
    let day = u8::try_from(num(3)?).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;

    let hour = u8::try_from(num(4).unwrap_or(0)).ok()?;
    let minute = u8::try_from(num(5).unwrap_or(0)).ok()?;
    let second = u8::try_from(num(6).unwrap_or(0)).ok()?;
    let nanos = match caps.get(7) {
        Some(m) => {
            let digits = m.as_str();
            let padded = format!("{:0<9}", digits);
            padded.parse::<u32>().ok()?
        }
        None => 0,
    };
    let time = Time::from_hms_nano(hour, minute, second, nanos).ok()?;

    let offset = match caps.get(8).map(|m| m.as_str()) {
        None | Some("Z") | Some("z") => UtcOffset::UTC,
        Some(o) => parse_offset(o)?,
    };

    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

fn parse_offset(s: &str) -> Option<UtcOffset> {
    let (sign, rest) = s.split_at(1);
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    let hours: i8 = digits[..2].parse().ok()?;
    let minutes: i8 = digits[2..].parse().ok()?;
    let (hours, minutes) = if sign == "-" { (-hours, -minutes) } else { (hours, minutes) };
    UtcOffset::from_hms(hours, minutes, 0).ok()
}
