//! Typing raw property values (RFC 5545 §3.3).

use chrono::{NaiveDate, NaiveTime};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{DateTime, Duration, Parameter, Property, Value};

/// Reads a basic-format DATE such as `20060102`.
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit calendar date.
pub fn parse_date(s: &str) -> ParseResult<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, s));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map_err(|e| ParseError::new(ParseErrorKind::InvalidDate, format!("{s} ({e})")))
}

/// Reads a basic-format DATE-TIME such as `20060102T140000Z`.
///
/// The `Z` suffix wins over `tzid`; without either the value is floating.
///
/// ## Errors
/// Returns an error if `s` is not a DATE-TIME.
pub fn parse_datetime(s: &str, tzid: Option<&str>) -> ParseResult<DateTime> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidDateTime, s);

    let (body, is_utc) = match s.strip_suffix('Z') {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };
    let (date_str, time_str) = body.split_once('T').ok_or_else(invalid)?;

    let date = parse_date(date_str)
        .map_err(|e| ParseError::new(ParseErrorKind::InvalidDateTime, e.input))?;
    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let time = NaiveTime::parse_from_str(time_str, "%H%M%S").map_err(|e| {
        ParseError::new(ParseErrorKind::InvalidDateTime, format!("{s} ({e})"))
    })?;
    let local = date.and_time(time);

    Ok(match (is_utc, tzid) {
        (true, _) => DateTime::utc(local),
        (false, Some(tz)) => DateTime::zoned(local, tz),
        (false, None) => DateTime::floating(local),
    })
}

/// Reads a DURATION such as `PT1H`, `-P1DT15M` or `P2W`.
///
/// ## Errors
/// Returns an error on year or month designators, a week count mixed with
/// other units, or a designator without a number.
pub fn parse_duration(s: &str) -> ParseResult<Duration> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidDuration, s);
    let mut dur = Duration::zero();

    let rest = if let Some(r) = s.strip_prefix('-') {
        dur.negative = true;
        r
    } else {
        s.strip_prefix('+').unwrap_or(s)
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut in_time = false;
    let mut number: Option<u32> = None;
    let mut saw_component = false;
    let mut saw_week = false;

    for c in rest.chars() {
        if let Some(digit) = c.to_digit(10) {
            let current = number.unwrap_or(0);
            number = Some(
                current
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(digit))
                    .ok_or_else(invalid)?,
            );
            continue;
        }

        if c == 'T' {
            if in_time || number.is_some() {
                return Err(invalid());
            }
            in_time = true;
            continue;
        }

        let n = number.take().ok_or_else(invalid)?;
        if saw_week {
            return Err(invalid());
        }
        match c {
            'W' if !in_time && !saw_component => {
                dur.weeks = n;
                saw_week = true;
            }
            'D' if !in_time => dur.days = n,
            'H' if in_time => dur.hours = n,
            'M' if in_time => dur.minutes = n,
            'S' if in_time => dur.seconds = n,
            _ => return Err(invalid()),
        }
        saw_component = true;
    }

    if number.is_some() || !saw_component {
        return Err(invalid());
    }

    Ok(dur)
}

/// Reverses TEXT escaping. Unknown escapes are kept as written.
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        let mut tail = rest[at + 1..].chars();
        match tail.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(literal @ (',' | ';' | '\\')) => out.push(literal),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
        rest = tail.as_str();
    }
    out.push_str(rest);
    out
}

/// How a raw value is read.
#[derive(Debug, Clone, Copy)]
enum ValueType {
    Date,
    DateTime,
    Duration,
    Integer,
    Recur,
    Text,
    Raw,
}

impl ValueType {
    fn from_param(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_ref() {
            "DATE" => Some(Self::Date),
            "DATE-TIME" => Some(Self::DateTime),
            "DURATION" => Some(Self::Duration),
            "INTEGER" => Some(Self::Integer),
            "RECUR" => Some(Self::Recur),
            "TEXT" => Some(Self::Text),
            "BINARY" | "BOOLEAN" | "CAL-ADDRESS" | "FLOAT" | "PERIOD" | "TIME" | "URI"
            | "UTC-OFFSET" => Some(Self::Raw),
            _ => None,
        }
    }

    /// Default value type of a property name (RFC 5545 §3.8).
    fn default_for(name: &str) -> Self {
        match name {
            "DTSTART" | "DTEND" | "DUE" | "RECURRENCE-ID" | "EXDATE" | "RDATE" | "DTSTAMP"
            | "CREATED" | "LAST-MODIFIED" | "COMPLETED" => Self::DateTime,
            "DURATION" => Self::Duration,
            "RRULE" | "EXRULE" => Self::Recur,
            "SEQUENCE" | "PRIORITY" | "PERCENT-COMPLETE" | "REPEAT" => Self::Integer,
            "ATTENDEE" | "ORGANIZER" | "URL" | "TZURL" | "TZOFFSETFROM" | "TZOFFSETTO"
            | "GEO" | "TRIGGER" | "FREEBUSY" | "ATTACH" => Self::Raw,
            _ => Self::Text,
        }
    }
}

fn is_list_property(name: &str) -> bool {
    matches!(name, "EXDATE" | "RDATE")
}

/// ## Summary
/// Parses the raw value of a property into a typed [`Value`].
///
/// The type comes from the VALUE parameter when present, otherwise from the
/// property name's default. A TZID parameter turns local date-times into
/// zoned ones. EXDATE and RDATE accept comma-separated lists.
///
/// ## Errors
/// Returns an error if the value does not match its resolved type.
pub fn parse_property_value(name: &str, params: &[Parameter], raw: &str) -> ParseResult<Value> {
    let name = name.to_ascii_uppercase();
    let find_param = |wanted: &str| {
        params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .and_then(Parameter::value)
    };

    let value_type = match find_param("VALUE") {
        Some(v) => ValueType::from_param(v)
            .ok_or_else(|| ParseError::new(ParseErrorKind::UnsupportedValueType, v))?,
        None => ValueType::default_for(&name),
    };
    let tzid = find_param("TZID");

    if is_list_property(&name) && matches!(value_type, ValueType::Date | ValueType::DateTime) {
        let items = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_scalar(s, value_type, tzid))
            .collect::<ParseResult<Vec<_>>>()?;
        return Ok(match <[Value; 1]>::try_from(items) {
            Ok([single]) => single,
            Err(items) => Value::List(items),
        });
    }

    parse_scalar(raw, value_type, tzid)
}

fn parse_scalar(raw: &str, value_type: ValueType, tzid: Option<&str>) -> ParseResult<Value> {
    match value_type {
        ValueType::Date => Ok(Value::Date(parse_date(raw)?)),
        // A bare date under a date-time property is accepted as DATE
        ValueType::DateTime if raw.len() == 8 => Ok(Value::Date(parse_date(raw)?)),
        ValueType::DateTime => Ok(Value::DateTime(parse_datetime(raw, tzid)?)),
        ValueType::Duration => Ok(Value::Duration(parse_duration(raw)?)),
        ValueType::Integer => raw
            .trim()
            .parse()
            .map(Value::Integer)
            .map_err(|e| ParseError::new(ParseErrorKind::InvalidInteger, format!("{raw} ({e})"))),
        ValueType::Recur => Ok(Value::Recur(raw.to_string())),
        ValueType::Text => Ok(Value::Text(unescape_text(raw))),
        ValueType::Raw => Ok(Value::Unknown(raw.to_string())),
    }
}

/// ## Summary
/// Builds a typed [`Property`] from its name, parameters and raw value.
///
/// ## Errors
/// Returns an error if the value cannot be parsed.
pub fn parse_property(
    name: impl Into<String>,
    params: Vec<Parameter>,
    raw: impl Into<String>,
) -> ParseResult<Property> {
    let name = name.into().to_ascii_uppercase();
    let raw_value = raw.into();
    let value = parse_property_value(&name, &params, &raw_value)?;
    Ok(Property {
        name,
        params,
        value,
        raw_value,
    })
}
