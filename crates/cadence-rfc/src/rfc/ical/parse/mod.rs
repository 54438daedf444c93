//! iCalendar value parsing (RFC 5545 §3.3).
//!
//! Components arrive already split into properties; this module turns a
//! property's raw value text into a typed [`Value`](super::core::Value).

mod error;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use values::{
    parse_date, parse_datetime, parse_duration, parse_property, parse_property_value,
    unescape_text,
};
