//! iCalendar (RFC 5545) models, value parsing, serialization and time zone
//! resolution.

pub mod build;
pub mod core;
pub mod expand;
pub mod parse;
