//! iCalendar (RFC 5545) building blocks: the component model, value-level
//! parsing, canonical serialization and timezone resolution.

pub mod error;
pub mod rfc;
