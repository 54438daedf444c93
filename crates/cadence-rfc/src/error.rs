use thiserror::Error;

use crate::rfc::ical::expand::ZoneError;
use crate::rfc::ical::parse::ParseError;

/// Failures reading iCalendar text values or their zones.
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("iCalendar value: {0}")]
    ParseError(#[from] ParseError),

    #[error("iCalendar zone: {0}")]
    ZoneError(#[from] ZoneError),
}
