//! Zone lookup for iCalendar date-times.

mod timezone;

pub use timezone::{GapPolicy, TimeZoneResolver, ZoneError};
