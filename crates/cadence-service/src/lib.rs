//! Recurring calendar series: time values, time-range index, master and
//! modification model, recurrence-set limiting, output filtering and
//! entity fingerprints.

pub mod caldav;
pub mod error;
