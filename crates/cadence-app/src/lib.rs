//! The `cadence` command: reads a JSON series document, limits it to a
//! query window and prints its fingerprint and the filtered calendar.

pub mod cli;
pub mod document;
pub mod error;
