//! Shared building blocks for the cadence workspace: configuration,
//! core errors and constants used by every other crate.

pub mod config;
pub mod constants;
pub mod error;
