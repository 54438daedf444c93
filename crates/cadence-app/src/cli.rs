//! Command-line interface definition.

use std::path::PathBuf;

use cadence_core::error::CoreError;
use cadence_rfc::error::RfcError;
use cadence_rfc::rfc::ical::expand::TimeZoneResolver;
use cadence_rfc::rfc::ical::parse::parse_property;
use cadence_service::caldav::limit::QueryWindow;
use cadence_service::caldav::time::TimeValue;
use clap::Parser;

use crate::error::AppResult;

/// cadence - limit a recurring series to a time window
#[derive(Debug, Parser)]
#[command(name = "cadence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON series document
    pub document: PathBuf,

    /// Inclusive window start, e.g. 20060104T010000Z (floating without Z)
    #[arg(long)]
    pub start: String,

    /// Exclusive window end
    #[arg(long)]
    pub end: String,

    /// Zone used to read floating times against an absolute window
    #[arg(long, env = "CADENCE_FLOATING_ZONE")]
    pub floating_zone: Option<String>,

    /// Print only the fingerprint
    #[arg(long)]
    pub fingerprint_only: bool,
}

impl Cli {
    /// ## Summary
    /// Builds the query window from `--start` and `--end`.
    ///
    /// ## Errors
    /// Returns an error if either bound is not a DATE or DATE-TIME, or if
    /// the bounds do not form a valid window.
    pub fn window(&self) -> AppResult<QueryWindow> {
        let mut resolver = TimeZoneResolver::new();
        let start = parse_time(&self.start, &mut resolver)?;
        let end = parse_time(&self.end, &mut resolver)?;
        Ok(QueryWindow::new(start, end)?)
    }
}

/// Reads a window bound written like an iCalendar DATE or DATE-TIME value.
fn parse_time(text: &str, resolver: &mut TimeZoneResolver) -> AppResult<TimeValue> {
    let prop = parse_property("DTSTART", Vec::new(), text.trim()).map_err(RfcError::from)?;
    TimeValue::from_property(&prop, resolver).map_err(|err| {
        CoreError::InvalidInput(format!("window bound {text:?}: {err}")).into()
    })
}
