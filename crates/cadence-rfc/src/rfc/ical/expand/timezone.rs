//! TZID lookup and wall-clock to UTC mapping.
//!
//! TZIDs written by calendar clients are not always IANA names. Vendor
//! prefixes are stripped, Windows zone names and IANA aliases are mapped
//! through ICU4X before the name is handed to `chrono-tz`.

use std::collections::HashMap;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;

const VENDOR_PREFIXES: [&str; 2] = ["/mozilla.org/", "/softwarestudio.org/"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    #[error("Unknown timezone: {0}")]
    Unknown(String),

    #[error("{local} does not exist in {tzid}")]
    Skipped { local: NaiveDateTime, tzid: String },
}

/// What to do with a wall-clock time that falls in a forward transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Fail with [`ZoneError::Skipped`].
    Reject,
    /// Move the time forward by the usual one hour gap.
    #[default]
    ShiftForward,
}

/// Maps TZIDs to zones, remembering each TZID as written.
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    zones: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Looks up the zone named by `tzid`.
    ///
    /// ## Errors
    /// Returns [`ZoneError::Unknown`] if no IANA zone matches.
    ///
    /// ## Side Effects
    /// Remembers the zone for later lookups of the same TZID.
    pub fn resolve(&mut self, tzid: &str) -> Result<Tz, ZoneError> {
        if let Some(tz) = self.zones.get(tzid) {
            return Ok(*tz);
        }
        let name = iana_name(tzid);
        let tz: Tz = name
            .parse()
            .map_err(|_parse| ZoneError::Unknown(tzid.to_string()))?;
        tracing::trace!(tzid, zone = %tz, "Zone resolved");
        self.zones.insert(tzid.to_string(), tz);
        Ok(tz)
    }

    /// ## Summary
    /// Reads `local` as a wall-clock time in `tzid` and returns the instant.
    ///
    /// Repeated wall-clock times resolve to their first occurrence. Skipped
    /// ones are handled according to `gaps`.
    ///
    /// ## Errors
    /// Returns an error if the zone is unknown, or if the time is skipped
    /// and `gaps` is [`GapPolicy::Reject`].
    pub fn localize(
        &mut self,
        local: NaiveDateTime,
        tzid: &str,
        gaps: GapPolicy,
    ) -> Result<DateTime<Utc>, ZoneError> {
        let tz = self.resolve(tzid)?;
        if let Some(instant) = earliest(tz, local) {
            return Ok(instant);
        }
        if gaps == GapPolicy::ShiftForward {
            let shifted = local + TimeDelta::hours(1);
            tracing::debug!(%local, %shifted, tzid, "Wall-clock time moved past a gap");
            if let Some(instant) = earliest(tz, shifted) {
                return Ok(instant);
            }
        }
        Err(ZoneError::Skipped {
            local,
            tzid: tzid.to_string(),
        })
    }
}

fn earliest(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => Some(at.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Best IANA name for a written TZID, or the TZID itself.
fn iana_name(tzid: &str) -> String {
    let bare = VENDOR_PREFIXES
        .iter()
        .find_map(|prefix| tzid.strip_prefix(prefix))
        .unwrap_or(tzid);

    let iana = IanaParserExtended::new();
    let windows = WindowsParser::new()
        .parse(bare, None)
        .and_then(|zone| iana.iter().find(|entry| entry.time_zone == zone));
    if let Some(entry) = windows {
        return entry.canonical.to_string();
    }

    let parsed = iana.parse(bare);
    if parsed.time_zone == icu::time::TimeZone::UNKNOWN {
        bare.to_string()
    } else {
        parsed.canonical.to_string()
    }
}
