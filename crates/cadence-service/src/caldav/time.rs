//! Floating and absolute time values.
//!
//! A [`TimeValue`] is either floating (a wall-clock reading with no zone;
//! DATE values are floating readings at midnight) or absolute (an instant,
//! optionally remembering the zone it was written in). The two kinds never
//! compare implicitly: mixing them needs an explicit zone, supplied through
//! [`TimeContext`].

use std::cmp::Ordering;
use std::fmt;

use cadence_rfc::rfc::ical::core::{DateTime as IcalDateTime, DateTimeForm, Property, Value};
use cadence_rfc::rfc::ical::expand::{GapPolicy, TimeZoneResolver};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ServiceError, ServiceResult};

/// A date or date-time that is either floating or anchored to UTC.
#[derive(Debug, Clone)]
pub enum TimeValue {
    /// DATE value; behaves as a floating reading at midnight.
    Date(NaiveDate),
    /// Floating DATE-TIME, compared by wall-clock reading.
    Floating(NaiveDateTime),
    /// Absolute instant.
    Absolute {
        /// The instant in UTC.
        instant: DateTime<Utc>,
        /// TZID the value was written with, `None` for UTC values.
        zone: Option<String>,
    },
}

impl TimeValue {
    /// Creates an absolute UTC value.
    #[must_use]
    pub const fn utc(instant: DateTime<Utc>) -> Self {
        Self::Absolute {
            instant,
            zone: None,
        }
    }

    /// Returns whether this is a floating value (DATE values included).
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        matches!(self, Self::Date(_) | Self::Floating(_))
    }

    /// Returns whether this is a DATE value.
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the wall-clock reading of a floating value.
    #[must_use]
    pub fn floating_reading(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Self::Floating(dt) => Some(*dt),
            Self::Absolute { .. } => None,
        }
    }

    /// Returns the instant of an absolute value.
    #[must_use]
    pub const fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Absolute { instant, .. } => Some(*instant),
            _ => None,
        }
    }

    /// Returns the zone identifier an absolute value was written with.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        match self {
            Self::Absolute { zone, .. } => zone.as_deref(),
            _ => None,
        }
    }

    /// Returns an absolute value that will be written back in `zone`.
    /// Floating values are returned unchanged.
    #[must_use]
    pub fn in_zone(self, zone: Option<String>) -> Self {
        match self {
            Self::Absolute { instant, .. } => Self::Absolute { instant, zone },
            other => other,
        }
    }

    /// ## Summary
    /// Reads a time value from a DTSTART/DTEND/DUE/RECURRENCE-ID style property.
    ///
    /// Zoned readings are normalized to UTC; readings that fall into a DST
    /// gap are shifted forward one hour.
    ///
    /// ## Errors
    /// Returns an error if the property does not carry a single DATE or
    /// DATE-TIME, or if its zone cannot be resolved.
    pub fn from_property(prop: &Property, resolver: &mut TimeZoneResolver) -> ServiceResult<Self> {
        match &prop.value {
            Value::Date(d) => Ok(Self::Date(*d)),
            Value::DateTime(dt) => Self::from_ical(dt, resolver),
            other => Err(ServiceError::ValidationError(format!(
                "{} does not hold a date or date-time: {other:?}",
                prop.name
            ))),
        }
    }

    /// ## Summary
    /// Converts a typed iCalendar DATE-TIME into a time value.
    ///
    /// ## Errors
    /// Returns an error if the value's zone cannot be resolved.
    pub fn from_ical(dt: &IcalDateTime, resolver: &mut TimeZoneResolver) -> ServiceResult<Self> {
        match &dt.form {
            DateTimeForm::Floating => Ok(Self::Floating(dt.local)),
            DateTimeForm::Utc => Ok(Self::utc(dt.local.and_utc())),
            DateTimeForm::Zoned { tzid } => {
                let instant = resolver.localize(dt.local, tzid, GapPolicy::ShiftForward)?;
                Ok(Self::Absolute {
                    instant,
                    zone: Some(tzid.clone()),
                })
            }
        }
    }

    /// ## Summary
    /// Writes this value back as a property, in the form it was read in.
    ///
    /// Absolute values written with a zone are converted back to that zone's
    /// wall clock and carry the TZID again.
    ///
    /// ## Errors
    /// Returns an error if the remembered zone cannot be resolved.
    pub fn to_property(
        &self,
        name: &str,
        resolver: &mut TimeZoneResolver,
    ) -> ServiceResult<Property> {
        Ok(match self {
            Self::Date(d) => Property::date(name, *d),
            Self::Floating(dt) => Property::datetime(name, IcalDateTime::floating(*dt)),
            Self::Absolute {
                instant,
                zone: None,
            } => Property::datetime(name, IcalDateTime::utc(instant.naive_utc())),
            Self::Absolute {
                instant,
                zone: Some(tzid),
            } => {
                let tz = resolver.resolve(tzid)?;
                let local = instant.with_timezone(&tz).naive_local();
                Property::datetime(name, IcalDateTime::zoned(local, tzid.clone()))
            }
        })
    }

    /// ## Summary
    /// Adds a signed duration, keeping the value's kind.
    ///
    /// DATE values stay dates when the duration is a whole number of days
    /// and become floating date-times otherwise.
    #[must_use]
    pub fn checked_add(&self, delta: TimeDelta) -> Option<Self> {
        match self {
            Self::Date(d) => {
                if delta.num_seconds() % 86_400 == 0 {
                    d.checked_add_signed(delta).map(Self::Date)
                } else {
                    d.and_time(NaiveTime::MIN)
                        .checked_add_signed(delta)
                        .map(Self::Floating)
                }
            }
            Self::Floating(dt) => dt.checked_add_signed(delta).map(Self::Floating),
            Self::Absolute { instant, zone } => {
                instant
                    .checked_add_signed(delta)
                    .map(|instant| Self::Absolute {
                        instant,
                        zone: zone.clone(),
                    })
            }
        }
    }

    /// ## Summary
    /// Returns `self - other` when both values are of the same kind.
    #[must_use]
    pub fn signed_duration_since(&self, other: &Self) -> Option<TimeDelta> {
        match (self, other) {
            (Self::Absolute { instant: a, .. }, Self::Absolute { instant: b, .. }) => {
                Some(a.signed_duration_since(*b))
            }
            _ => Some(
                self.floating_reading()?
                    .signed_duration_since(other.floating_reading()?),
            ),
        }
    }

    /// ## Summary
    /// Anchors the value to an instant, reading floating values in `zone`.
    ///
    /// Floating readings inside a DST gap are shifted forward one hour; those
    /// inside a fold take the earlier instant.
    #[must_use]
    pub fn anchored_in(&self, zone: Tz) -> Option<DateTime<Utc>> {
        match self {
            Self::Absolute { instant, .. } => Some(*instant),
            _ => {
                let reading = self.floating_reading()?;
                zone.from_local_datetime(&reading)
                    .earliest()
                    .or_else(|| {
                        zone.from_local_datetime(&(reading + TimeDelta::hours(1)))
                            .earliest()
                    })
                    .map(|dt| dt.with_timezone(&Utc))
            }
        }
    }

    /// Returns the key used to index modifications by recurrence identifier.
    #[must_use]
    pub fn recurrence_key(&self) -> RecurrenceKey {
        match self {
            Self::Date(d) => RecurrenceKey::Floating(d.and_time(NaiveTime::MIN)),
            Self::Floating(dt) => RecurrenceKey::Floating(*dt),
            Self::Absolute { instant, .. } => RecurrenceKey::Absolute(*instant),
        }
    }
}

impl PartialEq for TimeValue {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for TimeValue {
    /// Floating values order by wall clock, absolute ones by instant.
    /// Mixing the two has no ordering.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Absolute { instant: a, .. }, Self::Absolute { instant: b, .. }) => {
                Some(a.cmp(b))
            }
            (Self::Absolute { .. }, _) | (_, Self::Absolute { .. }) => None,
            _ => Some(self.floating_reading()?.cmp(&other.floating_reading()?)),
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::Floating(dt) => write!(f, "{}", dt.format("%Y%m%dT%H%M%S")),
            Self::Absolute { instant, .. } => write!(f, "{}", instant.format("%Y%m%dT%H%M%SZ")),
        }
    }
}

/// Totally ordered key for a recurrence identifier.
///
/// Floating identifiers sort before absolute ones; within a kind the order
/// follows the time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecurrenceKey {
    /// Floating (or DATE) identifier, by wall-clock reading.
    Floating(NaiveDateTime),
    /// Absolute identifier, by instant.
    Absolute(DateTime<Utc>),
}

/// ## Summary
/// Comparison policy for mixed floating/absolute values.
///
/// Values of the same kind compare directly. A floating value compared with
/// an absolute one is read in the floating zone; without one the comparison
/// is ambiguous and fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeContext {
    floating_zone: Option<Tz>,
}

impl TimeContext {
    /// Creates a context that resolves floating values in `floating_zone`.
    #[must_use]
    pub const fn new(floating_zone: Option<Tz>) -> Self {
        Self { floating_zone }
    }

    /// Returns the zone floating values are read in, if any.
    #[must_use]
    pub const fn floating_zone(self) -> Option<Tz> {
        self.floating_zone
    }

    /// ## Summary
    /// Compares two time values under this context.
    ///
    /// ## Errors
    /// Returns [`ServiceError::AmbiguousComparison`] when a floating value meets
    /// an absolute one and no floating zone is configured.
    pub fn compare(self, a: &TimeValue, b: &TimeValue) -> ServiceResult<Ordering> {
        if let Some(ordering) = a.partial_cmp(b) {
            return Ok(ordering);
        }

        let zone = self
            .floating_zone
            .ok_or_else(|| ServiceError::AmbiguousComparison(format!("{a} vs {b}")))?;
        let left = a.anchored_in(zone);
        let right = b.anchored_in(zone);
        match (left, right) {
            (Some(l), Some(r)) => Ok(l.cmp(&r)),
            _ => Err(ServiceError::AmbiguousComparison(format!(
                "{a} vs {b} cannot be anchored in {zone}"
            ))),
        }
    }

    /// ## Summary
    /// Returns whether two values of possibly different kinds can be
    /// compared under this context.
    #[must_use]
    pub fn can_compare(self, a: &TimeValue, b: &TimeValue) -> bool {
        a.is_floating() == b.is_floating() || self.floating_zone.is_some()
    }
}
