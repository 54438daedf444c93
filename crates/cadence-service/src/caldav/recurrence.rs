//! Recurrence sets built from a master component's RRULE, RDATE and EXDATE.

use cadence_rfc::rfc::ical::core::{Component, Property, Value};
use cadence_rfc::rfc::ical::expand::{GapPolicy, TimeZoneResolver};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rrule::{RRule, RRuleSet, Tz, Unvalidated};

use super::time::TimeValue;
use crate::error::{ServiceError, ServiceResult};

/// How occurrence instants map back to [`TimeValue`]s.
///
/// Floating and DATE series are expanded on a UTC clock that stands in for
/// the wall clock.
#[derive(Debug, Clone)]
enum Frame {
    /// DATE series; occurrences are dates.
    Date,
    /// Floating series; occurrences are wall-clock readings.
    Floating,
    /// Absolute series, expanded in the DTSTART zone.
    Absolute { zone: Option<String> },
}

/// Expanded form of a master's recurrence properties.
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    dtstart: TimeValue,
    frame: Frame,
    set: RRuleSet,
    recurring: bool,
}

impl RecurrenceRule {
    /// ## Summary
    /// Builds the recurrence set of a master component.
    ///
    /// Returns `Ok(None)` when the component has no usable DTSTART. Without
    /// RRULE the set holds DTSTART plus any RDATE values.
    ///
    /// ## Errors
    /// Returns [`ServiceError::RuleError`] if the RRULE is malformed or the
    /// DTSTART zone is unknown.
    #[tracing::instrument(skip(component, resolver), fields(uid = ?component.uid()))]
    pub fn from_component(
        component: &Component,
        resolver: &mut TimeZoneResolver,
    ) -> ServiceResult<Option<Self>> {
        let Some(dtstart_prop) = component.get_property("DTSTART") else {
            tracing::trace!("DTSTART property not found");
            return Ok(None);
        };
        let dtstart = match TimeValue::from_property(dtstart_prop, resolver) {
            Ok(value) => value,
            Err(ServiceError::RfcError(err)) => {
                return Err(ServiceError::RuleError(err.to_string()));
            }
            Err(err) => {
                tracing::debug!(error = %err, "DTSTART not usable for expansion");
                return Ok(None);
            }
        };

        let frame = match &dtstart {
            TimeValue::Date(_) => Frame::Date,
            TimeValue::Floating(_) => Frame::Floating,
            TimeValue::Absolute { zone, .. } => Frame::Absolute { zone: zone.clone() },
        };
        let rule_tz = rule_zone(&frame, resolver)?;
        let dt_start = to_rule_time(&dtstart, rule_tz)
            .ok_or_else(|| ServiceError::RuleError(format!("DTSTART {dtstart} out of range")))?;

        let rrule_props = component.get_properties("RRULE");
        if rrule_props.len() > 1 {
            tracing::warn!(count = rrule_props.len(), "Multiple RRULE properties, using the first");
        }
        let rdates = collect_dates(component, "RDATE", &dtstart, rule_tz, resolver);
        let exdates = collect_dates(component, "EXDATE", &dtstart, rule_tz, resolver);

        let (set, recurring) = if let Some(rrule_prop) = rrule_props.first() {
            let rrule_text = pin_until(&rule_text(rrule_prop)?, &frame, resolver)?;
            tracing::trace!(rrule = %rrule_text, "Found RRULE");
            let rrule = rrule_text
                .parse::<RRule<Unvalidated>>()
                .map_err(|err| ServiceError::RuleError(err.to_string()))?;
            let set = rrule
                .build(dt_start)
                .map_err(|err| ServiceError::RuleError(err.to_string()))?;
            if rdates.is_empty() {
                (set, true)
            } else {
                (set.set_rdates(rdates), true)
            }
        } else {
            let recurring = !rdates.is_empty();
            let mut dates = Vec::with_capacity(rdates.len() + 1);
            dates.push(dt_start);
            dates.extend(rdates);
            (RRuleSet::new(dt_start).set_rdates(dates), recurring)
        };

        let set = if exdates.is_empty() {
            set
        } else {
            set.set_exdates(exdates)
        };

        Ok(Some(Self {
            dtstart,
            frame,
            set,
            recurring,
        }))
    }

    /// The series start.
    #[must_use]
    pub const fn dtstart(&self) -> &TimeValue {
        &self.dtstart
    }

    /// Whether the set describes more than the single DTSTART occurrence.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.recurring
    }

    /// ## Summary
    /// Lazily yields occurrence starts in ascending order.
    ///
    /// Unbounded rules yield an unbounded sequence; callers bound it.
    pub fn occurrences(&self) -> impl Iterator<Item = TimeValue> + '_ {
        (&self.set)
            .into_iter()
            .map(move |dt| from_rule_time(&dt, &self.frame))
    }
}

fn rule_text(prop: &Property) -> ServiceResult<String> {
    match &prop.value {
        Value::Recur(text) | Value::Text(text) | Value::Unknown(text) => Ok(text.clone()),
        other => Err(ServiceError::RuleError(format!(
            "RRULE has unexpected value: {other:?}"
        ))),
    }
}

/// ## Summary
/// Rewrites a zone-less UNTIL as a UTC instant in the expansion frame.
///
/// Floating and DATE series read UNTIL on the same stand-in clock as their
/// DTSTART; zoned series read it as wall-clock time in the DTSTART zone. A
/// DATE bound covers the whole day.
///
/// ## Errors
/// Returns [`ServiceError::RuleError`] if UNTIL is not a DATE or DATE-TIME,
/// or its zone cannot be resolved.
fn pin_until(
    rule: &str,
    frame: &Frame,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<String> {
    let mut parts = Vec::new();
    for part in rule.split(';') {
        let Some((key, until)) = part.split_once('=') else {
            parts.push(part.to_string());
            continue;
        };
        if !key.eq_ignore_ascii_case("UNTIL") || until.ends_with(['Z', 'z']) {
            parts.push(part.to_string());
            continue;
        }

        let local = if until.len() == 8 {
            NaiveDate::parse_from_str(until, "%Y%m%d")
                .ok()
                .and_then(|date| date.and_hms_opt(23, 59, 59))
        } else {
            NaiveDateTime::parse_from_str(until, "%Y%m%dT%H%M%S").ok()
        }
        .ok_or_else(|| ServiceError::RuleError(format!("UNTIL {until} is malformed")))?;

        let instant = match frame {
            Frame::Absolute { zone: Some(tzid) } => resolver
                .localize(local, tzid, GapPolicy::ShiftForward)
                .map_err(|err| ServiceError::RuleError(err.to_string()))?,
            _ => local.and_utc(),
        };
        tracing::trace!(until, pinned = %instant, "UNTIL moved into the expansion frame");
        parts.push(format!("{key}={}", instant.format("%Y%m%dT%H%M%SZ")));
    }
    Ok(parts.join(";"))
}

fn rule_zone(frame: &Frame, resolver: &mut TimeZoneResolver) -> ServiceResult<Tz> {
    match frame {
        Frame::Absolute { zone: Some(tzid) } => resolver
            .resolve(tzid)
            .map(Tz::Tz)
            .map_err(|err| ServiceError::RuleError(err.to_string())),
        _ => Ok(Tz::UTC),
    }
}

fn to_rule_time(value: &TimeValue, rule_tz: Tz) -> Option<DateTime<Tz>> {
    match value {
        TimeValue::Absolute { instant, .. } => Some(instant.with_timezone(&rule_tz)),
        _ => Some(value.floating_reading()?.and_utc().with_timezone(&Tz::UTC)),
    }
}

fn from_rule_time(dt: &DateTime<Tz>, frame: &Frame) -> TimeValue {
    let instant: DateTime<Utc> = dt.with_timezone(&Utc);
    match frame {
        Frame::Date => TimeValue::Date(instant.date_naive()),
        Frame::Floating => TimeValue::Floating(instant.naive_utc()),
        Frame::Absolute { zone } => TimeValue::Absolute {
            instant,
            zone: zone.clone(),
        },
    }
}

/// Collects RDATE/EXDATE values that share the DTSTART kind.
fn collect_dates(
    component: &Component,
    name: &str,
    dtstart: &TimeValue,
    rule_tz: Tz,
    resolver: &mut TimeZoneResolver,
) -> Vec<DateTime<Tz>> {
    let mut out = Vec::new();
    for prop in component.get_properties(name) {
        for item in prop.value.as_list() {
            let value = match item {
                Value::Date(d) => TimeValue::Date(*d),
                Value::DateTime(dt) => match TimeValue::from_ical(dt, resolver) {
                    Ok(value) => value,
                    Err(err) => {
                        tracing::warn!(property = name, error = %err, "Skipping unresolvable date");
                        continue;
                    }
                },
                other => {
                    tracing::warn!(property = name, value = ?other, "Skipping non-date value");
                    continue;
                }
            };

            // A DATE entry in a date-time series removes/adds that day at the DTSTART time
            let value = match (&value, dtstart) {
                (TimeValue::Date(d), TimeValue::Floating(start)) => {
                    TimeValue::Floating(d.and_time(start.time()))
                }
                _ => value,
            };

            if value.is_floating() != dtstart.is_floating() {
                tracing::warn!(property = name, %value, "Skipping date of different kind than DTSTART");
                continue;
            }
            if let Some(dt) = to_rule_time(&value, rule_tz) {
                out.push(dt);
            }
        }
    }
    out
}
