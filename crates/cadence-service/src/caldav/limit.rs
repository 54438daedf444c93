//! Limiting a recurring series to a query window.
//!
//! A single pass expands the master's occurrences inside the window, merges
//! the modifications over them, drops anything whose effective start falls
//! outside the window and hands back the survivors in recurrence order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use cadence_core::config::LimiterConfig;
use cadence_rfc::rfc::ical::core::Component;
use cadence_rfc::rfc::ical::expand::TimeZoneResolver;
use chrono::TimeDelta;
use chrono_tz::Tz;

use super::index::TimeRangeIndex;
use super::item::{ModificationState, RecurringItem};
use super::recurrence::RecurrenceRule;
use super::time::{RecurrenceKey, TimeContext, TimeValue};
use crate::error::{ServiceError, ServiceResult};

/// Properties describing the series rather than a single occurrence.
const SERIES_PROPERTIES: [&str; 4] = ["RRULE", "RDATE", "EXDATE", "EXRULE"];

/// Properties re-based on an occurrence's start.
const END_PROPERTIES: [&str; 2] = ["DTEND", "DUE"];

/// Half-open `[start, end)` query window.
#[derive(Debug, Clone)]
pub struct QueryWindow {
    start: TimeValue,
    end: TimeValue,
}

impl QueryWindow {
    /// ## Summary
    /// Creates a window from its bounds.
    ///
    /// ## Errors
    /// Returns [`ServiceError::InvalidWindow`] if one bound is floating and
    /// the other absolute, or if `end` precedes `start`.
    pub fn new(start: TimeValue, end: TimeValue) -> ServiceResult<Self> {
        if start.is_floating() != end.is_floating() {
            return Err(ServiceError::InvalidWindow(format!(
                "{start}/{end} mixes floating and absolute bounds"
            )));
        }
        if end < start {
            return Err(ServiceError::InvalidWindow(format!(
                "{end} precedes {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> &TimeValue {
        &self.start
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> &TimeValue {
        &self.end
    }

    /// Whether both bounds are floating.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        self.start.is_floating()
    }

    /// ## Summary
    /// Returns whether `value` lies in `[start, end)`.
    ///
    /// ## Errors
    /// Returns [`ServiceError::AmbiguousComparison`] if `value` and the window
    /// differ in kind and `context` has no floating zone.
    pub fn contains(&self, value: &TimeValue, context: TimeContext) -> ServiceResult<bool> {
        Ok(context.compare(value, &self.start)? != Ordering::Less
            && context.compare(value, &self.end)? == Ordering::Less)
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Where an occurrence's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceSource {
    /// Computed from the master's rule.
    Master,
    /// A modification overriding exactly this occurrence.
    Override,
    /// A this-and-future modification anchored at or before this occurrence.
    ThisAndFuture,
}

/// One visible occurrence of a limited series.
#[derive(Debug, Clone)]
pub struct Occurrence {
    recurrence_id: TimeValue,
    start: TimeValue,
    component: Component,
    source: OccurrenceSource,
}

impl Occurrence {
    /// Identifier of the occurrence within its series.
    #[must_use]
    pub const fn recurrence_id(&self) -> &TimeValue {
        &self.recurrence_id
    }

    /// Effective start used for window filtering.
    #[must_use]
    pub const fn start(&self) -> &TimeValue {
        &self.start
    }

    /// The occurrence's component.
    #[must_use]
    pub const fn component(&self) -> &Component {
        &self.component
    }

    /// Where the content came from.
    #[must_use]
    pub const fn source(&self) -> OccurrenceSource {
        self.source
    }

    /// Time-range index of the occurrence's component.
    #[must_use]
    pub fn index(&self) -> Option<TimeRangeIndex> {
        TimeRangeIndex::from_component(&self.component, &mut TimeZoneResolver::new())
    }
}

/// Occurrences of a series visible in a window, in recurrence order.
#[derive(Debug, Clone, Default)]
pub struct LimitedSet {
    occurrences: Vec<Occurrence>,
}

impl LimitedSet {
    /// The surviving occurrences.
    #[must_use]
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Number of occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    /// Whether no occurrence survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Iterates occurrences in recurrence order.
    pub fn iter(&self) -> std::slice::Iter<'_, Occurrence> {
        self.occurrences.iter()
    }

    /// ## Summary
    /// Collects the TZIDs referenced by any occurrence, each once, in order
    /// of first appearance.
    #[must_use]
    pub fn referenced_tzids(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for tzid in self
            .occurrences
            .iter()
            .flat_map(|o| o.component.referenced_tzids())
        {
            if !out.contains(&tzid) {
                out.push(tzid);
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a LimitedSet {
    type Item = &'a Occurrence;
    type IntoIter = std::slice::Iter<'a, Occurrence>;

    fn into_iter(self) -> Self::IntoIter {
        self.occurrences.iter()
    }
}

impl IntoIterator for LimitedSet {
    type Item = Occurrence;
    type IntoIter = std::vec::IntoIter<Occurrence>;

    fn into_iter(self) -> Self::IntoIter {
        self.occurrences.into_iter()
    }
}

/// Computes the occurrences of a master visible in a query window.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceSetLimiter {
    max_instances: usize,
    context: TimeContext,
}

impl RecurrenceSetLimiter {
    /// Creates a limiter producing at most `max_instances` rule occurrences
    /// per call, without a floating zone.
    #[must_use]
    pub const fn new(max_instances: usize) -> Self {
        Self {
            max_instances,
            context: TimeContext::new(None),
        }
    }

    /// ## Summary
    /// Creates a limiter from configuration.
    ///
    /// ## Errors
    /// Returns an error if the configured floating zone is unknown.
    pub fn from_config(config: &LimiterConfig) -> ServiceResult<Self> {
        let limiter = Self::new(config.max_instances);
        match &config.floating_zone {
            Some(zone) => {
                let tz = TimeZoneResolver::new().resolve(zone)?;
                Ok(limiter.with_floating_zone(tz))
            }
            None => Ok(limiter),
        }
    }

    /// Reads floating values in `zone` when they meet absolute ones.
    #[must_use]
    pub const fn with_floating_zone(mut self, zone: Tz) -> Self {
        self.context = TimeContext::new(Some(zone));
        self
    }

    /// The comparison policy in use.
    #[must_use]
    pub const fn context(&self) -> TimeContext {
        self.context
    }

    /// ## Summary
    /// Limits `master` and its modifications to `window`.
    ///
    /// A master without a usable DTSTART yields an empty set. Malformed
    /// modifications are logged and left out.
    ///
    /// ## Errors
    /// - [`ServiceError::InvalidOverride`] if `master` is a modification.
    /// - [`ServiceError::AmbiguousComparison`] if the series and the window
    ///   differ in kind and no floating zone is configured.
    /// - [`ServiceError::RuleError`] if the recurrence rule cannot be expanded
    ///   or its DTSTART zone is unknown.
    #[tracing::instrument(skip_all, fields(uid = ?master.uid(), window = %window))]
    pub fn limit(&self, master: &RecurringItem, window: &QueryWindow) -> ServiceResult<LimitedSet> {
        if !master.is_master() {
            return Err(ServiceError::InvalidOverride(
                "only a master can be limited".to_string(),
            ));
        }

        let mut resolver = TimeZoneResolver::new();
        let Some(rule) = RecurrenceRule::from_component(master.content(), &mut resolver)? else {
            return Ok(LimitedSet::default());
        };
        if master.index().is_none() {
            tracing::debug!("Master has no time range, nothing to expand");
            return Ok(LimitedSet::default());
        }
        if !self.context.can_compare(rule.dtstart(), window.start()) {
            return Err(ServiceError::AmbiguousComparison(format!(
                "series starting {} against window {window}",
                rule.dtstart()
            )));
        }

        let mut entries = self.expand(master, &rule, window, &mut resolver)?;
        tracing::trace!(candidates = entries.len(), "Expanded series");
        self.merge_modifications(master, &rule, window, &mut entries, &mut resolver)?;
        let occurrences = self.filter_window(entries, window)?;

        tracing::debug!(count = occurrences.len(), "Limited series");
        Ok(LimitedSet { occurrences })
    }

    fn expand(
        &self,
        master: &RecurringItem,
        rule: &RecurrenceRule,
        window: &QueryWindow,
        resolver: &mut TimeZoneResolver,
    ) -> ServiceResult<BTreeMap<RecurrenceKey, Occurrence>> {
        let duration = master
            .index()
            .and_then(|index| index.end().signed_duration_since(index.start()));

        let mut entries = BTreeMap::new();
        for start in rule.occurrences() {
            if self.context.compare(&start, window.end())? != Ordering::Less {
                break;
            }
            if self.context.compare(&start, window.start())? == Ordering::Less {
                continue;
            }
            if entries.len() >= self.max_instances {
                tracing::warn!(
                    max_instances = self.max_instances,
                    "Instance cap reached, truncating expansion"
                );
                break;
            }

            let component = if rule.is_recurring() {
                master_instance(master.content(), &start, duration, resolver)?
            } else {
                master.content().clone()
            };
            entries.insert(
                start.recurrence_key(),
                Occurrence {
                    recurrence_id: start.clone(),
                    start,
                    component,
                    source: OccurrenceSource::Master,
                },
            );
        }
        Ok(entries)
    }

    fn merge_modifications(
        &self,
        master: &RecurringItem,
        rule: &RecurrenceRule,
        window: &QueryWindow,
        entries: &mut BTreeMap<RecurrenceKey, Occurrence>,
        resolver: &mut TimeZoneResolver,
    ) -> ServiceResult<()> {
        let series_floating = rule.dtstart().is_floating();
        // Ascending by recurrence id, as the modification view is ordered
        let mut tails: Vec<(RecurrenceKey, &RecurringItem, &ModificationState)> = Vec::new();

        for modification in master.get_modifications() {
            let Some(state) = modification.as_modification() else {
                continue;
            };
            let rid = &state.recurrence_id;
            if rid.is_floating() != series_floating {
                tracing::warn!(
                    uid = ?modification.uid(),
                    %rid,
                    "Recurrence identifier kind differs from the series, skipping modification"
                );
                continue;
            }

            let before_end = self.context.compare(rid, window.end())? == Ordering::Less;
            let in_window =
                before_end && self.context.compare(rid, window.start())? != Ordering::Less;

            if state.this_and_future && before_end {
                tails.push((rid.recurrence_key(), modification, state));
            }
            if in_window {
                match override_occurrence(modification, state, resolver) {
                    Ok(occurrence) => {
                        entries.insert(rid.recurrence_key(), occurrence);
                    }
                    Err(err) => tracing::warn!(
                        uid = ?modification.uid(),
                        error = %err,
                        "Skipping malformed modification"
                    ),
                }
            } else if !state.this_and_future {
                tracing::trace!(%rid, "Modification outside window dropped");
            }
        }

        if tails.is_empty() {
            return Ok(());
        }
        for (key, entry) in entries.iter_mut() {
            if entry.source != OccurrenceSource::Master {
                continue;
            }
            let Some((_, tail, state)) = tails.iter().rev().find(|(anchor, ..)| anchor <= key)
            else {
                continue;
            };
            match tail_occurrence(entry.recurrence_id(), tail, state, resolver) {
                Ok(occurrence) => *entry = occurrence,
                Err(err) => tracing::warn!(
                    uid = ?tail.uid(),
                    error = %err,
                    "Skipping malformed this-and-future modification"
                ),
            }
        }
        Ok(())
    }

    fn filter_window(
        &self,
        entries: BTreeMap<RecurrenceKey, Occurrence>,
        window: &QueryWindow,
    ) -> ServiceResult<Vec<Occurrence>> {
        let mut out = Vec::with_capacity(entries.len());
        for occurrence in entries.into_values() {
            match window.contains(&occurrence.start, self.context) {
                Ok(true) => out.push(occurrence),
                Ok(false) => {
                    tracing::trace!(start = %occurrence.start, "Occurrence outside window");
                }
                Err(err) if occurrence.source != OccurrenceSource::Master => {
                    tracing::warn!(
                        rid = %occurrence.recurrence_id,
                        error = %err,
                        "Skipping modification with incomparable start"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(out)
    }
}

impl Default for RecurrenceSetLimiter {
    fn default() -> Self {
        Self::new(cadence_core::constants::DEFAULT_MAX_INSTANCES)
    }
}

/// ## Summary
/// Derives one occurrence of the master at `start`.
///
/// Series properties are dropped, DTSTART moves to `start`, DTEND/DUE keep
/// the master's duration and RECURRENCE-ID is set in the DTSTART form.
fn master_instance(
    content: &Component,
    start: &TimeValue,
    duration: Option<TimeDelta>,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<Component> {
    let mut component = content.clone();
    for name in SERIES_PROPERTIES {
        component.remove_properties(name);
    }
    write_time(&mut component, "DTSTART", start, resolver)?;
    rebase_end(&mut component, start, duration, resolver)?;
    component.set_property(start.to_property("RECURRENCE-ID", resolver)?);
    Ok(component)
}

/// Takes a modification as-is for its own recurrence identifier.
fn override_occurrence(
    modification: &RecurringItem,
    state: &ModificationState,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<Occurrence> {
    let start = match modification.content().get_property("DTSTART") {
        Some(prop) => TimeValue::from_property(prop, resolver)?,
        None => state.recurrence_id.clone(),
    };
    Ok(Occurrence {
        recurrence_id: state.recurrence_id.clone(),
        start,
        component: modification.content().clone(),
        source: OccurrenceSource::Override,
    })
}

/// ## Summary
/// Applies a this-and-future modification to the occurrence `recurrence_id`.
///
/// The start moves by the modification's own offset from its anchor, the
/// end keeps the modification's duration, and RECURRENCE-ID names the
/// occurrence without a RANGE parameter.
fn tail_occurrence(
    recurrence_id: &TimeValue,
    tail: &RecurringItem,
    state: &ModificationState,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<Occurrence> {
    let offset = match tail.content().get_property("DTSTART") {
        Some(prop) => {
            let start = TimeValue::from_property(prop, resolver)?;
            start.signed_duration_since(&state.recurrence_id).ok_or_else(|| {
                ServiceError::InvalidOverride(format!(
                    "DTSTART {start} and RECURRENCE-ID {} differ in kind",
                    state.recurrence_id
                ))
            })?
        }
        None => TimeDelta::zero(),
    };
    let start = recurrence_id.checked_add(offset).ok_or_else(|| {
        ServiceError::InvalidOverride(format!("shifting {recurrence_id} by {offset} overflows"))
    })?;
    let duration = tail
        .index()
        .and_then(|index| index.end().signed_duration_since(index.start()));

    let mut component = tail.content().clone();
    write_time(&mut component, "DTSTART", &start, resolver)?;
    rebase_end(&mut component, &start, duration, resolver)?;
    component.set_property(recurrence_id.to_property("RECURRENCE-ID", resolver)?);

    Ok(Occurrence {
        recurrence_id: recurrence_id.clone(),
        start,
        component,
        source: OccurrenceSource::ThisAndFuture,
    })
}

fn rebase_end(
    component: &mut Component,
    start: &TimeValue,
    duration: Option<TimeDelta>,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<()> {
    let Some(end) = duration.and_then(|d| start.checked_add(d)) else {
        return Ok(());
    };
    for name in END_PROPERTIES {
        if component.get_property(name).is_some() {
            write_time(component, name, &end, resolver)?;
        }
    }
    Ok(())
}

/// Writes `value` into `name`, keeping the zone the property was written in.
fn write_time(
    component: &mut Component,
    name: &str,
    value: &TimeValue,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<()> {
    let zone = match component
        .get_property(name)
        .map(|prop| TimeValue::from_property(prop, resolver))
    {
        Some(Ok(TimeValue::Absolute { zone, .. })) => zone,
        _ => value.zone().map(str::to_string),
    };
    let value = value.clone().in_zone(zone);
    component.set_property(value.to_property(name, resolver)?);
    Ok(())
}
