//! Time-range index derived from an item's time-bearing properties.

use std::fmt;

use cadence_rfc::rfc::ical::core::Component;
use cadence_rfc::rfc::ical::expand::TimeZoneResolver;

use super::time::TimeValue;

/// Derived `[start, end)` summary of a component's DTSTART and DTEND/DUE/DURATION.
///
/// Zoned sources are normalized to UTC, zone-less sources stay floating.
/// `start <= end` always holds and `is_floating` is set iff both ends are
/// floating.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRangeIndex {
    start: TimeValue,
    end: TimeValue,
    is_floating: bool,
}

impl TimeRangeIndex {
    /// ## Summary
    /// Builds an index from explicit bounds.
    ///
    /// Returns `None` when the bounds mix floating and absolute values or
    /// when `end` precedes `start`.
    #[must_use]
    pub fn new(start: TimeValue, end: TimeValue) -> Option<Self> {
        if start.is_floating() != end.is_floating() || end < start {
            return None;
        }
        let is_floating = start.is_floating() && end.is_floating();
        Some(Self {
            start,
            end,
            is_floating,
        })
    }

    /// ## Summary
    /// Derives the index of a VEVENT/VTODO/VJOURNAL component.
    ///
    /// The end comes from DTEND, then DUE, then DTSTART + DURATION; with none
    /// of these the end equals the start. Components whose DTSTART is missing
    /// or unresolvable, whose bounds mix kinds, or whose end precedes their
    /// start have no index.
    #[must_use]
    pub fn from_component(component: &Component, resolver: &mut TimeZoneResolver) -> Option<Self> {
        let start_prop = component.get_property("DTSTART")?;
        let start = match TimeValue::from_property(start_prop, resolver) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "DTSTART not usable for index");
                return None;
            }
        };

        let end = if let Some(end_prop) = component
            .get_property("DTEND")
            .or_else(|| component.get_property("DUE"))
        {
            match TimeValue::from_property(end_prop, resolver) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(error = %err, property = %end_prop.name, "End not usable for index");
                    return None;
                }
            }
        } else if let Some(duration) = component
            .get_property("DURATION")
            .and_then(|p| p.as_duration())
        {
            start.checked_add(duration.to_time_delta())?
        } else {
            start.clone()
        };

        let index = Self::new(start, end);
        if index.is_none() {
            tracing::debug!(uid = ?component.uid(), "Inconsistent time range, no index");
        }
        index
    }

    /// Start of the range.
    #[must_use]
    pub const fn start(&self) -> &TimeValue {
        &self.start
    }

    /// End of the range.
    #[must_use]
    pub const fn end(&self) -> &TimeValue {
        &self.end
    }

    /// Whether both bounds are floating.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        self.is_floating
    }
}

impl fmt::Display for TimeRangeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end)?;
        if self.is_floating {
            write!(f, " (floating)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_rfc::rfc::ical::core::{Duration, Property};
    use cadence_rfc::rfc::ical::parse::parse_property;

    fn event_with(props: &[(&str, &str)]) -> Component {
        let mut event = Component::event();
        for (name, value) in props {
            event.add_property(parse_property(*name, Vec::new(), *value).unwrap());
        }
        event
    }

    #[test]
    fn absolute_range() {
        let event = event_with(&[
            ("DTSTART", "20050817T115000Z"),
            ("DTEND", "20050817T131500Z"),
        ]);
        let index = TimeRangeIndex::from_component(&event, &mut TimeZoneResolver::new()).unwrap();

        assert_eq!(index.start().to_string(), "20050817T115000Z");
        assert_eq!(index.end().to_string(), "20050817T131500Z");
        assert!(!index.is_floating());
    }

    #[test]
    fn date_only_start() {
        let event = event_with(&[("DTSTART", "20070101")]);
        let index = TimeRangeIndex::from_component(&event, &mut TimeZoneResolver::new()).unwrap();

        assert_eq!(index.start().to_string(), "20070101");
        assert_eq!(index.end().to_string(), "20070101");
        assert!(index.is_floating());
    }

    #[test]
    fn zoned_start_normalizes_to_utc() {
        let mut event = Component::event();
        event.add_property(
            parse_property(
                "DTSTART",
                vec![cadence_rfc::rfc::ical::core::Parameter::tzid("America/Chicago")],
                "20060102T140000",
            )
            .unwrap(),
        );
        event.add_property(Property::duration("DURATION", Duration::hours(1)));

        let index = TimeRangeIndex::from_component(&event, &mut TimeZoneResolver::new()).unwrap();
        assert_eq!(index.start().to_string(), "20060102T200000Z");
        assert_eq!(index.end().to_string(), "20060102T210000Z");
    }

    #[test]
    fn rejects_inverted_and_mixed_ranges() {
        let inverted = event_with(&[
            ("DTSTART", "20050817T131500Z"),
            ("DTEND", "20050817T115000Z"),
        ]);
        assert!(TimeRangeIndex::from_component(&inverted, &mut TimeZoneResolver::new()).is_none());

        let mixed = event_with(&[("DTSTART", "20050817T115000"), ("DTEND", "20050817T131500Z")]);
        assert!(TimeRangeIndex::from_component(&mixed, &mut TimeZoneResolver::new()).is_none());
    }

    #[test]
    fn missing_start_has_no_index() {
        let event = event_with(&[("SUMMARY", "no time")]);
        assert!(TimeRangeIndex::from_component(&event, &mut TimeZoneResolver::new()).is_none());
    }

    #[test]
    fn due_is_used_for_tasks() {
        let mut todo = Component::todo();
        todo.add_property(parse_property("DTSTART", Vec::new(), "20060101T090000").unwrap());
        todo.add_property(parse_property("DUE", Vec::new(), "20060101T170000").unwrap());

        let index = TimeRangeIndex::from_component(&todo, &mut TimeZoneResolver::new()).unwrap();
        assert!(index.is_floating());
        assert_eq!(index.end().to_string(), "20060101T170000");
    }
}
