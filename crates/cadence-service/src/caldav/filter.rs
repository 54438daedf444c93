//! Output restriction of limited series (RFC 4791 §9.6 style selection).

use std::borrow::Cow;

use cadence_core::config::OutputConfig;
use cadence_rfc::rfc::ical::core::{Component, ICalendar, Property};

use super::limit::LimitedSet;

/// A selected property, optionally with its value suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySelection {
    /// Property name, compared case-insensitively.
    pub name: String,
    /// Emit the property with an empty value.
    pub novalue: bool,
}

/// Which properties and sub-components of a component are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSelection {
    /// Component name, compared case-insensitively.
    pub name: String,
    /// Emit every property.
    pub all_props: bool,
    /// Properties emitted when `all_props` is unset.
    pub props: Vec<PropertySelection>,
    /// Emit every sub-component in full.
    pub all_comps: bool,
    /// Sub-components emitted when `all_comps` is unset.
    pub comps: Vec<ComponentSelection>,
}

impl ComponentSelection {
    /// Selects the component with no properties and no sub-components.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            all_props: false,
            props: Vec::new(),
            all_comps: false,
            comps: Vec::new(),
        }
    }

    /// Selects the component in full.
    #[must_use]
    pub fn all(name: impl Into<String>) -> Self {
        Self::new(name).with_all_props().with_all_comps()
    }

    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>) -> Self {
        self.props.push(PropertySelection {
            name: name.into(),
            novalue: false,
        });
        self
    }

    /// Selects a property by name only; its value is emitted empty.
    #[must_use]
    pub fn with_prop_novalue(mut self, name: impl Into<String>) -> Self {
        self.props.push(PropertySelection {
            name: name.into(),
            novalue: true,
        });
        self
    }

    #[must_use]
    pub fn with_comp(mut self, comp: ComponentSelection) -> Self {
        self.comps.push(comp);
        self
    }

    #[must_use]
    pub const fn with_all_props(mut self) -> Self {
        self.all_props = true;
        self
    }

    #[must_use]
    pub const fn with_all_comps(mut self) -> Self {
        self.all_comps = true;
        self
    }

    /// ## Summary
    /// Returns the selection for a sub-component named `name`, if it is
    /// selected at all.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Cow<'_, ComponentSelection>> {
        if self.all_comps {
            return Some(Cow::Owned(Self::all(name)));
        }
        self.comps
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(Cow::Borrowed)
    }

    /// ## Summary
    /// Restricts `component` to this selection, recursing into selected
    /// sub-components.
    #[must_use]
    pub fn apply(&self, component: &Component) -> Component {
        let properties = component
            .properties
            .iter()
            .filter_map(|prop| self.select_property(prop))
            .collect();
        let children = component
            .children
            .iter()
            .filter_map(|child| self.child(&child.name).map(|sel| sel.apply(child)))
            .collect();
        Component {
            kind: component.kind,
            name: component.name.clone(),
            properties,
            children,
        }
    }

    fn select_property(&self, prop: &Property) -> Option<Property> {
        if self.all_props {
            return Some(prop.clone());
        }
        let selected = self
            .props
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(&prop.name))?;
        if selected.novalue {
            Some(prop.without_value())
        } else {
            Some(prop.clone())
        }
    }
}

/// Emits limited series as a single VCALENDAR.
#[derive(Debug, Clone)]
pub struct OutputFilter {
    prodid: String,
    selection: ComponentSelection,
    timezones: Vec<Component>,
}

impl OutputFilter {
    /// Creates a filter emitting everything under `prodid`.
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        Self {
            prodid: prodid.into(),
            selection: ComponentSelection::all("VCALENDAR"),
            timezones: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.prodid.clone())
    }

    /// Restricts output to `selection`, rooted at VCALENDAR.
    #[must_use]
    pub fn with_selection(mut self, selection: ComponentSelection) -> Self {
        self.selection = selection;
        self
    }

    /// ## Summary
    /// Registers VTIMEZONE definitions that occurrences may reference.
    ///
    /// Components without a TZID are ignored.
    #[must_use]
    pub fn with_timezones(mut self, timezones: impl IntoIterator<Item = Component>) -> Self {
        self.timezones
            .extend(timezones.into_iter().filter(|tz| tz.tzid().is_some()));
        self
    }

    /// ## Summary
    /// Builds the output calendar for `set`.
    ///
    /// VERSION and PRODID are always present. Each VTIMEZONE referenced by
    /// a surviving occurrence is emitted once when VTIMEZONE is selected;
    /// occurrences follow in recurrence order, each restricted by the
    /// selection for its component name.
    #[tracing::instrument(skip_all, fields(occurrences = set.len()))]
    #[must_use]
    pub fn filter(&self, set: &LimitedSet) -> ICalendar {
        let mut calendar = ICalendar::new(self.prodid.clone());

        if let Some(selection) = self.selection.child("VTIMEZONE") {
            for tzid in set.referenced_tzids() {
                match self.timezones.iter().find(|tz| tz.tzid() == Some(tzid)) {
                    Some(timezone) => calendar.add_component(selection.apply(timezone)),
                    None => tracing::trace!(tzid, "No VTIMEZONE definition for referenced zone"),
                }
            }
        }

        for occurrence in set {
            let component = occurrence.component();
            match self.selection.child(&component.name) {
                Some(selection) => calendar.add_component(selection.apply(component)),
                None => tracing::trace!(name = %component.name, "Component not selected"),
            }
        }

        tracing::debug!(components = calendar.root.children.len(), "Built output calendar");
        calendar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caldav::item::RecurringItem;
    use crate::caldav::limit::{QueryWindow, RecurrenceSetLimiter};
    use crate::caldav::time::TimeValue;
    use cadence_rfc::rfc::ical::build::serialize;
    use cadence_rfc::rfc::ical::core::{Duration, Parameter};
    use cadence_rfc::rfc::ical::parse::parse_property;

    fn chicago_timezone() -> Component {
        Component::timezone()
            .with_property(Property::text("TZID", "America/Chicago"))
            .with_child(
                Component::named("STANDARD")
                    .with_property(parse_property("DTSTART", vec![], "19701101T020000").unwrap())
                    .with_property(Property::text("TZOFFSETFROM", "-0500"))
                    .with_property(Property::text("TZOFFSETTO", "-0600")),
            )
    }

    fn series() -> RecurringItem {
        let content = Component::event()
            .with_property(Property::text("UID", "weekly"))
            .with_property(Property::text("SUMMARY", "review"))
            .with_property(Property::text("DESCRIPTION", "bring notes"))
            .with_property(
                parse_property(
                    "DTSTART",
                    vec![Parameter::tzid("America/Chicago")],
                    "20060102T140000",
                )
                .unwrap(),
            )
            .with_property(Property::duration("DURATION", Duration::hours(1)))
            .with_property(Property::recur("RRULE", "FREQ=DAILY;COUNT=3"))
            .with_child(
                Component::alarm()
                    .with_property(Property::text("ACTION", "DISPLAY"))
                    .with_property(Property::text("DESCRIPTION", "soon")),
            );
        RecurringItem::master(Some("weekly".to_string()), content)
    }

    fn limited() -> LimitedSet {
        let start = parse_property("DTSTART", vec![], "20060101T000000Z").unwrap();
        let end = parse_property("DTEND", vec![], "20060110T000000Z").unwrap();
        let mut resolver = cadence_rfc::rfc::ical::expand::TimeZoneResolver::new();
        let window = QueryWindow::new(
            TimeValue::from_property(&start, &mut resolver).unwrap(),
            TimeValue::from_property(&end, &mut resolver).unwrap(),
        )
        .unwrap();
        RecurrenceSetLimiter::new(100)
            .limit(&series(), &window)
            .unwrap()
    }

    #[test]
    fn full_selection_emits_everything_and_one_timezone() {
        let filter = OutputFilter::new("-//test//EN").with_timezones([chicago_timezone()]);
        let calendar = filter.filter(&limited());

        assert_eq!(calendar.prodid(), Some("-//test//EN"));
        assert_eq!(calendar.version(), Some("2.0"));
        assert_eq!(calendar.timezones().len(), 1);
        assert_eq!(calendar.events().len(), 3);
        assert_eq!(calendar.events()[0].alarms().len(), 1);

        let text = serialize(&calendar);
        assert_eq!(text.matches("BEGIN:VTIMEZONE").count(), 1);
    }

    #[test]
    fn explicit_properties_only() {
        let selection = ComponentSelection::new("VCALENDAR").with_comp(
            ComponentSelection::new("VEVENT")
                .with_prop("SUMMARY")
                .with_prop("dtstart"),
        );
        let calendar = OutputFilter::new("-//test//EN")
            .with_selection(selection)
            .with_timezones([chicago_timezone()])
            .filter(&limited());

        assert!(calendar.timezones().is_empty());
        let event = calendar.events()[0];
        let names: Vec<&str> = event.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["SUMMARY", "DTSTART"]);
        assert!(event.alarms().is_empty());
        assert_eq!(calendar.version(), Some("2.0"));
    }

    #[test]
    fn novalue_keeps_name_and_parameters() {
        let selection = ComponentSelection::new("VCALENDAR").with_comp(
            ComponentSelection::new("VEVENT")
                .with_prop_novalue("DESCRIPTION")
                .with_prop_novalue("DTSTART"),
        );
        let calendar = OutputFilter::new("-//test//EN")
            .with_selection(selection)
            .filter(&limited());

        let event = calendar.events()[0];
        let description = event.get_property("DESCRIPTION").unwrap();
        assert_eq!(description.raw_value, "");
        let dtstart = event.get_property("DTSTART").unwrap();
        assert_eq!(dtstart.raw_value, "");
        assert_eq!(dtstart.get_param_value("TZID"), Some("America/Chicago"));
    }

    #[test]
    fn explicit_sub_components() {
        let selection = ComponentSelection::new("VCALENDAR")
            .with_comp(ComponentSelection::all("VTIMEZONE"))
            .with_comp(
                ComponentSelection::new("VEVENT")
                    .with_prop("UID")
                    .with_comp(ComponentSelection::new("VALARM").with_prop("ACTION")),
            );
        let calendar = OutputFilter::new("-//test//EN")
            .with_selection(selection)
            .with_timezones([chicago_timezone()])
            .filter(&limited());

        assert_eq!(calendar.timezones().len(), 1);
        assert_eq!(calendar.timezones()[0].children.len(), 1);
        let alarm = calendar.events()[0].alarms()[0];
        assert_eq!(alarm.properties.len(), 1);
        assert_eq!(alarm.properties[0].name, "ACTION");
    }

    #[test]
    fn unreferenced_timezones_are_not_emitted() {
        let berlin = Component::timezone().with_property(Property::text("TZID", "Europe/Berlin"));
        let calendar = OutputFilter::new("-//test//EN")
            .with_timezones([berlin, Component::timezone()])
            .filter(&limited());
        assert!(calendar.timezones().is_empty());
    }

    #[test]
    fn empty_set_still_has_calendar_properties() {
        let calendar = OutputFilter::from_config(&OutputConfig::default())
            .filter(&LimitedSet::default());
        assert!(calendar.root.children.is_empty());
        assert_eq!(
            calendar.prodid(),
            Some(cadence_core::constants::DEFAULT_PRODID)
        );
    }
}
