//! Component tree (RFC 5545 §3.4, §3.6).

use std::fmt;

use super::Property;

/// Names of the components the model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Calendar,
    Event,
    Todo,
    Journal,
    Timezone,
    /// STANDARD observance inside a VTIMEZONE.
    Standard,
    /// DAYLIGHT observance inside a VTIMEZONE.
    Daylight,
    Alarm,
    /// Any other IANA or X- component; the name is kept on the component.
    Other,
}

impl ComponentKind {
    /// Classifies a component name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        const KNOWN: [(&str, ComponentKind); 8] = [
            ("VCALENDAR", ComponentKind::Calendar),
            ("VEVENT", ComponentKind::Event),
            ("VTODO", ComponentKind::Todo),
            ("VJOURNAL", ComponentKind::Journal),
            ("VTIMEZONE", ComponentKind::Timezone),
            ("STANDARD", ComponentKind::Standard),
            ("DAYLIGHT", ComponentKind::Daylight),
            ("VALARM", ComponentKind::Alarm),
        ];
        KNOWN
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map_or(Self::Other, |(_, kind)| *kind)
    }

    /// Canonical name, `None` for [`ComponentKind::Other`].
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::Calendar => Some("VCALENDAR"),
            Self::Event => Some("VEVENT"),
            Self::Todo => Some("VTODO"),
            Self::Journal => Some("VJOURNAL"),
            Self::Timezone => Some("VTIMEZONE"),
            Self::Standard => Some("STANDARD"),
            Self::Daylight => Some("DAYLIGHT"),
            Self::Alarm => Some("VALARM"),
            Self::Other => None,
        }
    }

    /// Whether components of this kind can head a recurring series.
    #[must_use]
    pub const fn is_calendar_item(self) -> bool {
        matches!(self, Self::Event | Self::Todo | Self::Journal)
    }
}

/// A component: ordered properties plus nested components.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Upper-cased name as written.
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Component>,
}

impl Component {
    /// Creates an empty component of a known kind.
    ///
    /// [`ComponentKind::Other`] has no canonical name; use
    /// [`Component::named`] for those.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            name: kind.name().unwrap_or("X-UNKNOWN").to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an empty component from its written name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        let name = name.to_ascii_uppercase();
        Self {
            kind: ComponentKind::from_name(&name),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn calendar() -> Self {
        Self::new(ComponentKind::Calendar)
    }

    #[must_use]
    pub fn event() -> Self {
        Self::new(ComponentKind::Event)
    }

    #[must_use]
    pub fn todo() -> Self {
        Self::new(ComponentKind::Todo)
    }

    #[must_use]
    pub fn timezone() -> Self {
        Self::new(ComponentKind::Timezone)
    }

    #[must_use]
    pub fn alarm() -> Self {
        Self::new(ComponentKind::Alarm)
    }

    /// Appends a property.
    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    #[must_use]
    pub fn with_property(mut self, prop: Property) -> Self {
        self.add_property(prop);
        self
    }

    /// Appends a nested component.
    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    #[must_use]
    pub fn with_child(mut self, child: Component) -> Self {
        self.add_child(child);
        self
    }

    /// ## Summary
    /// Replaces every property named like `prop` with `prop`.
    ///
    /// The replacement takes the position of the first removed property,
    /// or is appended when none existed.
    pub fn set_property(&mut self, prop: Property) {
        match self.properties.iter().position(|p| p.name.eq_ignore_ascii_case(&prop.name)) {
            Some(first) => {
                let mut idx = 0;
                self.properties.retain(|p| {
                    let keep = idx <= first || !p.name.eq_ignore_ascii_case(&prop.name);
                    idx += 1;
                    keep
                });
                self.properties[first] = prop;
            }
            None => self.properties.push(prop),
        }
    }

    /// Removes all properties called `name`, returning how many were dropped.
    pub fn remove_properties(&mut self, name: &str) -> usize {
        let before = self.properties.len();
        self.properties
            .retain(|p| !p.name.eq_ignore_ascii_case(name));
        before - self.properties.len()
    }

    /// First property called `name`.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Every property called `name`, in order.
    #[must_use]
    pub fn get_properties(&self, name: &str) -> Vec<&Property> {
        self.properties
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .collect()
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.get_property("UID")?.as_text()
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.get_property("SUMMARY")?.as_text()
    }

    #[must_use]
    pub fn recurrence_id(&self) -> Option<&Property> {
        self.get_property("RECURRENCE-ID")
    }

    /// TZID defined by a VTIMEZONE.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_property("TZID")?.as_text()
    }

    fn children_of(&self, kind: ComponentKind) -> Vec<&Component> {
        self.children.iter().filter(|c| c.kind == kind).collect()
    }

    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.children_of(ComponentKind::Event)
    }

    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.children_of(ComponentKind::Timezone)
    }

    #[must_use]
    pub fn alarms(&self) -> Vec<&Component> {
        self.children_of(ComponentKind::Alarm)
    }

    /// ## Summary
    /// TZID parameters used anywhere in this component tree, each once, in
    /// order of first use.
    #[must_use]
    pub fn referenced_tzids(&self) -> Vec<&str> {
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(component) = pending.pop() {
            for tzid in component
                .properties
                .iter()
                .filter_map(|p| p.get_param_value("TZID"))
            {
                if !found.contains(&tzid) {
                    found.push(tzid);
                }
            }
            pending.extend(component.children.iter().rev());
        }
        found
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uid() {
            Some(uid) => write!(f, "{} {uid}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A VCALENDAR object.
#[derive(Debug, Clone, PartialEq)]
pub struct ICalendar {
    pub root: Component,
}

impl ICalendar {
    /// Creates a VCALENDAR carrying `VERSION:2.0` and the given PRODID.
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        let root = Component::calendar()
            .with_property(Property::text("VERSION", "2.0"))
            .with_property(Property::text("PRODID", prodid));
        Self { root }
    }

    #[must_use]
    pub fn prodid(&self) -> Option<&str> {
        self.root.get_property("PRODID")?.as_text()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root.get_property("VERSION")?.as_text()
    }

    pub fn add_component(&mut self, component: Component) {
        self.root.add_child(component);
    }

    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.root.events()
    }

    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.root.timezones()
    }

    /// Every child that is not a VTIMEZONE.
    #[must_use]
    pub fn items(&self) -> Vec<&Component> {
        self.root
            .children
            .iter()
            .filter(|c| c.kind != ComponentKind::Timezone)
            .collect()
    }
}

impl Default for ICalendar {
    fn default() -> Self {
        Self::new(cadence_core::constants::DEFAULT_PRODID)
    }
}
