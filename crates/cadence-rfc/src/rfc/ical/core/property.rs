//! Properties: a name, parameters, a typed value and the text it came from.

use chrono::NaiveDate;

use super::{DateTime, Duration, Parameter, Value};

/// A property as received, with its value already typed.
///
/// `raw_value` keeps the text the value was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Upper-cased name.
    pub name: String,
    pub params: Vec<Parameter>,
    pub value: Value,
    pub raw_value: String,
}

impl Property {
    fn typed(name: impl Into<String>, value: Value, raw_value: String) -> Self {
        let mut name = name.into();
        name.make_ascii_uppercase();
        Self {
            name,
            params: Vec::new(),
            value,
            raw_value,
        }
    }

    #[must_use]
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::typed(name, Value::Text(text.clone()), text)
    }

    /// ## Summary
    /// A DATE-TIME property. Zoned values get a TZID parameter.
    #[must_use]
    pub fn datetime(name: impl Into<String>, dt: DateTime) -> Self {
        let tzid = dt.tzid().map(Parameter::tzid);
        let raw = dt.to_string();
        let mut prop = Self::typed(name, Value::DateTime(dt), raw);
        prop.params.extend(tzid);
        prop
    }

    /// A DATE property, marked `VALUE=DATE`.
    #[must_use]
    pub fn date(name: impl Into<String>, date: NaiveDate) -> Self {
        let raw = date.format("%Y%m%d").to_string();
        Self::typed(name, Value::Date(date), raw).with_param(Parameter::value_type("DATE"))
    }

    #[must_use]
    pub fn duration(name: impl Into<String>, duration: Duration) -> Self {
        let raw = duration.to_string();
        Self::typed(name, Value::Duration(duration), raw)
    }

    #[must_use]
    pub fn recur(name: impl Into<String>, rule: impl Into<String>) -> Self {
        let rule = rule.into();
        Self::typed(name, Value::Recur(rule.clone()), rule)
    }

    /// Looks up a parameter, ignoring case.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.params
            .iter()
            .find(|param| param.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name).and_then(Parameter::value)
    }

    /// Adds `param`, dropping any parameter it replaces.
    #[must_use]
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.remove_param(&param.name);
        self.params.push(param);
        self
    }

    pub fn remove_param(&mut self, name: &str) {
        self.params
            .retain(|param| !param.name.eq_ignore_ascii_case(name));
    }

    /// Whether this is a `RANGE=THISANDFUTURE` recurrence identifier.
    #[must_use]
    pub fn is_this_and_future(&self) -> bool {
        self.get_param("RANGE")
            .is_some_and(|range| range.has_value("THISANDFUTURE"))
    }

    /// ## Summary
    /// The same property with an empty value and its parameters intact.
    #[must_use]
    pub fn without_value(&self) -> Self {
        Self {
            params: self.params.clone(),
            ..Self::text(self.name.clone(), String::new())
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime> {
        self.value.as_datetime()
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<&NaiveDate> {
        self.value.as_date()
    }

    #[must_use]
    pub const fn as_duration(&self) -> Option<&Duration> {
        self.value.as_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_upper_cased() {
        let prop = Property::text("summary", "Standup");
        assert_eq!(prop.name, "SUMMARY");
        assert_eq!(prop.as_text(), Some("Standup"));
    }

    #[test]
    fn zoned_datetime_carries_tzid() {
        let local = NaiveDate::from_ymd_opt(2006, 1, 2)
            .and_then(|d| d.and_hms_opt(14, 0, 0))
            .unwrap();
        let prop = Property::datetime("DTSTART", DateTime::zoned(local, "America/Chicago"));
        assert_eq!(prop.get_param_value("tzid"), Some("America/Chicago"));
        assert_eq!(prop.raw_value, "20060102T140000");
    }

    #[test]
    fn date_is_marked() {
        let prop = Property::date("DTSTART", NaiveDate::from_ymd_opt(2007, 1, 1).unwrap());
        assert_eq!(prop.get_param_value("VALUE"), Some("DATE"));
        assert_eq!(prop.raw_value, "20070101");
    }

    #[test]
    fn range_parameter() {
        let mut rid = Property::text("RECURRENCE-ID", "20060106T090000")
            .with_param(Parameter::this_and_future());
        assert!(rid.is_this_and_future());
        rid.remove_param("range");
        assert!(!rid.is_this_and_future());
        assert!(rid.params.is_empty());
    }

    #[test]
    fn with_param_replaces() {
        let prop = Property::text("DTSTART", "20060102T140000")
            .with_param(Parameter::tzid("America/Chicago"))
            .with_param(Parameter::tzid("America/New_York"));
        assert_eq!(prop.params.len(), 1);
        assert_eq!(prop.get_param_value("TZID"), Some("America/New_York"));
    }

    #[test]
    fn without_value_keeps_params() {
        let bare = Property::text("DTSTART", "20060102T140000")
            .with_param(Parameter::tzid("America/Chicago"))
            .without_value();
        assert_eq!(bare.name, "DTSTART");
        assert_eq!(bare.raw_value, "");
        assert_eq!(bare.get_param_value("TZID"), Some("America/Chicago"));
    }
}
