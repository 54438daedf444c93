//! JSON series documents.
//!
//! A document carries one master, its modifications and the VTIMEZONE
//! definitions they reference. Components are written as a name with a list
//! of properties and nested components; property values use iCalendar text
//! form.
//!
//! ```json
//! {
//!   "master": {
//!     "uid": "standup",
//!     "modified": 1000,
//!     "name": "VEVENT",
//!     "properties": [
//!       { "name": "DTSTART", "params": { "TZID": "America/Chicago" }, "value": "20060102T140000" },
//!       { "name": "RRULE", "value": "FREQ=DAILY;COUNT=5" }
//!     ]
//!   },
//!   "modifications": [],
//!   "timezones": []
//! }
//! ```

use std::collections::BTreeMap;

use cadence_core::error::CoreError;
use cadence_rfc::error::RfcError;
use cadence_rfc::rfc::ical::core::{Component, Parameter, Property};
use cadence_rfc::rfc::ical::parse::parse_property;
use cadence_service::caldav::item::RecurringItem;
use serde::Deserialize;

use crate::error::AppResult;

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesDocument {
    pub master: ItemDocument,
    #[serde(default)]
    pub modifications: Vec<ItemDocument>,
    #[serde(default)]
    pub timezones: Vec<ComponentDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDocument {
    /// Item identity; defaults to the component's UID, minted when absent.
    #[serde(default)]
    pub uid: Option<String>,
    /// Last-modified timestamp in epoch milliseconds.
    #[serde(default)]
    pub modified: Option<i64>,
    #[serde(flatten)]
    pub component: ComponentDocument,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDocument {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDocument>,
    #[serde(default)]
    pub components: Vec<ComponentDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDocument {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    pub value: String,
}

/// A master with its modifications attached, plus timezone definitions.
#[derive(Debug, Clone)]
pub struct Series {
    pub master: RecurringItem,
    pub timezones: Vec<Component>,
}

impl PropertyDocument {
    /// ## Summary
    /// Parses the property value according to its name and VALUE parameter.
    ///
    /// ## Errors
    /// Returns an error if the value does not parse as its type.
    pub fn to_property(&self) -> AppResult<Property> {
        let params = self
            .params
            .iter()
            .map(|(name, value)| Parameter::new(name.as_str(), value.as_str()))
            .collect();
        Ok(parse_property(self.name.as_str(), params, self.value.as_str()).map_err(RfcError::from)?)
    }
}

impl ComponentDocument {
    /// ## Summary
    /// Builds the component tree.
    ///
    /// ## Errors
    /// Returns an error if any property value fails to parse.
    pub fn to_component(&self) -> AppResult<Component> {
        let mut component = Component::named(self.name.as_str());
        for prop in &self.properties {
            component.add_property(prop.to_property()?);
        }
        for child in &self.components {
            component.add_child(child.to_component()?);
        }
        Ok(component)
    }
}

impl SeriesDocument {
    /// ## Summary
    /// Assembles the master and attaches every modification to it.
    ///
    /// Modifications without a usable RECURRENCE-ID or belonging to another
    /// master are logged and skipped. A later modification for the same
    /// recurrence identifier replaces an earlier one.
    ///
    /// ## Errors
    /// Returns an error if a property value fails to parse or the master is
    /// not a VEVENT, VTODO or VJOURNAL.
    #[tracing::instrument(skip_all, fields(modifications = self.modifications.len()))]
    pub fn into_series(self) -> AppResult<Series> {
        let content = self.master.component.to_component()?;
        if !content.kind.is_calendar_item() {
            return Err(CoreError::InvalidInput(format!(
                "master must be a calendar item, found {}",
                content.name
            ))
            .into());
        }
        let uid = self
            .master
            .uid
            .or_else(|| content.uid().map(str::to_string));
        let mut master = RecurringItem::master(uid, content);
        if let Some(modified) = self.master.modified {
            master.touch(modified);
        }
        let master_uid = master.ensure_uid().to_string();

        for doc in self.modifications {
            let content = doc.component.to_component()?;
            let mut item = match RecurringItem::modification(doc.uid, content, master_uid.as_str()) {
                Ok(item) => item,
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping malformed modification");
                    continue;
                }
            };
            if let Some(modified) = doc.modified {
                item.touch(modified);
            }
            item.ensure_uid();

            match master.add_modification(item) {
                Ok(Some(displaced)) => {
                    tracing::warn!(uid = ?displaced.uid(), "Modification replaced by a later one");
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(error = %err, "Skipping modification"),
            }
        }

        let timezones = self
            .timezones
            .iter()
            .map(ComponentDocument::to_component)
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(
            uid = %master_uid,
            modifications = master.get_modifications().len(),
            timezones = timezones.len(),
            "Series loaded"
        );
        Ok(Series { master, timezones })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "master": {
            "modified": 1000,
            "name": "VEVENT",
            "properties": [
                { "name": "UID", "value": "standup" },
                { "name": "DTSTART", "params": { "tzid": "America/Chicago" }, "value": "20060102T140000" },
                { "name": "DURATION", "value": "PT1H" },
                { "name": "RRULE", "value": "FREQ=DAILY;COUNT=5" }
            ],
            "components": [
                { "name": "VALARM", "properties": [{ "name": "ACTION", "value": "DISPLAY" }] }
            ]
        },
        "modifications": [
            {
                "uid": "standup-4",
                "modified": 2000,
                "name": "VEVENT",
                "properties": [
                    { "name": "UID", "value": "standup" },
                    { "name": "RECURRENCE-ID", "params": { "TZID": "America/Chicago" }, "value": "20060104T140000" },
                    { "name": "DTSTART", "params": { "TZID": "America/Chicago" }, "value": "20060104T160000" }
                ]
            },
            {
                "name": "VEVENT",
                "properties": [{ "name": "SUMMARY", "value": "no recurrence id" }]
            }
        ],
        "timezones": [
            {
                "name": "VTIMEZONE",
                "properties": [{ "name": "TZID", "value": "America/Chicago" }]
            }
        ]
    }"#;

    #[test_log::test]
    fn loads_series_document() {
        let document: SeriesDocument = serde_json::from_str(DOCUMENT).unwrap();
        let series = document.into_series().unwrap();

        assert_eq!(series.master.uid(), Some("standup"));
        assert_eq!(series.master.modified(), Some(1000));
        assert_eq!(series.master.content().alarms().len(), 1);
        assert_eq!(series.master.get_modifications().len(), 1);
        assert_eq!(series.timezones.len(), 1);
        assert_eq!(
            series.master.index().unwrap().start().to_string(),
            "20060102T200000Z"
        );
        assert_eq!(
            series.master.content().get_property("DTSTART").unwrap().get_param_value("TZID"),
            Some("America/Chicago")
        );
    }

    #[test]
    fn mints_master_uid_when_absent() {
        let document: SeriesDocument = serde_json::from_str(
            r#"{ "master": { "name": "VEVENT", "properties": [
                { "name": "DTSTART", "value": "20060101" }
            ] } }"#,
        )
        .unwrap();
        let series = document.into_series().unwrap();
        assert_eq!(series.master.uid().map(str::len), Some(36));
    }

    #[test]
    fn rejects_timezone_master() {
        let document: SeriesDocument = serde_json::from_str(
            r#"{ "master": { "name": "VTIMEZONE", "properties": [
                { "name": "TZID", "value": "America/Chicago" }
            ] } }"#,
        )
        .unwrap();
        assert!(document.into_series().is_err());
    }

    #[test]
    fn bad_value_fails() {
        let document: SeriesDocument = serde_json::from_str(
            r#"{ "master": { "name": "VEVENT", "properties": [
                { "name": "DTSTART", "value": "not a date" }
            ] } }"#,
        )
        .unwrap();
        assert!(document.into_series().is_err());
    }
}
