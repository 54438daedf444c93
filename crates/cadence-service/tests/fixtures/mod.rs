//! Recurring series fixtures.
//!
//! Each scenario builds a master with its modifications and the VTIMEZONE
//! definitions the series references.

use cadence_rfc::rfc::ical::core::{Component, Duration, ICalendar, Parameter, Property};
use cadence_rfc::rfc::ical::expand::TimeZoneResolver;
use cadence_rfc::rfc::ical::parse::parse_property;
use cadence_service::caldav::item::RecurringItem;
use cadence_service::caldav::limit::QueryWindow;
use cadence_service::caldav::time::TimeValue;

pub const CHICAGO: &str = "America/Chicago";
pub const NEW_YORK: &str = "America/New_York";

pub fn prop(name: &str, value: &str) -> Property {
    parse_property(name, Vec::new(), value).unwrap()
}

pub fn zoned(name: &str, tzid: &str, value: &str) -> Property {
    parse_property(name, vec![Parameter::tzid(tzid)], value).unwrap()
}

pub fn this_and_future(tzid: &str, value: &str) -> Property {
    parse_property(
        "RECURRENCE-ID",
        vec![Parameter::tzid(tzid), Parameter::this_and_future()],
        value,
    )
    .unwrap()
}

fn event(uid: &str, summary: &str, props: Vec<Property>) -> Component {
    let mut event = Component::event()
        .with_property(Property::text("UID", uid))
        .with_property(Property::text("SUMMARY", summary));
    for prop in props {
        event.add_property(prop);
    }
    event
}

pub fn master(uid: &str, props: Vec<Property>) -> RecurringItem {
    RecurringItem::master(Some(uid.to_string()), event(uid, "event", props)).with_modified(1000)
}

pub fn modification(
    master_uid: &str,
    uid: &str,
    summary: &str,
    props: Vec<Property>,
    modified: i64,
) -> RecurringItem {
    RecurringItem::modification(Some(uid.to_string()), event(master_uid, summary, props), master_uid)
        .unwrap()
        .with_modified(modified)
}

pub fn window(start: &str, end: &str) -> QueryWindow {
    let mut resolver = TimeZoneResolver::new();
    QueryWindow::new(
        TimeValue::from_property(&prop("DTSTART", start), &mut resolver).unwrap(),
        TimeValue::from_property(&prop("DTSTART", end), &mut resolver).unwrap(),
    )
    .unwrap()
}

/// Minimal VTIMEZONE with a single STANDARD observance.
pub fn vtimezone(tzid: &str, offset: &str) -> Component {
    Component::timezone()
        .with_property(Property::text("TZID", tzid))
        .with_child(
            Component::named("STANDARD")
                .with_property(prop("DTSTART", "19701101T020000"))
                .with_property(Property::text("TZOFFSETFROM", offset))
                .with_property(Property::text("TZOFFSETTO", offset)),
        )
}

pub fn timezones() -> Vec<Component> {
    vec![vtimezone(CHICAGO, "-0600"), vtimezone(NEW_YORK, "-0500")]
}

/// Daily Chicago series with four overrides, two of them outside
/// `[2006-01-04T01:00Z, 2006-01-06T01:00Z)`.
pub fn absolute_series() -> RecurringItem {
    let mut series = master(
        "abs",
        vec![
            zoned("DTSTART", CHICAGO, "20060102T140000"),
            Property::duration("DURATION", Duration::hours(1)),
            Property::recur("RRULE", "FREQ=DAILY;COUNT=5"),
        ],
    );
    let overrides = [
        modification(
            "abs",
            "abs-1",
            "changed 1",
            vec![
                zoned("RECURRENCE-ID", CHICAGO, "20060104T140000"),
                zoned("DTSTART", CHICAGO, "20060104T160000"),
            ],
            2001,
        ),
        modification(
            "abs",
            "abs-2",
            "changed 2",
            vec![
                prop("RECURRENCE-ID", "20060105T140000Z"),
                prop("DTSTART", "20060105T140000Z"),
            ],
            2002,
        ),
        modification(
            "abs",
            "abs-3",
            "changed 3",
            vec![
                zoned("RECURRENCE-ID", CHICAGO, "20060103T140000"),
                zoned("DTSTART", CHICAGO, "20060103T140000"),
            ],
            2003,
        ),
        modification(
            "abs",
            "abs-4",
            "changed 4",
            vec![
                zoned("RECURRENCE-ID", CHICAGO, "20060106T140000"),
                zoned("DTSTART", CHICAGO, "20060106T140000"),
            ],
            2004,
        ),
    ];
    for item in overrides {
        series.add_modification(item).unwrap();
    }
    series
}

/// Floating daily series with one override inside and one outside
/// `[2006-01-02T17:00, 2006-01-04T17:00)`.
pub fn floating_series() -> RecurringItem {
    let mut series = master(
        "float",
        vec![
            prop("DTSTART", "20060101T180000"),
            prop("DTEND", "20060101T190000"),
            Property::recur("RRULE", "FREQ=DAILY;COUNT=3"),
        ],
    );
    series
        .add_modification(modification(
            "float",
            "float-1",
            "changed 1",
            vec![
                prop("RECURRENCE-ID", "20060103T180000"),
                prop("DTSTART", "20060103T180000"),
            ],
            2001,
        ))
        .unwrap();
    series
        .add_modification(modification(
            "float",
            "float-2",
            "changed 2",
            vec![
                prop("RECURRENCE-ID", "20060101T180000"),
                prop("DTSTART", "20060101T200000"),
            ],
            2002,
        ))
        .unwrap();
    series
}

/// Twice-daily New York series with a this-and-future override anchored
/// before `[2006-01-08T17:00Z, 2006-01-09T17:00Z)` and two single overrides
/// outside it.
pub fn this_and_future_series() -> RecurringItem {
    let mut series = master(
        "taf",
        vec![
            zoned("DTSTART", NEW_YORK, "20060105T090000"),
            zoned("DTEND", NEW_YORK, "20060105T093000"),
            Property::recur("RRULE", "FREQ=DAILY;BYHOUR=9,21"),
        ],
    );
    series
        .add_modification(modification(
            "taf",
            "taf-tail",
            "this and future",
            vec![
                this_and_future(NEW_YORK, "20060106T090000"),
                zoned("DTSTART", NEW_YORK, "20060106T100000"),
                zoned("DTEND", NEW_YORK, "20060106T110000"),
            ],
            2001,
        ))
        .unwrap();
    series
        .add_modification(modification(
            "taf",
            "taf-7",
            "changed 7",
            vec![
                zoned("RECURRENCE-ID", NEW_YORK, "20060107T090000"),
                zoned("DTSTART", NEW_YORK, "20060107T090000"),
            ],
            2002,
        ))
        .unwrap();
    series
        .add_modification(modification(
            "taf",
            "taf-10",
            "changed 10",
            vec![
                zoned("RECURRENCE-ID", NEW_YORK, "20060110T090000"),
                zoned("DTSTART", NEW_YORK, "20060110T090000"),
            ],
            2003,
        ))
        .unwrap();
    series
}

pub fn summaries(calendar: &ICalendar) -> Vec<&str> {
    calendar
        .items()
        .into_iter()
        .filter_map(Component::summary)
        .collect()
}
