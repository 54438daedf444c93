//! iCalendar document serializer.

use super::{escape_param_value, escape_text, fold_line};
use crate::rfc::ical::core::{Component, ComponentKind, ICalendar, Parameter, Property, Value};

/// ## Summary
/// Serializes an iCalendar object to RFC 5545 text.
///
/// VTIMEZONE children are written before every other child; the rest keep
/// their order. Lines are folded and terminated with CRLF.
#[must_use]
#[tracing::instrument(skip(ical), fields(children = ical.root.children.len()))]
pub fn serialize(ical: &ICalendar) -> String {
    let mut out = String::new();
    write_component(&mut out, &ical.root, true);
    tracing::trace!(len = out.len(), "Serialized iCalendar");
    out
}

/// Serializes a single property to one folded content line (no CRLF).
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = String::with_capacity(prop.name.len() + prop.raw_value.len() + 8);
    line.push_str(&prop.name);
    for param in &prop.params {
        write_param(&mut line, param);
    }
    line.push(':');
    line.push_str(&render_value(&prop.value));
    fold_line(&line)
}

fn write_component(out: &mut String, component: &Component, timezones_first: bool) {
    push_line(out, &format!("BEGIN:{}", component.name));
    for prop in &component.properties {
        push_line(out, &serialize_property(prop));
    }

    if timezones_first {
        let (zones, rest): (Vec<&Component>, Vec<&Component>) = component
            .children
            .iter()
            .partition(|c| c.kind == ComponentKind::Timezone);
        for child in zones.into_iter().chain(rest) {
            write_component(out, child, false);
        }
    } else {
        for child in &component.children {
            write_component(out, child, false);
        }
    }

    push_line(out, &format!("END:{}", component.name));
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str("\r\n");
}

fn write_param(line: &mut String, param: &Parameter) {
    line.push(';');
    line.push_str(&param.name);
    line.push('=');
    let joined = param
        .values
        .iter()
        .map(|v| escape_param_value(v))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str(&joined);
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Text(s) => escape_text(s),
        Value::Integer(i) => i.to_string(),
        Value::Date(d) => d.format("%Y%m%d").to_string(),
        Value::DateTime(dt) => dt.to_string(),
        Value::Duration(d) => d.to_string(),
        Value::Recur(s) | Value::Unknown(s) => s.clone(),
        Value::List(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
    }
}
