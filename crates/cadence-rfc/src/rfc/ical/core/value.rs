//! Typed property values.

use chrono::NaiveDate;

use super::{DateTime, Duration};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unescaped TEXT.
    Text(String),
    Integer(i32),
    Date(NaiveDate),
    DateTime(DateTime),
    Duration(Duration),
    /// RRULE body, handed to the rule engine as written.
    Recur(String),
    /// RDATE and EXDATE values with more than one entry.
    List(Vec<Value>),
    /// A value type this model does not interpret.
    Unknown(String),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<&NaiveDate> {
        if let Self::Date(date) = self {
            Some(date)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime> {
        if let Self::DateTime(dt) = self {
            Some(dt)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_duration(&self) -> Option<&Duration> {
        if let Self::Duration(duration) = self {
            Some(duration)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_recur(&self) -> Option<&str> {
        if let Self::Recur(rule) = self {
            Some(rule)
        } else {
            None
        }
    }

    /// ## Summary
    /// The entries of a multi-valued property.
    ///
    /// A value that is not a list is its own single entry.
    #[must_use]
    pub fn as_list(&self) -> &[Value] {
        if let Self::List(entries) = self {
            entries
        } else {
            std::slice::from_ref(self)
        }
    }
}
