//! DATE-TIME values and the three ways they are anchored.

use std::fmt;

use chrono::NaiveDateTime;

/// How a DATE-TIME reading is tied to the time line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateTimeForm {
    /// No zone: the same reading wherever it is observed.
    Floating,
    /// Written with a trailing `Z`.
    Utc,
    /// Read in the zone named by the property's TZID parameter.
    Zoned { tzid: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// The reading as written, before any zone is applied.
    pub local: NaiveDateTime,
    pub form: DateTimeForm,
}

impl DateTime {
    #[must_use]
    pub const fn floating(local: NaiveDateTime) -> Self {
        Self {
            local,
            form: DateTimeForm::Floating,
        }
    }

    #[must_use]
    pub const fn utc(local: NaiveDateTime) -> Self {
        Self {
            local,
            form: DateTimeForm::Utc,
        }
    }

    #[must_use]
    pub fn zoned(local: NaiveDateTime, tzid: impl Into<String>) -> Self {
        Self {
            local,
            form: DateTimeForm::Zoned { tzid: tzid.into() },
        }
    }

    #[must_use]
    pub const fn is_utc(&self) -> bool {
        matches!(self.form, DateTimeForm::Utc)
    }

    #[must_use]
    pub const fn is_floating(&self) -> bool {
        matches!(self.form, DateTimeForm::Floating)
    }

    /// The TZID of a zoned value.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        if let DateTimeForm::Zoned { tzid } = &self.form {
            Some(tzid)
        } else {
            None
        }
    }
}

/// Writes the basic format; the TZID travels as a parameter, not here.
impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.is_utc() { "Z" } else { "" };
        write!(f, "{}{suffix}", self.local.format("%Y%m%dT%H%M%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2006-01-02 14:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn writes_basic_format() {
        assert_eq!(DateTime::utc(reading()).to_string(), "20060102T140000Z");
        assert_eq!(DateTime::floating(reading()).to_string(), "20060102T140000");
        assert_eq!(
            DateTime::zoned(reading(), "America/Chicago").to_string(),
            "20060102T140000"
        );
    }

    #[test]
    fn tzid_only_for_zoned() {
        assert_eq!(
            DateTime::zoned(reading(), "America/Chicago").tzid(),
            Some("America/Chicago")
        );
        assert_eq!(DateTime::utc(reading()).tzid(), None);
        assert!(DateTime::floating(reading()).is_floating());
    }
}
