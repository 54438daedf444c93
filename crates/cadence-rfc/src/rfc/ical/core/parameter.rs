//! Property parameters such as `TZID`, `VALUE` and `RANGE`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Upper-cased name.
    pub name: String,
    /// Comma-separated values, unquoted.
    pub values: Vec<String>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut name = name.into();
        name.make_ascii_uppercase();
        Self {
            name,
            values: vec![value.into()],
        }
    }

    #[must_use]
    pub fn tzid(tzid: impl Into<String>) -> Self {
        Self::new("TZID", tzid)
    }

    #[must_use]
    pub fn value_type(kind: impl Into<String>) -> Self {
        Self::new("VALUE", kind)
    }

    /// `RANGE=THISANDFUTURE` on a RECURRENCE-ID.
    #[must_use]
    pub fn this_and_future() -> Self {
        Self::new("RANGE", "THISANDFUTURE")
    }

    /// The first value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Whether any value equals `expected`, ignoring ASCII case.
    #[must_use]
    pub fn has_value(&self, expected: &str) -> bool {
        self.values
            .iter()
            .any(|value| value.eq_ignore_ascii_case(expected))
    }
}
