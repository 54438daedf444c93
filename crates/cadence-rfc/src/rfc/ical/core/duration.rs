//! DURATION values: a signed count of weeks, or of days and clock time.

use std::fmt;

use chrono::TimeDelta;

/// Nominal duration as written. Months and years cannot be expressed.
///
/// A week-based duration has only `weeks` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duration {
    pub negative: bool,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Duration {
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            negative: false,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }

    #[must_use]
    pub const fn weeks(weeks: u32) -> Self {
        Self {
            weeks,
            ..Self::zero()
        }
    }

    #[must_use]
    pub const fn hours(hours: u32) -> Self {
        Self {
            hours,
            ..Self::zero()
        }
    }

    /// Exact length, with days counted as 24 hours.
    #[must_use]
    pub fn to_time_delta(&self) -> TimeDelta {
        let seconds = (i64::from(self.weeks) * 7 + i64::from(self.days)) * 86_400
            + i64::from(self.hours) * 3_600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        TimeDelta::seconds(if self.negative { -seconds } else { seconds })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.negative { "-P" } else { "P" })?;
        if self.weeks > 0 {
            return write!(f, "{}W", self.weeks);
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        let clock = [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')];
        if clock.iter().any(|(n, _)| *n > 0) {
            f.write_str("T")?;
            for (n, unit) in clock.into_iter().filter(|(n, _)| *n > 0) {
                write!(f, "{n}{unit}")?;
            }
        } else if self.days == 0 {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_shortest_form() {
        assert_eq!(Duration::weeks(2).to_string(), "P2W");
        assert_eq!(Duration::hours(1).to_string(), "PT1H");
        assert_eq!(Duration::zero().to_string(), "PT0S");
        let mixed = Duration {
            negative: true,
            days: 1,
            minutes: 15,
            ..Duration::zero()
        };
        assert_eq!(mixed.to_string(), "-P1DT15M");
    }

    #[test]
    fn exact_length() {
        let dur = Duration {
            days: 1,
            hours: 2,
            minutes: 30,
            ..Duration::zero()
        };
        assert_eq!(dur.to_time_delta(), TimeDelta::minutes(24 * 60 + 150));
        assert_eq!(Duration::weeks(1).to_time_delta(), TimeDelta::days(7));
        let back = Duration {
            negative: true,
            ..Duration::hours(1)
        };
        assert_eq!(back.to_time_delta(), TimeDelta::hours(-1));
    }
}
