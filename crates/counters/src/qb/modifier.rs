//! SQLite date/time function inputs: time values, units and modifiers.

use std::fmt;

/// Unit of a relative date offset (`+7 days`, `-1 months`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Months,
    Years,
}

impl DateUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DateUnit::Days => "days",
            DateUnit::Hours => "hours",
            DateUnit::Minutes => "minutes",
            DateUnit::Seconds => "seconds",
            DateUnit::Months => "months",
            DateUnit::Years => "years",
        }
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A modifier accepted by `unixepoch()`, `date()` and `strftime()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateModifier {
    /// Interpret a numeric time value as unix seconds or julian day.
    Auto,
    LocalTime,
    Utc,
    UnixEpoch,
    StartOfDay,
    StartOfMonth,
    StartOfYear,
    /// Advance to the next date whose weekday is `n` (0 = Sunday).
    Weekday(u8),
    /// Relative shift, e.g. `+1 months`.
    Offset(i64, DateUnit),
}

impl fmt::Display for DateModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateModifier::Auto => f.write_str("auto"),
            DateModifier::LocalTime => f.write_str("localtime"),
            DateModifier::Utc => f.write_str("utc"),
            DateModifier::UnixEpoch => f.write_str("unixepoch"),
            DateModifier::StartOfDay => f.write_str("start of day"),
            DateModifier::StartOfMonth => f.write_str("start of month"),
            DateModifier::StartOfYear => f.write_str("start of year"),
            DateModifier::Weekday(n) => write!(f, "weekday {n}"),
            DateModifier::Offset(n, unit) => write!(f, "{n:+} {unit}"),
        }
    }
}

/// First argument of the date/time functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeValue {
    /// The literal `'now'`.
    Now,
    /// A column holding a time value.
    Column(String),
}

impl TimeValue {
    pub fn column(name: impl Into<String>) -> Self {
        TimeValue::Column(name.into())
    }
}

impl From<&str> for TimeValue {
    fn from(name: &str) -> Self {
        TimeValue::Column(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_text() {
        assert_eq!(DateModifier::StartOfDay.to_string(), "start of day");
        assert_eq!(DateModifier::Weekday(0).to_string(), "weekday 0");
        assert_eq!(DateModifier::Offset(-6, DateUnit::Days).to_string(), "-6 days");
        assert_eq!(DateModifier::Offset(1, DateUnit::Months).to_string(), "+1 months");
    }
}
