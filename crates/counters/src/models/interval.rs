//! Counting intervals and the date modifiers that bucket timestamps into them.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::qb::modifier::{DateModifier, DateUnit};

/// How often a counter's goal resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Interval {
    Lifetime,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// SQLite modifiers describing one interval bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalModifiers {
    /// Normalize a local time to the UTC start of its bucket.
    pub start: Vec<DateModifier>,
    /// Normalize a local time to the UTC start of the following bucket.
    pub end: Vec<DateModifier>,
    /// Bucket width.
    pub increase: (i64, DateUnit),
}

impl Interval {
    /// Stored integer code.
    pub fn code(self) -> i64 {
        match self {
            Interval::Lifetime => -1,
            Interval::Daily => 0,
            Interval::Weekly => 1,
            Interval::Monthly => 2,
            Interval::Yearly => 3,
        }
    }

    pub fn modifiers(self) -> IntervalModifiers {
        let mut base = vec![DateModifier::LocalTime];
        let increase = match self {
            Interval::Weekly => {
                base.extend([
                    DateModifier::StartOfDay,
                    DateModifier::Weekday(0),
                    DateModifier::Offset(-6, DateUnit::Days),
                ]);
                (7, DateUnit::Days)
            }
            Interval::Monthly => {
                base.push(DateModifier::StartOfMonth);
                (1, DateUnit::Months)
            }
            Interval::Yearly => {
                base.push(DateModifier::StartOfYear);
                (1, DateUnit::Years)
            }
            Interval::Lifetime | Interval::Daily => {
                base.push(DateModifier::StartOfDay);
                (1, DateUnit::Days)
            }
        };

        let mut start = base.clone();
        start.push(DateModifier::Utc);

        let mut end = base;
        end.push(DateModifier::Offset(increase.0, increase.1));
        end.push(DateModifier::Utc);

        IntervalModifiers {
            start,
            end,
            increase,
        }
    }

    /// Unix bounds `[start, end]` of the bucket containing `now`, in `now`'s
    /// time zone. `end` is the last second of the bucket.
    ///
    /// `None` for [`Interval::Lifetime`], or when local midnight does not
    /// exist in that zone.
    pub fn current_range<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<(i64, i64)> {
        let today = now.date_naive();
        let (first, last) = match self {
            Interval::Lifetime => return None,
            Interval::Daily => (today, today),
            Interval::Weekly => {
                let monday = today.checked_sub_days(Days::new(u64::from(
                    today.weekday().num_days_from_monday(),
                )))?;
                (monday, monday.checked_add_days(Days::new(6))?)
            }
            Interval::Monthly => {
                let first = today.with_day(1)?;
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
                };
                (first, next.pred_opt()?)
            }
            Interval::Yearly => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            ),
        };

        let tz = now.timezone();
        let local = |date: NaiveDate, h, m, s| -> Option<i64> {
            let naive: NaiveDateTime = date.and_hms_opt(h, m, s)?;
            tz.from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp())
        };
        Some((local(first, 0, 0, 0)?, local(last, 23, 59, 59)?))
    }
}

impl From<Interval> for i64 {
    fn from(interval: Interval) -> Self {
        interval.code()
    }
}

impl TryFrom<i64> for Interval {
    type Error = StoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(Interval::Lifetime),
            0 => Ok(Interval::Daily),
            1 => Ok(Interval::Weekly),
            2 => Ok(Interval::Monthly),
            3 => Ok(Interval::Yearly),
            other => Err(StoreError::decode(
                "interval",
                format!("unknown interval code {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn texts(modifiers: &[DateModifier]) -> Vec<String> {
        modifiers.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn weekly_modifiers() {
        let m = Interval::Weekly.modifiers();
        assert_eq!(
            texts(&m.start),
            ["localtime", "start of day", "weekday 0", "-6 days", "utc"]
        );
        assert_eq!(
            texts(&m.end),
            ["localtime", "start of day", "weekday 0", "-6 days", "+7 days", "utc"]
        );
        assert_eq!(m.increase, (7, DateUnit::Days));
    }

    #[test]
    fn lifetime_uses_daily_buckets() {
        assert_eq!(Interval::Lifetime.modifiers(), Interval::Daily.modifiers());
        assert_eq!(
            texts(&Interval::Monthly.modifiers().end),
            ["localtime", "start of month", "+1 months", "utc"]
        );
    }

    #[test]
    fn codes_round_trip() {
        for interval in [
            Interval::Lifetime,
            Interval::Daily,
            Interval::Weekly,
            Interval::Monthly,
            Interval::Yearly,
        ] {
            assert_eq!(Interval::try_from(interval.code()).unwrap(), interval);
        }
        assert!(Interval::try_from(9).is_err());
    }

    #[test]
    fn current_range_utc() {
        // Wednesday 2024-02-14 13:30:00 UTC
        let now = Utc.with_ymd_and_hms(2024, 2, 14, 13, 30, 0).unwrap();
        let day = |y, m, d, h, mi, s| Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap().timestamp();

        assert_eq!(Interval::Lifetime.current_range(&now), None);
        assert_eq!(
            Interval::Daily.current_range(&now),
            Some((day(2024, 2, 14, 0, 0, 0), day(2024, 2, 14, 23, 59, 59)))
        );
        assert_eq!(
            Interval::Weekly.current_range(&now),
            Some((day(2024, 2, 12, 0, 0, 0), day(2024, 2, 18, 23, 59, 59)))
        );
        assert_eq!(
            Interval::Monthly.current_range(&now),
            Some((day(2024, 2, 1, 0, 0, 0), day(2024, 2, 29, 23, 59, 59)))
        );
        assert_eq!(
            Interval::Yearly.current_range(&now),
            Some((day(2024, 1, 1, 0, 0, 0), day(2024, 12, 31, 23, 59, 59)))
        );
    }

    #[test]
    fn current_range_follows_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        // 23:30 UTC on Dec 31 is already Jan 1 at +02:00.
        let now = Utc
            .with_ymd_and_hms(2023, 12, 31, 23, 30, 0)
            .unwrap()
            .with_timezone(&tz);
        let (start, _) = Interval::Monthly.current_range(&now).unwrap();
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2023, 12, 31, 22, 0, 0).unwrap().timestamp()
        );
        let (day_start, day_end) = Interval::Daily.current_range(&now).unwrap();
        assert!(day_start <= now.timestamp() && now.timestamp() <= day_end);
        assert_eq!(day_start, start);
    }
}
