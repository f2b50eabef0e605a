//! Streak detection by numbering discontinuity.
//!
//! Eligible buckets are numbered by recency (1 is the bucket containing
//! now). After dropping incomplete buckets, a jump of more than one between
//! neighbouring numbers marks a gap; a running sum of those jumps labels
//! each contiguous run, and the streak length is the size of its run.

use serde::{Deserialize, Serialize};

use crate::analytics::date_range::{BUCKET, DATE_RANGE, bucket_modifiers, dates_cte, day_filter};
use crate::client::{AsyncExecutor, Executor};
use crate::error::StoreResult;
use crate::models::Interval;
use crate::qb::expr::{Cmp, Operator, ex, func, val};
use crate::qb::modifier::TimeValue;
use crate::qb::{self, SelectQb, SqlQb};
use crate::row::{FromRow, Row};

/// One run of consecutive completed buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Number of buckets in the run.
    pub streak: i64,
    /// Recency rank of the run's newest bucket.
    pub number: i64,
}

impl FromRow for Streak {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            streak: row.try_get("streak")?,
            number: row.try_get("number")?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current: i64,
    pub best: i64,
}

impl StreakSummary {
    /// `current` is the run reaching the newest bucket, or the one before
    /// it while the newest is still in progress.
    pub fn from_streaks(streaks: &[Streak]) -> Self {
        let best = streaks.iter().map(|s| s.streak).max().unwrap_or(0);
        let current = streaks
            .iter()
            .find(|s| matches!(s.number, 1 | 2))
            .map_or(0, |s| s.streak);
        Self { current, best }
    }
}

/// Entries per bucket for buckets that reached `goal`.
///
/// Entries dated past the current bucket are left out, so every bucket
/// returned is also a spine bucket.
pub(crate) fn completed_buckets(counter_id: i64, interval: Interval, goal: i64, days: Option<i64>) -> SelectQb {
    let m = interval.modifiers();
    let mut q = qb::select("entries")
        .column(func::unixepoch("created", &bucket_modifiers(&m.start)).alias(BUCKET))
        .column(func::count().alias("c"))
        .where_("counter_id", Cmp::Eq, counter_id)
        .where_fragment("created", Cmp::Lt, func::unixepoch(TimeValue::Now, &m.end));
    if let Some(days) = days {
        q = q.where_condition(day_filter(days));
    }
    q.group_by(BUCKET).having("c", Cmp::Gte, goal)
}

pub fn streaks_query(counter_id: i64, interval: Interval, goal: i64, days: Option<i64>) -> SelectQb {
    let m = interval.modifiers();
    let (increase, unit) = m.increase;

    let mut filtered = qb::select(DATE_RANGE)
        .column(BUCKET)
        .column(func::row_number().over(BUCKET, true).alias("number"));
    if let Some(days) = days {
        filtered = filtered.where_condition(day_filter(days));
    }

    let combined = qb::select("filtered_date_range")
        .columns(&[BUCKET, "number"])
        .column(val(0).alias("c"))
        .union_all(
            qb::select("completed")
                .column(BUCKET)
                .column(val(0).alias("number"))
                .column("c"),
        )
        .select()
        .column(BUCKET)
        .column(func::max("number").alias("number"))
        .column(ex(func::sum("c"), Cmp::Gt, 0).alias("completed"))
        .group_by(BUCKET)
        .having("completed", Cmp::Eq, 1);

    // Buckets past the spine (entries dated after now) carry number 0.
    let runs = qb::select("combined")
        .columns(&[BUCKET, "number"])
        .column(
            ex(
                ex("number", Operator::Sub, func::lag("number", 1, "number").over("number", false)),
                Cmp::Gt,
                1,
            )
            .alias("diff"),
        )
        .where_("number", Cmp::Gt, 0)
        .select()
        .columns(&[BUCKET, "number"])
        .column(func::sum("diff").over("number", false).alias("g"));

    dates_cte(counter_id, &m.start, increase, unit)
        .with("filtered_date_range", filtered)
        .with("completed", completed_buckets(counter_id, interval, goal, days))
        .with("combined", combined)
        .with("streaks", runs)
        .select("streaks")
        .column(func::count().alias("streak"))
        .column(func::min("number").alias("number"))
        .group_by("g")
        .order_by("number", true)
}

/// Streaks ordered newest first.
pub fn streaks(
    db: &impl Executor,
    counter_id: i64,
    interval: Interval,
    goal: i64,
    days: Option<i64>,
) -> StoreResult<Vec<Streak>> {
    streaks_query(counter_id, interval, goal, days).fetch_all(db)
}

pub async fn streaks_async(
    db: &impl AsyncExecutor,
    counter_id: i64,
    interval: Interval,
    goal: i64,
    days: Option<i64>,
) -> StoreResult<Vec<Streak>> {
    streaks_query(counter_id, interval, goal, days)
        .fetch_all_async(db)
        .await
}
