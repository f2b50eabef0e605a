//! Recursive date spine: one row per interval bucket from a counter's first
//! entry through the bucket containing now.
//!
//! ```text
//! WITH RECURSIVE date_range(d) AS (
//!     SELECT * FROM (SELECT unixepoch("created",'auto',<start>) AS d FROM "entries"
//!                    WHERE "counter_id"=? ORDER BY created ASC LIMIT ?)
//!     UNION SELECT unixepoch('now',<start>) AS d
//!     UNION SELECT unixepoch("d",<step>) AS d FROM "date_range" WHERE "d"<unixepoch('now',<start>)
//! )
//! ```
//!
//! Gaps (buckets without entries) only become visible against this spine.

use crate::qb::expr::{Cmp, Operator, ex, func, val};
use crate::qb::modifier::{DateModifier, DateUnit, TimeValue};
use crate::qb::{self, Condition, WithQb};

/// Name of the spine CTE.
pub const DATE_RANGE: &str = "date_range";

/// Column holding a bucket start (unix seconds, UTC).
pub const BUCKET: &str = "d";

/// `'auto'` followed by `start`: buckets a stored timestamp column.
pub fn bucket_modifiers(start: &[DateModifier]) -> Vec<DateModifier> {
    let mut modifiers = Vec::with_capacity(start.len() + 1);
    modifiers.push(DateModifier::Auto);
    modifiers.extend_from_slice(start);
    modifiers
}

/// Modifiers advancing a bucket start to the next bucket start.
///
/// The offset is applied in local time and the result normalized again, so
/// buckets stay aligned to local boundaries across UTC offset changes.
pub fn step_modifiers(start: &[DateModifier], increase: i64, unit: DateUnit) -> Vec<DateModifier> {
    let offset = DateModifier::Offset(increase, unit);
    let mut step = vec![DateModifier::Auto];
    match start.split_first() {
        Some((DateModifier::LocalTime, rest)) => {
            step.push(DateModifier::LocalTime);
            step.push(offset);
            step.extend_from_slice(rest);
        }
        _ => {
            step.push(offset);
            step.extend_from_slice(start);
        }
    }
    step
}

/// Build the `date_range(d)` CTE for a counter.
pub fn dates_cte(counter_id: i64, start: &[DateModifier], increase: i64, unit: DateUnit) -> WithQb {
    let first_entry = qb::select("entries")
        .column(func::unixepoch("created", &bucket_modifiers(start)).alias(BUCKET))
        .where_("counter_id", Cmp::Eq, counter_id)
        .order_by("created", true)
        .limit(1)
        .select();

    let current = qb::select_row().column(func::unixepoch(TimeValue::Now, start).alias(BUCKET));

    let next = qb::select(DATE_RANGE)
        .column(func::unixepoch(BUCKET, &step_modifiers(start, increase, unit)).alias(BUCKET))
        .where_fragment(BUCKET, Cmp::Lt, func::unixepoch(TimeValue::Now, start));

    qb::with_recursive(DATE_RANGE, &[BUCKET], first_entry.union(current).union(next))
}

/// `((1 << weekday(d)) & days) != 0`, weekday taken in local time with
/// Sunday as 0.
///
/// A mask of 127 passes every bucket; a mask of 0 passes none.
pub fn day_filter(days: i64) -> Condition {
    let weekday = func::strftime(
        "%w",
        BUCKET,
        &[DateModifier::UnixEpoch, DateModifier::LocalTime],
    );
    Condition::fragment(
        ex(ex(val(1), Operator::Shl, weekday), Operator::BitAnd, days),
        Cmp::Ne,
        0,
    )
}
