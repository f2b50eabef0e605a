//! Paged per-bucket entry counts, newest bucket first.
//!
//! The current page of spine rows (each with a positive row number) is
//! unioned with every entry of the counter (row number 0) and grouped by
//! bucket. Only buckets that own a spine row survive, and `count(*) - 1`
//! leaves the number of entries in each of them.

use serde::{Deserialize, Serialize};

use crate::analytics::date_range::{BUCKET, DATE_RANGE, bucket_modifiers, dates_cte};
use crate::client::{AsyncExecutor, Executor};
use crate::error::StoreResult;
use crate::models::Interval;
use crate::qb::expr::{Cmp, Operator, ex, func, val};
use crate::qb::{self, SelectQb, SqlQb};
use crate::row::{FromRow, Row};

/// Default page size.
pub const PAGE_SIZE: i64 = 8;

/// Entry count of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Bucket start, unix seconds.
    pub d: i64,
    /// Position of the bucket in the spine, oldest first.
    pub number: i64,
    /// Entries recorded in the bucket.
    pub c: i64,
}

impl FromRow for HistoryPoint {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            d: row.try_get("d")?,
            number: row.try_get("number")?,
            c: row.try_get("c")?,
        })
    }
}

pub fn history_query(counter_id: i64, interval: Interval, page: i64, limit: i64) -> SelectQb {
    let m = interval.modifiers();
    let (increase, unit) = m.increase;

    let page_rows = dates_cte(counter_id, &m.start, increase, unit)
        .select(DATE_RANGE)
        .column(BUCKET)
        .column(func::row_number().over(BUCKET, false).alias("number"))
        .order_by(BUCKET, false)
        .limit(limit)
        .offset(page.saturating_mul(limit))
        .select();

    let entries = qb::select("entries")
        .column(func::unixepoch("created", &bucket_modifiers(&m.start)).alias(BUCKET))
        .column(val(0).alias("number"))
        .where_("counter_id", Cmp::Eq, counter_id);

    page_rows
        .union_all(entries)
        .select()
        .column(BUCKET)
        .column(func::max("number").alias("number"))
        .column(ex(func::count(), Operator::Sub, 1).alias("c"))
        .group_by(BUCKET)
        .having_expr(func::max("number"), Cmp::Gt, 0)
        .order_by(BUCKET, false)
}

pub fn history(
    db: &impl Executor,
    counter_id: i64,
    interval: Interval,
    page: i64,
    limit: i64,
) -> StoreResult<Vec<HistoryPoint>> {
    history_query(counter_id, interval, page, limit).fetch_all(db)
}

pub async fn history_async(
    db: &impl AsyncExecutor,
    counter_id: i64,
    interval: Interval,
    page: i64,
    limit: i64,
) -> StoreResult<Vec<HistoryPoint>> {
    history_query(counter_id, interval, page, limit)
        .fetch_all_async(db)
        .await
}
