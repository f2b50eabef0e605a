//! Completion rate: completed buckets over eligible buckets.

use serde::{Deserialize, Serialize};

use crate::analytics::date_range::{DATE_RANGE, dates_cte, day_filter};
use crate::analytics::streaks::completed_buckets;
use crate::client::{AsyncExecutor, Executor};
use crate::error::StoreResult;
use crate::models::Interval;
use crate::qb::expr::func;
use crate::qb::{SelectQb, SqlQb};
use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Completions {
    pub completed: i64,
    pub total: i64,
    /// `completed / total`; NaN when there are no eligible buckets.
    pub rate: f64,
}

impl Completions {
    pub fn new(completed: i64, total: i64) -> Self {
        let rate = if total == 0 {
            f64::NAN
        } else {
            completed as f64 / total as f64
        };
        Self {
            completed,
            total,
            rate,
        }
    }
}

/// `SELECT count(*) AS total` over the (day-filtered) spine.
pub fn total_query(counter_id: i64, interval: Interval, days: Option<i64>) -> SelectQb {
    let m = interval.modifiers();
    let (increase, unit) = m.increase;
    let q = dates_cte(counter_id, &m.start, increase, unit)
        .select(DATE_RANGE)
        .column(func::count().alias("total"));
    match days {
        Some(days) => q.where_condition(day_filter(days)),
        None => q,
    }
}

/// `SELECT count(*) AS completed` over buckets that reached `goal`.
pub fn completed_query(counter_id: i64, interval: Interval, goal: i64, days: Option<i64>) -> SelectQb {
    completed_buckets(counter_id, interval, goal, days)
        .select()
        .column(func::count().alias("completed"))
}

fn count(rows: Vec<Row>, column: &str) -> StoreResult<i64> {
    rows.first().map_or(Ok(0), |row| row.try_get(column))
}

pub fn completions(
    db: &impl Executor,
    counter_id: i64,
    interval: Interval,
    goal: i64,
    days: Option<i64>,
) -> StoreResult<Completions> {
    let total = count(total_query(counter_id, interval, days).query(db)?, "total")?;
    let completed = count(
        completed_query(counter_id, interval, goal, days).query(db)?,
        "completed",
    )?;
    Ok(Completions::new(completed, total))
}

pub async fn completions_async(
    db: &impl AsyncExecutor,
    counter_id: i64,
    interval: Interval,
    goal: i64,
    days: Option<i64>,
) -> StoreResult<Completions> {
    let total = total_query(counter_id, interval, days).query_async(db).await?;
    let completed = completed_query(counter_id, interval, goal, days)
        .query_async(db)
        .await?;
    Ok(Completions::new(
        count(completed, "completed")?,
        count(total, "total")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate() {
        let c = Completions::new(3, 4);
        assert_eq!(c.rate, 0.75);
        assert!(Completions::new(0, 0).rate.is_nan());
    }

    #[test]
    fn test_completed_sql() {
        let built = completed_query(9, Interval::Yearly, 3, None).build().unwrap();
        assert_eq!(
            built.sql,
            "SELECT count(*) AS completed FROM (\
             SELECT unixepoch(\"created\",'auto','localtime','start of year','utc') AS d,count(*) AS c \
             FROM \"entries\" WHERE \"counter_id\"=? \
             AND \"created\"<unixepoch('now','localtime','start of year','+1 years','utc') \
             GROUP BY d HAVING \"c\">=?)"
        );
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn test_total_sql_filters_days() {
        let built = total_query(9, Interval::Daily, Some(127)).build().unwrap();
        assert!(built.sql.ends_with(
            "SELECT count(*) AS total FROM \"date_range\" \
             WHERE ((?<<strftime('%w',\"d\",'unixepoch','localtime'))&?)!=?"
        ));
        assert_eq!(built.placeholder_count(), built.params.len());
    }
}
