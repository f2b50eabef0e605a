use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{self, Completions, HistoryPoint, Streak, StreakSummary};
use crate::client::{AsyncExecutor, Executor};
use crate::error::{StoreError, StoreResult};
use crate::models::{Entry, Interval, NewEntry};
use crate::qb::expr::Cmp;
use crate::qb::{self, InsertQb, MutationQb, SelectQb, SqlQb, Value};
use crate::row::{FromRow, Row};

pub const TABLE: &str = "counters";

/// A habit counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub id: i64,
    pub title: String,
    /// Entries needed for a bucket to count as completed.
    pub goal: i64,
    pub interval: Interval,
    /// Weekday bitmask, bit 0 is Sunday. `None` counts every day.
    pub days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCounter {
    pub title: String,
    pub goal: i64,
    pub interval: Interval,
    pub days: Option<i64>,
}

impl NewCounter {
    pub fn new(title: impl Into<String>, goal: i64, interval: Interval) -> Self {
        Self {
            title: title.into(),
            goal,
            interval,
            days: None,
        }
    }

    pub fn with_days(mut self, days: i64) -> Self {
        self.days = Some(days);
        self
    }

    fn row(&self) -> [(&'static str, Value); 4] {
        [
            ("title", Value::from(self.title.as_str())),
            ("goal", Value::Integer(self.goal)),
            ("interval", Value::Integer(self.interval.code())),
            ("days", Value::from(self.days)),
        ]
    }
}

/// Fields to change on a stored counter. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterChanges {
    pub title: Option<String>,
    pub goal: Option<i64>,
    pub interval: Option<Interval>,
    /// `Some(None)` clears the day mask.
    pub days: Option<Option<i64>>,
}

impl CounterChanges {
    fn pairs(&self) -> Vec<(&'static str, Value)> {
        let mut pairs = Vec::new();
        if let Some(title) = &self.title {
            pairs.push(("title", Value::from(title.as_str())));
        }
        if let Some(goal) = self.goal {
            pairs.push(("goal", Value::Integer(goal)));
        }
        if let Some(interval) = self.interval {
            pairs.push(("interval", Value::Integer(interval.code())));
        }
        if let Some(days) = self.days {
            pairs.push(("days", Value::from(days)));
        }
        pairs
    }
}

impl FromRow for Counter {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            goal: row.try_get("goal")?,
            interval: Interval::try_from(row.try_get::<i64>("interval")?)?,
            days: row.try_get("days")?,
        })
    }
}

fn insert_query(counters: &[NewCounter]) -> InsertQb {
    counters
        .iter()
        .fold(qb::insert(TABLE), |q, counter| q.values(counter.row()))
}

fn first_created(counters: &[NewCounter], id: i64) -> StoreResult<Counter> {
    let first = counters
        .first()
        .ok_or_else(|| StoreError::validation("Incomplete input in INSERT"))?;
    Ok(Counter {
        id,
        title: first.title.clone(),
        goal: first.goal,
        interval: first.interval,
        days: first.days,
    })
}

fn find_query(interval: Option<Interval>) -> SelectQb {
    let q = qb::select(TABLE);
    match interval {
        Some(interval) => q.where_("interval", Cmp::Eq, interval.code()),
        None => q,
    }
}

impl Counter {
    /// Insert one or more counters in a single statement.
    ///
    /// Returns the first counter, carrying the statement's last insert id.
    pub fn create(db: &impl Executor, counters: &[NewCounter]) -> StoreResult<Counter> {
        let res = insert_query(counters).execute(db)?;
        first_created(counters, res.last_insert_id)
    }

    pub async fn create_async(db: &impl AsyncExecutor, counters: &[NewCounter]) -> StoreResult<Counter> {
        let res = insert_query(counters).execute_async(db).await?;
        first_created(counters, res.last_insert_id)
    }

    /// All counters, or those with the given interval.
    pub fn find(db: &impl Executor, interval: Option<Interval>) -> StoreResult<Vec<Counter>> {
        find_query(interval).fetch_all(db)
    }

    pub async fn find_async(db: &impl AsyncExecutor, interval: Option<Interval>) -> StoreResult<Vec<Counter>> {
        find_query(interval).fetch_all_async(db).await
    }

    /// Store `changes` and apply them to `self` once a row was updated.
    ///
    /// Returns the number of rows changed.
    pub fn update(&mut self, db: &impl Executor, changes: CounterChanges) -> StoreResult<u64> {
        let res = qb::update(TABLE)
            .set_all(changes.pairs())
            .where_("id", Cmp::Eq, self.id)
            .execute(db)?;

        if res.rows_changed > 0 {
            if let Some(title) = changes.title {
                self.title = title;
            }
            if let Some(goal) = changes.goal {
                self.goal = goal;
            }
            if let Some(interval) = changes.interval {
                self.interval = interval;
            }
            if let Some(days) = changes.days {
                self.days = days;
            }
        }
        Ok(res.rows_changed)
    }

    /// Delete the counter; its entries go with it.
    pub fn delete(&self, db: &impl Executor) -> StoreResult<u64> {
        let res = qb::delete(TABLE).where_("id", Cmp::Eq, self.id).execute(db)?;
        Ok(res.rows_changed)
    }

    /// Entries in the bucket containing now.
    pub fn value(&self, db: &impl Executor) -> StoreResult<i64> {
        Entry::count_by_counter_id(db, self.id, self.interval)
    }

    /// Record an entry at the current time.
    pub fn increase(&self, db: &impl Executor) -> StoreResult<Entry> {
        let created = Utc::now().timestamp();
        let entry = Entry::create(db, &[NewEntry::new(self.id, created)])?;
        tracing::debug!(counter_id = self.id, entry_id = entry.id, "counter increased");
        Ok(entry)
    }

    /// Remove the most recently recorded entry of the current bucket.
    ///
    /// Returns the removed entry, or `None` when the bucket is empty.
    pub fn decrease(&self, db: &impl Executor) -> StoreResult<Option<Entry>> {
        let last = match self.interval.current_range(&Local::now()) {
            Some(range) => Entry::find_last_in_range(db, self.id, range)?,
            None if self.value(db)? == 0 => None,
            None => Entry::find_last_by_counter_id(db, self.id)?,
        };
        let Some(last) = last else {
            return Ok(None);
        };
        last.delete(db)?;
        tracing::debug!(counter_id = self.id, entry_id = last.id, "counter decreased");
        Ok(Some(last))
    }

    pub fn history(
        &self,
        db: &impl Executor,
        page: i64,
        interval: Interval,
        limit: i64,
    ) -> StoreResult<Vec<HistoryPoint>> {
        analytics::history(db, self.id, interval, page, limit)
    }

    fn tracks_streaks(&self) -> bool {
        self.interval != Interval::Lifetime && self.goal > 0
    }

    /// Streaks newest first; empty for lifetime counters and counters
    /// without a goal.
    pub fn streaks(&self, db: &impl Executor) -> StoreResult<Vec<Streak>> {
        if !self.tracks_streaks() {
            return Ok(Vec::new());
        }
        analytics::streaks(db, self.id, self.interval, self.goal, self.days)
    }

    pub fn streak_summary(&self, db: &impl Executor) -> StoreResult<StreakSummary> {
        Ok(StreakSummary::from_streaks(&self.streaks(db)?))
    }

    pub fn completions(&self, db: &impl Executor) -> StoreResult<Completions> {
        if !self.tracks_streaks() {
            return Ok(Completions::new(0, 0));
        }
        analytics::completions(db, self.id, self.interval, self.goal, self.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql() {
        let built = insert_query(&[NewCounter::new("A", 1, Interval::Daily)])
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO \"counters\" (\"title\",\"goal\",\"interval\",\"days\") VALUES (?,?,?,?)"
        );
        assert_eq!(
            built.params,
            vec![Value::from("A"), Value::Integer(1), Value::Integer(0), Value::Null]
        );
    }

    #[test]
    fn test_find_filter() {
        assert_eq!(find_query(None).build().unwrap().sql, "SELECT * FROM \"counters\"");
        let built = find_query(Some(Interval::Lifetime)).build().unwrap();
        assert_eq!(built.sql, "SELECT * FROM \"counters\" WHERE \"interval\"=?");
        assert_eq!(built.params, vec![Value::Integer(-1)]);
    }

    #[test]
    fn test_changes_pairs() {
        let changes = CounterChanges {
            goal: Some(3),
            days: Some(None),
            ..CounterChanges::default()
        };
        assert_eq!(
            changes.pairs(),
            vec![("goal", Value::Integer(3)), ("days", Value::Null)]
        );
        assert!(CounterChanges::default().pairs().is_empty());
    }
}
