use serde::{Deserialize, Serialize};

use crate::client::{AsyncExecutor, Executor};
use crate::error::{StoreError, StoreResult};
use crate::models::Interval;
use crate::qb::expr::{Cmp, func};
use crate::qb::modifier::TimeValue;
use crate::qb::{self, InsertQb, MutationQb, SqlQb, Value};
use crate::row::{FromRow, Row};

pub const TABLE: &str = "entries";

/// One recorded tick of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub counter_id: i64,
    /// Unix seconds.
    pub created: i64,
}

/// An entry that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub counter_id: i64,
    pub created: i64,
}

impl NewEntry {
    pub fn new(counter_id: i64, created: i64) -> Self {
        Self {
            counter_id,
            created,
        }
    }

    fn row(&self) -> [(&'static str, Value); 2] {
        [
            ("counter_id", Value::Integer(self.counter_id)),
            ("created", Value::Integer(self.created)),
        ]
    }
}

impl FromRow for Entry {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            counter_id: row.try_get("counter_id")?,
            created: row.try_get("created")?,
        })
    }
}

fn insert_query(entries: &[NewEntry]) -> InsertQb {
    entries
        .iter()
        .fold(qb::insert(TABLE), |q, entry| q.values(entry.row()))
}

fn first_created(entries: &[NewEntry], id: i64) -> StoreResult<Entry> {
    let first = entries
        .first()
        .ok_or_else(|| StoreError::validation("Incomplete input in INSERT"))?;
    Ok(Entry {
        id,
        counter_id: first.counter_id,
        created: first.created,
    })
}

impl Entry {
    /// Insert one or more entries in a single statement.
    ///
    /// Returns the first entry, carrying the statement's last insert id.
    pub fn create(db: &impl Executor, entries: &[NewEntry]) -> StoreResult<Entry> {
        let res = insert_query(entries).execute(db)?;
        first_created(entries, res.last_insert_id)
    }

    pub async fn create_async(db: &impl AsyncExecutor, entries: &[NewEntry]) -> StoreResult<Entry> {
        let res = insert_query(entries).execute_async(db).await?;
        first_created(entries, res.last_insert_id)
    }

    pub async fn select_by_counter_id_async(
        db: &impl AsyncExecutor,
        counter_id: i64,
    ) -> StoreResult<Vec<Entry>> {
        qb::select(TABLE)
            .where_("counter_id", Cmp::Eq, counter_id)
            .fetch_all_async(db)
            .await
    }

    /// Number of entries in the bucket containing now; every entry for
    /// [`Interval::Lifetime`].
    pub fn count_by_counter_id(
        db: &impl Executor,
        counter_id: i64,
        interval: Interval,
    ) -> StoreResult<i64> {
        let mut q = qb::select(TABLE)
            .column(func::count().alias("value"))
            .where_("counter_id", Cmp::Eq, counter_id);

        if interval != Interval::Lifetime {
            let m = interval.modifiers();
            q = q
                .where_fragment("created", Cmp::Gte, func::unixepoch(TimeValue::Now, &m.start))
                .where_fragment("created", Cmp::Lt, func::unixepoch(TimeValue::Now, &m.end));
        }

        q.fetch_one::<Row>(db)?.try_get("value")
    }

    pub fn find_last_by_counter_id(db: &impl Executor, counter_id: i64) -> StoreResult<Option<Entry>> {
        qb::select(TABLE)
            .where_("counter_id", Cmp::Eq, counter_id)
            .order_by("id", false)
            .limit(1)
            .fetch_opt(db)
    }

    /// Most recently inserted entry created within `[start, end]`.
    pub fn find_last_in_range(
        db: &impl Executor,
        counter_id: i64,
        (start, end): (i64, i64),
    ) -> StoreResult<Option<Entry>> {
        qb::select(TABLE)
            .where_("counter_id", Cmp::Eq, counter_id)
            .where_("created", Cmp::Gte, start)
            .where_("created", Cmp::Lte, end)
            .order_by("id", false)
            .limit(1)
            .fetch_opt(db)
    }

    /// Returns the number of entries removed.
    pub fn delete_by_counter_id(db: &impl Executor, counter_id: i64) -> StoreResult<u64> {
        let res = qb::delete(TABLE)
            .where_("counter_id", Cmp::Eq, counter_id)
            .execute(db)?;
        Ok(res.rows_changed)
    }

    pub fn delete(&self, db: &impl Executor) -> StoreResult<u64> {
        let res = qb::delete(TABLE).where_("id", Cmp::Eq, self.id).execute(db)?;
        Ok(res.rows_changed)
    }
}
