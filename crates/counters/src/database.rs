//! SQLite storage over `rusqlite`.
//!
//! [`Database`] implements both execution surfaces. The connection sits behind
//! a mutex; the async surface runs the blocking call on tokio's blocking pool,
//! so statements are serialized per database handle.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use rusqlite::{Connection, ToSql, params_from_iter};

use crate::client::{AsyncExecutor, Executor, NonSelectResult, Params};
use crate::config::{DatabaseConfig, DatabaseLocation};
use crate::error::{StoreError, StoreResult};
use crate::migrate;
use crate::monitor::{QueryContext, TracingSqlHook};
use crate::qb::param::Value;
use crate::row::Row;

/// Named params as rusqlite expects them: names carry their `:` prefix.
fn named_binding(pairs: &[(String, Value)]) -> (Vec<String>, Vec<&Value>) {
    pairs
        .iter()
        .map(|(name, value)| (format!(":{name}"), value))
        .unzip()
}

fn collect_rows(mut stmt: rusqlite::Statement<'_>, params: &Params) -> rusqlite::Result<Vec<Row>> {
    let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = match params {
        Params::Positional(values) => stmt.query(params_from_iter(values.iter()))?,
        Params::Named(pairs) => {
            let (names, values) = named_binding(pairs);
            let bound: Vec<(&str, &dyn ToSql)> = names
                .iter()
                .zip(values)
                .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
                .collect();
            stmt.query(bound.as_slice())?
        }
    };

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let values = (0..width)
            .map(|idx| row.get::<_, Value>(idx))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        out.push(Row::new(Arc::clone(&columns), values));
    }
    Ok(out)
}

/// Run a row-returning statement on a connection.
pub(crate) fn select_on(conn: &Connection, sql: &str, params: &Params) -> rusqlite::Result<Vec<Row>> {
    let stmt = conn.prepare(sql)?;
    collect_rows(stmt, params)
}

/// Run a statement that returns no rows on a connection.
pub(crate) fn non_select_on(
    conn: &Connection,
    sql: &str,
    params: &Params,
) -> rusqlite::Result<NonSelectResult> {
    let mut stmt = conn.prepare(sql)?;
    let changed = match params {
        Params::Positional(values) => stmt.execute(params_from_iter(values.iter()))?,
        Params::Named(pairs) => {
            let (names, values) = named_binding(pairs);
            let bound: Vec<(&str, &dyn ToSql)> = names
                .iter()
                .zip(values)
                .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
                .collect();
            stmt.execute(bound.as_slice())?
        }
    };
    Ok(NonSelectResult {
        last_insert_id: conn.last_insert_rowid(),
        rows_changed: changed as u64,
    })
}

struct Inner {
    conn: Mutex<Connection>,
    hook: TracingSqlHook,
}

/// A SQLite database handle. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("log", self.inner.hook.config())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the configured database, apply pragmas and
    /// run pending migrations.
    pub fn open(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut conn = match &config.location {
            DatabaseLocation::InMemory => Connection::open_in_memory(),
            DatabaseLocation::File(path) => {
                if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir).map_err(|e| {
                        StoreError::Connection(format!("cannot create {}: {e}", dir.display()))
                    })?;
                }
                Connection::open(path)
            }
        }
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::apply_pragmas(&conn, config)?;
        migrate::run(&mut conn)?;

        tracing::info!(target: "counters.sql", location = ?config.location, "database opened");
        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                hook: TracingSqlHook::new(config.log.clone()),
            }),
        })
    }

    /// Open a private in-memory database with the default configuration.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(&DatabaseConfig::in_memory())
    }

    fn apply_pragmas(conn: &Connection, config: &DatabaseConfig) -> StoreResult<()> {
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        // journal_mode reports the mode actually in effect; in-memory databases stay "memory".
        let journal: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode.as_str(),
            |row| row.get(0),
        )?;
        conn.pragma_update(None, "synchronous", config.synchronous.as_str())?;
        tracing::debug!(
            target: "counters.sql",
            foreign_keys = config.foreign_keys,
            journal_mode = %journal,
            synchronous = config.synchronous.as_str(),
            "pragmas applied"
        );
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.inner
            .conn
            .lock()
            .map_err(|_| StoreError::Connection("connection mutex poisoned".to_string()))
    }

    /// Versions recorded in the `migrations` table.
    pub fn applied_migrations(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        Ok(migrate::applied(&conn)?)
    }

    fn observe<T>(
        &self,
        sql: &str,
        params: &Params,
        rows: impl Fn(&T) -> u64,
        run: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        let start = Instant::now();
        let result = {
            let conn = self.lock()?;
            run(&conn)
        };

        let mut ctx = QueryContext::new(sql, params);
        ctx.elapsed = start.elapsed();
        ctx.rows = result.as_ref().ok().map(&rows);
        self.inner.hook.after_query(&ctx);

        result.map_err(|err| {
            tracing::warn!(target: "counters.sql", error = %err, "statement failed");
            StoreError::from_db_error(err)
        })
    }
}

impl Executor for Database {
    fn execute_select(&self, sql: &str, params: &Params) -> StoreResult<Vec<Row>> {
        self.observe(
            sql,
            params,
            |rows: &Vec<Row>| rows.len() as u64,
            |conn| select_on(conn, sql, params),
        )
    }

    fn execute_non_select(&self, sql: &str, params: &Params) -> StoreResult<NonSelectResult> {
        self.observe(
            sql,
            params,
            |res: &NonSelectResult| res.rows_changed,
            |conn| non_select_on(conn, sql, params),
        )
    }
}

impl AsyncExecutor for Database {
    fn execute_select_async(
        &self,
        sql: String,
        params: Params,
    ) -> impl std::future::Future<Output = StoreResult<Vec<Row>>> + Send {
        let db = self.clone();
        async move { tokio::task::spawn_blocking(move || db.execute_select(&sql, &params)).await? }
    }

    fn execute_non_select_async(
        &self,
        sql: String,
        params: Params,
    ) -> impl std::future::Future<Output = StoreResult<NonSelectResult>> + Send {
        let db = self.clone();
        async move {
            tokio::task::spawn_blocking(move || db.execute_non_select(&sql, &params)).await?
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_applies_migrations() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            db.applied_migrations().unwrap(),
            vec!["initial_schema".to_string(), "custom_days".to_string()]
        );
    }

    #[test]
    fn positional_and_named_params() {
        let db = Database::open_in_memory().unwrap();
        let res = db
            .execute_non_select(
                r#"INSERT INTO "counters" ("title", "goal", "interval") VALUES (?, ?, ?)"#,
                &Params::Positional(vec![Value::from("Run"), Value::Integer(1), Value::Integer(0)]),
            )
            .unwrap();
        assert_eq!(res.rows_changed, 1);
        assert_eq!(res.last_insert_id, 1);

        let rows = db
            .execute_select(
                r#"SELECT "title", "days" FROM "counters" WHERE "id" = :id"#,
                &Params::named([("id", 1)]),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].try_get::<String>("title").unwrap(), "Run");
        assert_eq!(rows[0].try_get::<Option<i64>>("days").unwrap(), None);
    }

    #[test]
    fn foreign_key_violation_is_constraint() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .execute_non_select(
                r#"INSERT INTO "entries" ("counter_id", "created") VALUES (?, ?)"#,
                &Params::from(vec![Value::Integer(42), Value::Integer(0)]),
            )
            .unwrap_err();
        assert!(err.is_constraint(), "{err:?}");
    }

    #[test]
    fn syntax_error_is_query_error() {
        let db = Database::open_in_memory().unwrap();
        let err = db.execute_select("SELEC 1", &Params::none()).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn async_surface_matches_blocking() {
        let db = Database::open_in_memory().unwrap();
        db.execute_non_select_async(
            r#"INSERT INTO "counters" ("title") VALUES (?)"#.to_string(),
            Params::from(vec![Value::from("A")]),
        )
        .await
        .unwrap();

        let sql = r#"SELECT count(*) AS n FROM "counters""#;
        let blocking = db.execute_select(sql, &Params::none()).unwrap();
        let async_rows = db
            .execute_select_async(sql.to_string(), Params::none())
            .await
            .unwrap();
        assert_eq!(blocking, async_rows);
        assert_eq!(blocking[0].try_get::<i64>("n").unwrap(), 1);
    }
}
