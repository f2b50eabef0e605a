//! Embedded schema migrations.
//!
//! Applied versions are recorded in the `migrations` table. Each pending
//! migration runs in its own transaction together with its version row.

use rusqlite::{Connection, named_params};

use crate::client::Params;
use crate::database::non_select_on;
use crate::error::StoreResult;

const MIGRATIONS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS "migrations" ("version" TEXT NOT NULL)"#;
const APPLIED_MIGRATIONS: &str = r#"SELECT "version" FROM "migrations""#;
const RECORD_MIGRATION: &str = r#"INSERT INTO "migrations" ("version") VALUES (:version)"#;

/// One SQL statement of a migration, with optional `:name` params.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStatement {
    pub sql: &'static str,
    pub params: &'static [(&'static str, i64)],
}

impl MigrationStatement {
    const fn plain(sql: &'static str) -> Self {
        Self { sql, params: &[] }
    }
}

/// A named, ordered schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: &'static str,
    pub statements: &'static [MigrationStatement],
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "initial_schema",
        statements: &[
            MigrationStatement::plain(
                r#"CREATE TABLE IF NOT EXISTS "counters" (
                    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                    "title" TEXT NOT NULL,
                    "goal" INTEGER NOT NULL DEFAULT 0,
                    "interval" INTEGER NOT NULL DEFAULT 0
                )"#,
            ),
            MigrationStatement::plain(
                r#"CREATE TABLE IF NOT EXISTS "entries" (
                    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                    "counter_id" INTEGER NOT NULL,
                    "created" INTEGER NOT NULL,
                    FOREIGN KEY ("counter_id") REFERENCES "counters" ("id") ON DELETE CASCADE
                )"#,
            ),
        ],
    },
    Migration {
        version: "custom_days",
        statements: &[
            MigrationStatement::plain(r#"ALTER TABLE "counters" ADD COLUMN "days" INTEGER"#),
            // Existing daily counters count every weekday.
            MigrationStatement {
                sql: r#"UPDATE "counters" SET "days" = :days WHERE "interval" = :interval"#,
                params: &[(":days", 127), (":interval", 0)],
            },
        ],
    },
];

/// Versions recorded in the `migrations` table.
pub(crate) fn applied(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    conn.execute_batch(MIGRATIONS_TABLE)?;
    let mut stmt = conn.prepare(APPLIED_MIGRATIONS)?;
    let versions = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(versions)
}

/// Apply every pending migration. Returns the versions applied by this call.
pub(crate) fn run(conn: &mut Connection) -> StoreResult<Vec<&'static str>> {
    let done = applied(conn)?;
    let mut ran = Vec::new();

    for migration in MIGRATIONS {
        if done.iter().any(|version| version == migration.version) {
            continue;
        }

        let tx = conn.transaction()?;
        for statement in migration.statements {
            if statement.params.is_empty() {
                tx.execute_batch(statement.sql)?;
            } else {
                let params = Params::named(statement.params.iter().copied());
                non_select_on(&tx, statement.sql, &params)?;
            }
        }
        tx.execute(RECORD_MIGRATION, named_params! { ":version": migration.version })?;
        tx.commit()?;

        tracing::info!(target: "counters.migrate", version = migration.version, "applied migration");
        ran.push(migration.version);
    }

    if ran.is_empty() {
        tracing::debug!(target: "counters.migrate", "schema up to date");
    }
    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(run(&mut conn).unwrap(), vec!["initial_schema", "custom_days"]);
        assert!(run(&mut conn).unwrap().is_empty());
        assert_eq!(applied(&conn).unwrap(), vec!["initial_schema", "custom_days"]);
    }

    #[test]
    fn custom_days_backfills_daily_counters() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS_TABLE).unwrap();
        let tx = conn.transaction().unwrap();
        for statement in MIGRATIONS[0].statements {
            tx.execute_batch(statement.sql).unwrap();
        }
        tx.execute(RECORD_MIGRATION, named_params! { ":version": "initial_schema" })
            .unwrap();
        tx.execute_batch(
            r#"INSERT INTO "counters" ("title", "goal", "interval") VALUES ('Daily', 1, 0), ('Weekly', 1, 1)"#,
        )
        .unwrap();
        tx.commit().unwrap();

        assert_eq!(run(&mut conn).unwrap(), vec!["custom_days"]);
        let days: Vec<Option<i64>> = conn
            .prepare(r#"SELECT "days" FROM "counters" ORDER BY "id""#)
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(days, vec![Some(127), None]);
    }
}
