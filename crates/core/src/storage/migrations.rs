//! Schema migrations
//!
//! Versions 1 and 2 are the single-property and multi-property layouts.
//! Both stay in the schema so older owners can be migrated lazily.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, instrument};

use super::parse::format_datetime;
use crate::error::Result;

pub struct Migration {
    /// Sequential from 1
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial single-property schema",
        sql: r#"
            -- Owner accounts (local identity provider)
            CREATE TABLE IF NOT EXISTS owners (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_login TEXT
            );

            -- Sessions table
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES owners(id) ON DELETE CASCADE
            );

            -- One settings document per owner
            CREATE TABLE IF NOT EXISTS owner_settings (
                owner_id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Guests registered directly under the owner
            CREATE TABLE IF NOT EXISTS owner_guests (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                do_not_call TEXT,
                has_agency_agreement TEXT,
                broker_name TEXT NOT NULL DEFAULT '',
                company_name TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                timestamp TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add multi-property layout",
        sql: r#"
            -- Properties owned by an owner
            CREATE TABLE IF NOT EXISTS properties (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- One settings document per property
            CREATE TABLE IF NOT EXISTS property_settings (
                property_id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (property_id) REFERENCES properties(id)
            );

            -- Guests registered for a property
            CREATE TABLE IF NOT EXISTS property_guests (
                id TEXT PRIMARY KEY,
                property_id TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                do_not_call TEXT,
                has_agency_agreement TEXT,
                broker_name TEXT NOT NULL DEFAULT '',
                company_name TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                timestamp TEXT NOT NULL,
                FOREIGN KEY (property_id) REFERENCES properties(id)
            );
        "#,
    },
    Migration {
        version: 3,
        description: "Add owner preferences for active property",
        sql: r#"
            CREATE TABLE IF NOT EXISTS owner_preferences (
                owner_id TEXT PRIMARY KEY,
                last_property_id TEXT,
                updated_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 4,
        description: "Add indexes for query performance",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_owner ON sessions(owner_id);
            CREATE INDEX IF NOT EXISTS idx_owner_guests_owner ON owner_guests(owner_id);
            CREATE INDEX IF NOT EXISTS idx_properties_owner_created
                ON properties(owner_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_property_guests_property
                ON property_guests(property_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_property_guests_email
                ON property_guests(property_id, email COLLATE NOCASE);
        "#,
    },
];

fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Highest applied version, 0 for a fresh database
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Apply one migration and its bookkeeping row atomically
fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        params![
            migration.version,
            migration.description,
            format_datetime(&Utc::now())
        ],
    )?;
    tx.commit()?;
    Ok(())
}

fn run_pending(conn: &Connection, migrations: &[Migration]) -> Result<u32> {
    init_migrations_table(conn)?;
    let from = current_version(conn)?;

    let pending = migrations.iter().filter(|m| m.version > from);
    for migration in pending {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        apply(conn, migration)?;
    }

    let to = current_version(conn)?;
    if to > from {
        info!(from, to, "Database schema updated");
    }
    Ok(to)
}

/// Bring the schema up to date
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    run_pending(conn, MIGRATIONS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_fresh_database_reaches_latest() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), latest_version());

        // second run is a no-op
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn test_versions_are_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, i + 1, "{}", migration.description);
        }
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        let migrations = [
            Migration {
                version: 1,
                description: "good",
                sql: "CREATE TABLE a (id INTEGER);",
            },
            Migration {
                version: 2,
                description: "bad",
                sql: "CREATE TABLE b (id INTEGER); INSERT INTO missing VALUES (1);",
            },
        ];

        assert!(run_pending(&conn, &migrations).is_err());
        assert_eq!(current_version(&conn).unwrap(), 1);
        let b_exists: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'b'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(b_exists, 0);
    }

    #[test]
    fn test_layout_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in [
            "owner_settings",
            "owner_guests",
            "properties",
            "property_settings",
            "property_guests",
            "owner_preferences",
        ] {
            let count: u32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }
}
