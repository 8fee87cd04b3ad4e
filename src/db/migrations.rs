use anyhow::Context;
use rusqlite::Connection;

// Embedded so the binary and tests need no migrations directory on disk.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_resources",
        "CREATE TABLE resources (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    ),
    (
        "0002_slot_templates",
        "CREATE TABLE slot_templates (
            id TEXT NOT NULL,
            resource_id TEXT NOT NULL REFERENCES resources(id),
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            days TEXT,
            PRIMARY KEY (resource_id, id)
        );",
    ),
    (
        "0003_reservations",
        "CREATE TABLE reservations (
            id TEXT PRIMARY KEY,
            resource_id TEXT NOT NULL REFERENCES resources(id),
            date TEXT NOT NULL,
            slot_id TEXT NOT NULL,
            requester_id TEXT NOT NULL,
            status TEXT NOT NULL,
            hold_expires_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX idx_reservations_triple
            ON reservations (resource_id, date, slot_id);
        CREATE INDEX idx_reservations_requester
            ON reservations (requester_id);",
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
