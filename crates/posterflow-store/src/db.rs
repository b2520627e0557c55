use rusqlite::Connection;

use crate::error::Result;

/// Initialise all tables for the posterflow subsystems. Safe to call on
/// every startup — CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_customers_table(conn)?;
    create_posters_table(conn)?;
    create_schedules_table(conn)?;
    Ok(())
}

fn create_customers_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS customers (
            id           TEXT NOT NULL PRIMARY KEY,
            company_name TEXT NOT NULL,
            whatsapp     TEXT,               -- NULL means no contact channel
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        ) STRICT;",
    )?;
    Ok(())
}

fn create_posters_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS posters (
            id         TEXT NOT NULL PRIMARY KEY,
            title      TEXT NOT NULL,
            category   TEXT NOT NULL,
            created_at TEXT NOT NULL
        ) STRICT;",
    )?;
    Ok(())
}

fn create_schedules_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schedules (
            id           TEXT NOT NULL PRIMARY KEY,
            customer_id  TEXT NOT NULL,
            poster_id    TEXT NOT NULL,
            category     TEXT NOT NULL,
            scheduled_at TEXT NOT NULL,   -- RFC 3339 UTC, millisecond precision
            status       TEXT NOT NULL DEFAULT 'pending',
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        ) STRICT;

        -- Efficient polling: SELECT … WHERE status = ? AND scheduled_at BETWEEN ? AND ?
        CREATE INDEX IF NOT EXISTS idx_schedules_due ON schedules (status, scheduled_at);
        ",
    )?;
    Ok(())
}
