use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    create_response_cache_table(conn)?;
    Ok(())
}

fn create_response_cache_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS response_cache (
            key TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create response_cache table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_response_cache_fetched_at ON response_cache(fetched_at)",
        [],
    )
    .context("Failed to create response_cache index")?;

    Ok(())
}
