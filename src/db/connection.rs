use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Open (creating if absent) the database at `db_path` and make sure both
/// record tables exist. Safe to call on every start-up.
pub fn ensure_schema(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(db_path).context("failed to open SQLite database")?;
    create_tables(&conn)?;
    tracing::debug!(path = %db_path.display(), "database ready");
    Ok(conn)
}

/// Same schema on a throwaway in-memory database.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS audio_files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            file_path TEXT NOT NULL,
            duration INTEGER
        )",
        [],
    )
    .context("failed to create audio_files table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS image_files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            file_path TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create image_files table")?;

    Ok(())
}

/// Remove every audio and image row. Copied media files stay on disk.
pub fn clear_all(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM audio_files", [])
        .context("failed to clear audio files")?;
    conn.execute("DELETE FROM image_files", [])
        .context("failed to clear image files")?;
    tracing::info!("cleared all media records");
    Ok(())
}
