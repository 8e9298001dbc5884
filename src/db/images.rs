use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::ImageEntry;

/// Every image entry in insertion order.
pub fn fetch_images(conn: &Connection) -> Result<Vec<ImageEntry>> {
    let mut stmt = conn
        .prepare("SELECT id, title, file_path FROM image_files ORDER BY id ASC")
        .context("failed to prepare image query")?;

    let entries = stmt
        .query_map([], |row| {
            Ok(ImageEntry {
                id: row.get(0)?,
                title: row.get(1)?,
                file_path: row.get(2)?,
            })
        })
        .context("failed to load image files")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect image files")?;

    Ok(entries)
}

/// Whether any image row points at `file_path`.
pub fn image_path_in_use(conn: &Connection, file_path: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM image_files WHERE file_path = ?1)",
        params![file_path],
        |row| row.get(0),
    )
    .context("failed to check image file path")
}

/// Persist a new image entry. `title` must already carry the `"<audioId>_"`
/// prefix; the importer builds it.
pub fn insert_image(conn: &Connection, title: &str, file_path: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO image_files (title, file_path) VALUES (?1, ?2)",
        params![title, file_path],
    )
    .context("failed to insert image file")?;

    Ok(conn.last_insert_rowid())
}

/// Delete one image row. Missing ids are ignored.
pub fn delete_image(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM image_files WHERE id = ?1", params![id])
        .context("failed to delete image file")?;
    Ok(())
}
