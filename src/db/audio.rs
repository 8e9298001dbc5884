use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{cover_prefix, AudioEntry};

fn audio_from_row(row: &Row<'_>) -> rusqlite::Result<AudioEntry> {
    Ok(AudioEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        file_path: row.get(2)?,
        duration_millis: row.get(3)?,
    })
}

/// Every audio entry in insertion order.
pub fn fetch_audio(conn: &Connection) -> Result<Vec<AudioEntry>> {
    let mut stmt = conn
        .prepare("SELECT id, title, file_path, duration FROM audio_files ORDER BY id ASC")
        .context("failed to prepare audio query")?;

    let entries = stmt
        .query_map([], audio_from_row)
        .context("failed to load audio files")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect audio files")?;

    Ok(entries)
}

pub fn find_audio(conn: &Connection, id: i64) -> Result<Option<AudioEntry>> {
    conn.query_row(
        "SELECT id, title, file_path, duration FROM audio_files WHERE id = ?1",
        params![id],
        audio_from_row,
    )
    .optional()
    .context("failed to look up audio file")
}

/// Whether any audio row points at `file_path`.
pub fn audio_path_in_use(conn: &Connection, file_path: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM audio_files WHERE file_path = ?1)",
        params![file_path],
        |row| row.get(0),
    )
    .context("failed to check audio file path")
}

/// Persist a new audio entry and return the id SQLite assigned to it.
pub fn insert_audio(
    conn: &Connection,
    title: &str,
    file_path: &str,
    duration_millis: Option<i64>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO audio_files (title, file_path, duration) VALUES (?1, ?2, ?3)",
        params![title, file_path, duration_millis],
    )
    .context("failed to insert audio file")?;

    Ok(conn.last_insert_rowid())
}

/// Delete one audio row. Missing ids are ignored.
pub fn delete_audio(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM audio_files WHERE id = ?1", params![id])
        .context("failed to delete audio file")?;
    Ok(())
}

/// Delete an audio row together with every cover whose title carries its
/// `"<id>_"` prefix. Both deletes run in one transaction.
pub fn delete_audio_with_covers(conn: &mut Connection, id: i64) -> Result<usize> {
    let tx = conn.transaction().context("failed to start transaction")?;
    tx.execute("DELETE FROM audio_files WHERE id = ?1", params![id])
        .context("failed to delete audio file")?;
    // `_` is a LIKE wildcard, so match the prefix with substr instead.
    let prefix = cover_prefix(id);
    let covers = tx
        .execute(
            "DELETE FROM image_files WHERE substr(title, 1, length(?1)) = ?1",
            params![prefix],
        )
        .context("failed to delete cover images")?;
    tx.commit().context("failed to commit delete")?;
    Ok(covers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fetch_images, insert_image, open_in_memory};

    #[test]
    fn inserted_audio_is_listed_with_increasing_ids() {
        let conn = open_in_memory().expect("db");
        let first = insert_audio(&conn, "one.mp3", "/a/one.mp3", Some(1200)).expect("first");
        let second = insert_audio(&conn, "two.mp3", "/a/two.mp3", None).expect("second");
        assert!(second > first);

        let listed = fetch_audio(&conn).expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[0].title, "one.mp3");
        assert_eq!(listed[0].file_path, "/a/one.mp3");
        assert_eq!(listed[0].duration_millis, Some(1200));
        assert_eq!(listed[1].title, "two.mp3");
        assert_eq!(listed[1].duration_millis, None);
    }

    #[test]
    fn ids_keep_increasing_after_deletes() {
        let conn = open_in_memory().expect("db");
        let first = insert_audio(&conn, "one.mp3", "/a/one.mp3", None).expect("first");
        delete_audio(&conn, first).expect("delete");
        let second = insert_audio(&conn, "two.mp3", "/a/two.mp3", None).expect("second");
        assert!(second > first);
    }

    #[test]
    fn deleting_missing_audio_is_a_no_op() {
        let conn = open_in_memory().expect("db");
        insert_audio(&conn, "one.mp3", "/a/one.mp3", None).expect("insert");
        delete_audio(&conn, 999).expect("delete missing");
        assert_eq!(fetch_audio(&conn).expect("list").len(), 1);
    }

    #[test]
    fn path_in_use_follows_rows() {
        let conn = open_in_memory().expect("db");
        let id = insert_audio(&conn, "one.mp3", "/a/one.mp3", None).expect("insert");
        assert!(audio_path_in_use(&conn, "/a/one.mp3").expect("check"));
        assert!(!audio_path_in_use(&conn, "/a/two.mp3").expect("check"));

        delete_audio(&conn, id).expect("delete");
        assert!(!audio_path_in_use(&conn, "/a/one.mp3").expect("check"));
    }

    #[test]
    fn find_audio_returns_none_for_unknown_id() {
        let conn = open_in_memory().expect("db");
        let id = insert_audio(&conn, "one.mp3", "/a/one.mp3", None).expect("insert");
        assert_eq!(find_audio(&conn, id).expect("find").map(|a| a.id), Some(id));
        assert!(find_audio(&conn, id + 1).expect("find").is_none());
    }

    #[test]
    fn delete_with_covers_leaves_other_prefixes_alone() {
        let mut conn = open_in_memory().expect("db");
        let id = insert_audio(&conn, "one.mp3", "/a/one.mp3", None).expect("insert");
        insert_image(&conn, &format!("{id}_cover.png"), "/i/a.png").expect("own cover");
        insert_image(&conn, &format!("{id}2_cover.png"), "/i/b.png").expect("other cover");
        insert_image(&conn, "1x2_cover.png", "/i/c.png").expect("unrelated");

        let removed = delete_audio_with_covers(&mut conn, id).expect("delete");
        assert_eq!(removed, 1);
        assert!(fetch_audio(&conn).expect("audio").is_empty());
        let remaining: Vec<String> = fetch_images(&conn)
            .expect("images")
            .into_iter()
            .map(|image| image.title)
            .collect();
        assert_eq!(remaining, vec![format!("{id}2_cover.png"), "1x2_cover.png".to_string()]);
    }
}
