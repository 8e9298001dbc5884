//! The import flow and the in-memory view of the store that screens render
//! from. Each step is awaited in order: pick, copy, probe, persist. The cover
//! prompt is a separate step the caller runs with the returned audio id.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::db::{
    audio_path_in_use, fetch_audio, fetch_images, image_path_in_use, insert_audio, insert_image,
};
use crate::importer::{probe_audio_duration, FilePicker, Importer};
use crate::models::{find_cover, AudioEntry, ImageEntry};
use crate::playback::PlaybackEngine;

/// Snapshot of both tables, reloaded after every write.
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub audio: Vec<AudioEntry>,
    pub images: Vec<ImageEntry>,
}

impl Library {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            audio: fetch_audio(conn)?,
            images: fetch_images(conn)?,
        })
    }

    pub fn cover_for(&self, audio: &AudioEntry) -> Option<&ImageEntry> {
        find_cover(audio, &self.images)
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Claim check backed by the store. A failed lookup counts as claimed.
fn claimed_by(
    conn: &Connection,
    lookup: fn(&Connection, &str) -> Result<bool>,
) -> impl Fn(&Path) -> bool + '_ {
    move |path: &Path| {
        lookup(conn, &path.to_string_lossy()).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = ?err, "could not check stored paths");
            true
        })
    }
}

/// Pick, copy, probe and persist one audio file. `Ok(None)` when the picker
/// was cancelled; nothing is written in that case. A file name already held
/// by a stored entry is rejected with `MediaError::AlreadyImported`.
pub fn import_audio_entry(
    conn: &Connection,
    importer: &Importer,
    engine: &dyn PlaybackEngine,
    picker: &mut dyn FilePicker,
) -> Result<Option<AudioEntry>> {
    let claimed = claimed_by(conn, audio_path_in_use);
    let Some(imported) = importer
        .import_audio(picker, &claimed)
        .context("failed to import audio file")?
    else {
        return Ok(None);
    };

    let duration_millis = probe_audio_duration(engine, &imported.path)
        .and_then(|duration| i64::try_from(duration.as_millis()).ok());
    let file_path = imported.path_string();
    let id = insert_audio(conn, &imported.original_name, &file_path, duration_millis)?;

    Ok(Some(AudioEntry {
        id,
        title: imported.original_name,
        file_path,
        duration_millis,
    }))
}

/// Pick and persist a cover for `audio_id`. The audio row is already stored,
/// so a failure here leaves it without a cover.
pub fn attach_cover(
    conn: &Connection,
    importer: &Importer,
    picker: &mut dyn FilePicker,
    audio_id: i64,
) -> Result<Option<ImageEntry>> {
    let claimed = claimed_by(conn, image_path_in_use);
    let Some(imported) = importer
        .import_image(picker, audio_id, &claimed)
        .context("failed to import cover image")?
    else {
        return Ok(None);
    };

    let file_path = imported.path_string();
    let id = insert_image(conn, &imported.stored_name, &file_path)?;
    Ok(Some(ImageEntry {
        id,
        title: imported.stored_name,
        file_path,
    }))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::db::{delete_audio_with_covers, open_in_memory};
    use crate::error::MediaError;
    use crate::importer::tests::{scratch_dir, write_file};
    use crate::importer::ChosenPath;
    use crate::playback::controller_tests::FakeEngine;
    use crate::playback::MediaController;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn import_without_cover_then_play_and_pause() {
        let root = scratch_dir("flow");
        let source = write_file(&root, "song.mp3", b"mpeg-ish bytes");
        let conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();
        let log = Rc::clone(&engine.log);

        let entry = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&source))
            .expect("import")
            .expect("selection");
        let cover = attach_cover(&conn, &importer, &mut ChosenPath::cancelled(), entry.id)
            .expect("cover step");
        assert!(cover.is_none());

        let library = Library::load(&conn).expect("library");
        assert_eq!(library.audio.len(), 1);
        let row = &library.audio[0];
        assert_eq!(row.title, "song.mp3");
        assert!(library.cover_for(row).is_none());
        assert_eq!(row.duration_label(), "Unknown duration");

        let mut controller = MediaController::new(engine);
        controller.load(row.clone(), None, true).expect("load");
        assert_eq!(
            controller.session().map(|s| s.entry().title.as_str()),
            Some("song.mp3")
        );
        assert!(controller.is_playing(row.id));

        controller.toggle().expect("pause");
        assert!(!controller.is_playing(row.id));
        assert_eq!(log.live.get(), 1);
    }

    #[test]
    fn probed_duration_is_persisted() {
        let root = scratch_dir("flow-duration");
        let source = write_file(&root, "intro.wav", b"RIFF....WAVE");
        let conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();
        engine
            .durations
            .borrow_mut()
            .push((root.join("audio").join("intro.wav"), Duration::from_millis(61_500)));

        let entry = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&source))
            .expect("import")
            .expect("selection");
        assert_eq!(entry.duration_millis, Some(61_500));

        let stored = Library::load(&conn).expect("library");
        assert_eq!(stored.audio[0].duration_label(), "61s");
    }

    #[test]
    fn failed_probe_still_persists_with_unknown_duration() {
        let root = scratch_dir("flow-probe-fail");
        let source = write_file(&root, "broken.mp3", b"garbage");
        let conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();
        assert!(probe_audio_duration(&engine, &source).is_none());

        let entry = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&source))
            .expect("import")
            .expect("selection");
        assert_eq!(entry.duration_millis, None);

        let stored = Library::load(&conn).expect("library");
        assert_eq!(stored.audio.len(), 1);
        assert_eq!(stored.audio[0].duration_millis, None);
        assert_eq!(stored.audio[0].duration_label(), "Unknown duration");
    }

    #[test]
    fn same_file_name_from_another_folder_is_rejected() {
        let root = scratch_dir("flow-duplicate");
        for dir in ["a", "b"] {
            std::fs::create_dir_all(root.join(dir)).expect("source dir");
        }
        let first = write_file(&root.join("a"), "song.mp3", b"FIRST TRACK");
        let second = write_file(&root.join("b"), "song.mp3", b"SECOND TRACK");
        let conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();

        let kept = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&first))
            .expect("first import")
            .expect("selection");
        let err = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&second))
            .expect_err("second song.mp3");
        assert!(matches!(
            err.downcast_ref::<MediaError>(),
            Some(MediaError::AlreadyImported(_))
        ));

        assert_eq!(std::fs::read(kept.path()).expect("copy"), b"FIRST TRACK");
        let rows = fetch_audio(&conn).expect("audio");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, kept.id);
    }

    #[test]
    fn name_is_free_again_after_its_entry_is_deleted() {
        let root = scratch_dir("flow-reimport");
        let song = write_file(&root, "song.mp3", b"mpeg-ish bytes");
        let mut conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();

        let first = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&song))
            .expect("import")
            .expect("selection");
        delete_audio_with_covers(&mut conn, first.id).expect("delete");

        let second = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&song))
            .expect("reimport")
            .expect("selection");
        assert!(second.id > first.id);
        assert_eq!(second.file_path, first.file_path);
        assert_eq!(fetch_audio(&conn).expect("audio").len(), 1);
    }

    #[test]
    fn cover_is_matched_back_to_its_audio() {
        let root = scratch_dir("flow-cover");
        let song = write_file(&root, "song.mp3", b"mpeg-ish bytes");
        let art = write_file(&root, "art.png", PNG_HEADER);
        let conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();

        let entry = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::new(&song))
            .expect("import")
            .expect("selection");
        let cover = attach_cover(&conn, &importer, &mut ChosenPath::new(&art), entry.id)
            .expect("cover")
            .expect("cover selection");
        assert_eq!(cover.title, format!("{}_art.png", entry.id));
        assert_eq!(cover.audio_id(), Some(entry.id));

        let library = Library::load(&conn).expect("library");
        assert_eq!(library.cover_for(&library.audio[0]).map(|c| c.id), Some(cover.id));
    }

    #[test]
    fn cancelled_audio_pick_writes_nothing() {
        let root = scratch_dir("flow-cancel");
        let conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();

        let entry = import_audio_entry(&conn, &importer, &engine, &mut ChosenPath::cancelled())
            .expect("import");
        assert!(entry.is_none());
        assert!(Library::load(&conn).expect("library").is_empty());
    }

    #[test]
    fn failed_copy_persists_nothing() {
        let root = scratch_dir("flow-fail");
        let conn = open_in_memory().expect("db");
        let importer = Importer::with_dirs(root.join("audio"), root.join("images"));
        let engine = FakeEngine::default();

        let result = import_audio_entry(
            &conn,
            &importer,
            &engine,
            &mut ChosenPath::new(root.join("missing.mp3")),
        );
        assert!(result.is_err());
        assert!(Library::load(&conn).expect("library").is_empty());
    }
}
