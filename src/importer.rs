//! Copy-on-import of picked media files into the private data directory.
//!
//! The picker is a trait so the TUI prompt, a scripted caller and tests can all
//! feed the same import code. Cancelling the picker is a normal empty result,
//! never an error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use infer::{Infer, MatcherType};
use mime_guess::MimeGuess;

use crate::config::AppPaths;
use crate::error::{MediaError, MediaResult};
use crate::models::cover_prefix;
use crate::playback::PlaybackEngine;

/// Content class a picker is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Image => write!(f, "image"),
        }
    }
}

/// Source of user-chosen files. `Ok(None)` means the user cancelled.
#[cfg_attr(test, mockall::automock)]
pub trait FilePicker {
    fn pick(&mut self, kind: MediaKind) -> MediaResult<Option<PathBuf>>;
}

/// Picker that hands out a path chosen ahead of time, e.g. typed into the TUI
/// prompt. It answers exactly once; later calls behave like a cancel.
#[derive(Debug, Default)]
pub struct ChosenPath(Option<PathBuf>);

impl ChosenPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    pub fn cancelled() -> Self {
        Self(None)
    }
}

impl FilePicker for ChosenPath {
    fn pick(&mut self, _kind: MediaKind) -> MediaResult<Option<PathBuf>> {
        Ok(self.0.take())
    }
}

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    /// Where the copy now lives.
    pub path: PathBuf,
    /// File name as picked, before any prefixing.
    pub original_name: String,
    /// File name of the copy (`"<audioId>_<name>"` for covers).
    pub stored_name: String,
}

impl ImportedFile {
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Answers whether a stored row still points at a copied file.
pub type ClaimCheck<'a> = &'a dyn Fn(&Path) -> bool;

/// Copies picked files into `audio/` and `images/`. A stored name is never
/// reused while a row still claims it; copies left behind by a delete or a
/// clear are unclaimed and get replaced.
#[derive(Debug, Clone)]
pub struct Importer {
    audio_dir: PathBuf,
    images_dir: PathBuf,
}

impl Importer {
    pub fn new(paths: &AppPaths) -> Self {
        Self::with_dirs(paths.audio_dir(), paths.images_dir())
    }

    pub fn with_dirs(audio_dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            images_dir: images_dir.into(),
        }
    }

    /// Pick an audio file and copy it, keeping its original name.
    pub fn import_audio(
        &self,
        picker: &mut dyn FilePicker,
        claimed: ClaimCheck<'_>,
    ) -> MediaResult<Option<ImportedFile>> {
        let Some(source) = picker.pick(MediaKind::Audio)? else {
            tracing::debug!("audio pick cancelled");
            return Ok(None);
        };
        let original_name = file_name(&source)?;
        ensure_kind(&source, MediaKind::Audio)?;
        let path = copy_into(&source, &self.audio_dir, &original_name, claimed)?;
        tracing::info!(file = %original_name, dest = %path.display(), "imported audio");
        Ok(Some(ImportedFile {
            path,
            stored_name: original_name.clone(),
            original_name,
        }))
    }

    /// Pick a cover image for `audio_id`. The copy is named
    /// `"<audio_id>_<original name>"`, which is how covers are matched back to
    /// their audio entry.
    pub fn import_image(
        &self,
        picker: &mut dyn FilePicker,
        audio_id: i64,
        claimed: ClaimCheck<'_>,
    ) -> MediaResult<Option<ImportedFile>> {
        let Some(source) = picker.pick(MediaKind::Image)? else {
            tracing::debug!(audio_id, "cover pick cancelled");
            return Ok(None);
        };
        let original_name = file_name(&source)?;
        ensure_kind(&source, MediaKind::Image)?;
        let stored_name = format!("{}{original_name}", cover_prefix(audio_id));
        let path = copy_into(&source, &self.images_dir, &stored_name, claimed)?;
        tracing::info!(audio_id, file = %stored_name, "imported cover image");
        Ok(Some(ImportedFile {
            path,
            original_name,
            stored_name,
        }))
    }
}

/// Ask the engine for the length of `path` without playing it. Probe failures
/// are logged and reported as an unknown duration.
pub fn probe_audio_duration(engine: &dyn PlaybackEngine, path: &Path) -> Option<Duration> {
    match engine.probe_duration(path) {
        Ok(duration) => duration,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not probe duration");
            None
        }
    }
}

/// Classify a file by magic number, falling back to its extension.
pub fn detect_kind(path: &Path) -> MediaResult<Option<MediaKind>> {
    if let Some(kind) = Infer::new().get_from_path(path)? {
        return Ok(match kind.matcher_type() {
            MatcherType::Audio => Some(MediaKind::Audio),
            MatcherType::Image => Some(MediaKind::Image),
            _ => None,
        });
    }

    let guess = MimeGuess::from_path(path).first();
    Ok(guess.and_then(|mime| match mime.type_().as_str() {
        "audio" => Some(MediaKind::Audio),
        "image" => Some(MediaKind::Image),
        _ => None,
    }))
}

fn ensure_kind(path: &Path, expected: MediaKind) -> MediaResult<()> {
    if detect_kind(path)? == Some(expected) {
        Ok(())
    } else {
        Err(MediaError::UnsupportedKind {
            path: path.to_path_buf(),
            expected,
        })
    }
}

fn file_name(path: &Path) -> MediaResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| MediaError::MissingFileName(path.to_path_buf()))
}

fn copy_into(
    source: &Path,
    dir: &Path,
    name: &str,
    claimed: ClaimCheck<'_>,
) -> MediaResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let dest = dir.join(name);
    if dest.try_exists()? {
        if claimed(&dest) {
            return Err(MediaError::AlreadyImported(dest));
        }
        // Copying a file onto itself truncates it.
        if is_same_file(source, &dest) {
            tracing::debug!(dest = %dest.display(), "adopting unclaimed copy in place");
            return Ok(dest);
        }
        tracing::info!(dest = %dest.display(), "replacing unclaimed copy");
    }
    fs::copy(source, &dest)?;
    Ok(dest)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::env;
    use std::process;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mockall::predicate::eq;

    use super::*;

    static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Fresh scratch directory under the system temp dir.
    pub(crate) fn scratch_dir(label: &str) -> PathBuf {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = env::temp_dir().join(format!(
            "pocket-player-{label}-{}-{n}",
            process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    pub(crate) fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).expect("write fixture");
        path
    }

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    fn importer_in(root: &Path) -> Importer {
        Importer::with_dirs(root.join("audio"), root.join("images"))
    }

    pub(crate) fn unclaimed(_: &Path) -> bool {
        false
    }

    #[test]
    fn audio_import_copies_with_original_name() {
        let root = scratch_dir("import-audio");
        let source = write_file(&root, "song.mp3", b"not really mpeg");
        let mut picker = MockFilePicker::new();
        picker
            .expect_pick()
            .with(eq(MediaKind::Audio))
            .times(1)
            .returning(move |_| Ok(Some(source.clone())));

        let imported = importer_in(&root)
            .import_audio(&mut picker, &unclaimed)
            .expect("import")
            .expect("selection");

        assert_eq!(imported.original_name, "song.mp3");
        assert_eq!(imported.stored_name, "song.mp3");
        assert_eq!(imported.path, root.join("audio").join("song.mp3"));
        assert_eq!(fs::read(&imported.path).expect("copy"), b"not really mpeg");
    }

    #[test]
    fn cancelled_pick_is_not_an_error() {
        let root = scratch_dir("import-cancel");
        let mut picker = MockFilePicker::new();
        picker.expect_pick().returning(|_| Ok(None));

        let importer = importer_in(&root);
        assert!(importer.import_audio(&mut picker, &unclaimed).expect("audio").is_none());
        assert!(importer.import_image(&mut picker, 3, &unclaimed).expect("image").is_none());
        assert!(!root.join("audio").exists());
        assert!(!root.join("images").exists());
    }

    #[test]
    fn image_import_prefixes_audio_id() {
        let root = scratch_dir("import-image");
        let source = write_file(&root, "cover.png", PNG_HEADER);
        let mut picker = ChosenPath::new(&source);

        let imported = importer_in(&root)
            .import_image(&mut picker, 7, &unclaimed)
            .expect("import")
            .expect("selection");

        assert_eq!(imported.original_name, "cover.png");
        assert_eq!(imported.stored_name, "7_cover.png");
        assert_eq!(imported.path, root.join("images").join("7_cover.png"));
        assert!(imported.path.exists());
    }

    #[test]
    fn wrong_content_kind_is_rejected() {
        let root = scratch_dir("import-kind");
        let source = write_file(&root, "cover.png", PNG_HEADER);
        let mut picker = ChosenPath::new(&source);

        let err = importer_in(&root)
            .import_audio(&mut picker, &unclaimed)
            .expect_err("png is not audio");
        assert!(matches!(
            err,
            MediaError::UnsupportedKind {
                expected: MediaKind::Audio,
                ..
            }
        ));
        assert!(!root.join("audio").join("cover.png").exists());
    }

    #[test]
    fn missing_source_surfaces_io_error() {
        let root = scratch_dir("import-missing");
        let mut picker = ChosenPath::new(root.join("gone.mp3"));
        let err = importer_in(&root)
            .import_audio(&mut picker, &unclaimed)
            .expect_err("missing file");
        assert!(matches!(err, MediaError::Io(_)));
    }

    #[test]
    fn chosen_path_answers_once() {
        let mut picker = ChosenPath::new("/music/a.mp3");
        assert_eq!(
            picker.pick(MediaKind::Audio).expect("first"),
            Some(PathBuf::from("/music/a.mp3"))
        );
        assert_eq!(picker.pick(MediaKind::Image).expect("second"), None);
    }

    #[test]
    fn unclaimed_copy_in_private_dir_is_adopted_untouched() {
        let root = scratch_dir("import-self");
        let audio_dir = root.join("audio");
        fs::create_dir_all(&audio_dir).expect("audio dir");
        let source = write_file(&audio_dir, "loop.wav", b"RIFF....WAVE");
        let mut picker = ChosenPath::new(&source);

        let imported = importer_in(&root)
            .import_audio(&mut picker, &unclaimed)
            .expect("import")
            .expect("selection");
        assert_eq!(fs::read(imported.path).expect("read"), b"RIFF....WAVE");
    }

    #[test]
    fn claimed_name_is_rejected_and_copy_kept() {
        let root = scratch_dir("import-claimed");
        let first = root.join("a");
        let second = root.join("b");
        fs::create_dir_all(&first).expect("dir a");
        fs::create_dir_all(&second).expect("dir b");
        let importer = importer_in(&root);
        let claimed = |_: &Path| true;

        let kept = importer
            .import_audio(
                &mut ChosenPath::new(write_file(&first, "song.mp3", b"FIRST TRACK")),
                &unclaimed,
            )
            .expect("first import")
            .expect("selection");

        let err = importer
            .import_audio(
                &mut ChosenPath::new(write_file(&second, "song.mp3", b"SECOND TRACK")),
                &claimed,
            )
            .expect_err("name already taken");
        assert!(matches!(&err, MediaError::AlreadyImported(path) if *path == kept.path));

        let again = importer
            .import_audio(&mut ChosenPath::new(&kept.path), &claimed)
            .expect_err("same file is taken too");
        assert!(matches!(again, MediaError::AlreadyImported(_)));
        assert_eq!(fs::read(&kept.path).expect("read"), b"FIRST TRACK");
    }

    #[test]
    fn unclaimed_leftover_is_replaced() {
        let root = scratch_dir("import-leftover");
        let audio_dir = root.join("audio");
        fs::create_dir_all(&audio_dir).expect("audio dir");
        write_file(&audio_dir, "song.mp3", b"OLD");
        let source = write_file(&root, "song.mp3", b"NEW");

        let imported = importer_in(&root)
            .import_audio(&mut ChosenPath::new(&source), &unclaimed)
            .expect("import")
            .expect("selection");
        assert_eq!(fs::read(imported.path).expect("read"), b"NEW");
    }
}
