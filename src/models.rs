//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. They stay light-weight data holders; persistence lives in `db` and the
//! playback state lives in `playback`.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
/// An imported audio file. Rows are never updated after insertion, so the
/// struct is a snapshot of what the store holds.
pub struct AudioEntry {
    /// Primary key assigned by SQLite. Cover images reference it through their
    /// title prefix.
    pub id: i64,
    /// Display name, the original file name of the picked file.
    pub title: String,
    /// Absolute path of the copy inside the private `audio/` directory.
    pub file_path: String,
    /// Length reported by the probe, absent when the file could not be
    /// introspected.
    pub duration_millis: Option<i64>,
}

impl AudioEntry {
    /// Title prefix every cover image of this entry carries, e.g. `"7_"`.
    pub fn cover_prefix(&self) -> String {
        cover_prefix(self.id)
    }

    /// Human readable duration for list rows.
    pub fn duration_label(&self) -> String {
        match self.duration_millis {
            Some(millis) if millis > 0 => format!("{}s", millis / 1000),
            _ => "Unknown duration".to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.file_path)
    }
}

impl fmt::Display for AudioEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A cover image copied alongside an audio entry. There is no foreign key: the
/// owning audio id is encoded as the `"<audioId>_"` prefix of `title`.
pub struct ImageEntry {
    pub id: i64,
    /// Stored file name, `"<audioId>_<originalName>"`.
    pub title: String,
    pub file_path: String,
}

impl ImageEntry {
    /// Parse the owning audio id out of the title prefix. Returns `None` when
    /// the title does not follow the `"<digits>_"` convention.
    pub fn audio_id(&self) -> Option<i64> {
        let (digits, _) = self.title.split_once('_')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Whether this image belongs to `audio`. The match is on the id followed
    /// by an underscore, so id 7 never claims `"17_cover.png"`.
    pub fn belongs_to(&self, audio: &AudioEntry) -> bool {
        self.title.starts_with(&audio.cover_prefix())
    }

    /// File name shown in place of the picture, without the id prefix. Titles
    /// that carry no id prefix are shown as they are.
    pub fn display_name(&self) -> &str {
        match (self.audio_id(), self.title.split_once('_')) {
            (Some(_), Some((_, rest))) => rest,
            _ => &self.title,
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.file_path)
    }
}

/// Build the title prefix linking images to the audio entry `audio_id`.
pub fn cover_prefix(audio_id: i64) -> String {
    format!("{audio_id}_")
}

/// Find the cover of `audio` with a linear scan. Images come from the store in
/// ascending id order, so the oldest matching cover wins.
pub fn find_cover<'a>(audio: &AudioEntry, images: &'a [ImageEntry]) -> Option<&'a ImageEntry> {
    images.iter().find(|image| image.belongs_to(audio))
}
