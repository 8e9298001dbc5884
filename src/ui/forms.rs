use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::importer::MediaKind;
use crate::models::AudioEntry;

/// Label rendered in front of the typed path.
const PATH_LABEL: &str = "Path: ";

/// Modal that stands in for the document picker: the user types or pastes a
/// path, Enter picks it and Esc cancels.
#[derive(Clone)]
pub(crate) struct PathPrompt {
    pub(crate) kind: MediaKind,
    pub(crate) value: String,
    pub(crate) error: Option<String>,
}

impl PathPrompt {
    pub(crate) fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            value: String::new(),
            error: None,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.kind {
            MediaKind::Audio => "Upload Audio File",
            MediaKind::Image => "Add Cover Image",
        }
    }

    /// Append a typed or pasted character.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        true
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_char(ch);
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    /// Turn the typed text into a path. Terminals quote dropped files and
    /// users type `~`, so both are handled.
    pub(crate) fn parse_path(&self) -> Result<PathBuf> {
        let mut raw = self.value.trim();
        for quote in ['\'', '"'] {
            if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
                raw = &raw[1..raw.len() - 1];
            }
        }
        if raw.is_empty() {
            return Err(anyhow!("Enter a file path or press Esc to cancel."));
        }

        if let Some(rest) = raw.strip_prefix("~/") {
            if let Some(dirs) = BaseDirs::new() {
                return Ok(dirs.home_dir().join(rest));
            }
        }
        Ok(PathBuf::from(raw))
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        let (display, style) = if self.value.is_empty() {
            (
                "<path to file>".to_string(),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            (self.value.clone(), Style::default().fg(Color::Yellow))
        };
        Line::from(vec![Span::raw(PATH_LABEL), Span::styled(display, style)])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Column just past the typed text when the line starts at `origin`.
    /// Long pastes pin to `u16::MAX` instead of wrapping.
    pub(crate) fn cursor_column(&self, origin: u16) -> u16 {
        let typed = u16::try_from(PATH_LABEL.len() + self.value_len()).unwrap_or(u16::MAX);
        origin.saturating_add(typed)
    }
}

/// Confirmation state for removing one audio entry and its covers.
#[derive(Clone)]
pub(crate) struct ConfirmAudioDelete {
    pub(crate) entry: AudioEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_paths_are_unwrapped() {
        let mut prompt = PathPrompt::new(MediaKind::Audio);
        prompt.push_str("  '/music/my song.mp3' ");
        assert_eq!(
            prompt.parse_path().expect("path"),
            PathBuf::from("/music/my song.mp3")
        );
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let mut prompt = PathPrompt::new(MediaKind::Image);
        prompt.push_str("   ");
        assert!(prompt.parse_path().is_err());
        prompt.value = "\"\"".into();
        assert!(prompt.parse_path().is_err());
    }

    #[test]
    fn control_characters_are_ignored() {
        let mut prompt = PathPrompt::new(MediaKind::Audio);
        assert!(!prompt.push_char('\n'));
        assert!(prompt.push_char('a'));
        prompt.backspace();
        assert_eq!(prompt.value_len(), 0);
    }

    #[test]
    fn cursor_column_saturates_on_long_paste() {
        let mut prompt = PathPrompt::new(MediaKind::Audio);
        prompt.push_str("/a.mp3");
        assert_eq!(prompt.cursor_column(2), 2 + 6 + 6);

        prompt.value = "x".repeat(70_000);
        assert_eq!(prompt.cursor_column(10), u16::MAX);
    }
}
