use crate::library::Library;
use crate::models::AudioEntry;

/// Selection state of the player screen's audio list.
#[derive(Default)]
pub(crate) struct PlayerScreen {
    pub(crate) selected: usize,
}

impl PlayerScreen {
    pub(crate) fn current<'a>(&self, library: &'a Library) -> Option<&'a AudioEntry> {
        library.audio.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = len as isize - 1;
        let new = (self.selected as isize + offset).clamp(0, max);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Point at `id` if it is listed, otherwise clamp into range.
    pub(crate) fn focus(&mut self, library: &Library, id: Option<i64>) {
        if let Some(id) = id {
            if let Some(idx) = library.audio.iter().position(|entry| entry.id == id) {
                self.selected = idx;
                return;
            }
        }
        self.ensure_in_bounds(library.audio.len());
    }

    pub(crate) fn ensure_in_bounds(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(ids: &[i64]) -> Library {
        Library {
            audio: ids
                .iter()
                .map(|&id| AudioEntry {
                    id,
                    title: format!("{id}.mp3"),
                    file_path: format!("/a/{id}.mp3"),
                    duration_millis: None,
                })
                .collect(),
            images: Vec::new(),
        }
    }

    #[test]
    fn selection_is_clamped() {
        let mut screen = PlayerScreen::default();
        screen.move_selection(5, 3);
        assert_eq!(screen.selected, 2);
        screen.move_selection(-10, 3);
        assert_eq!(screen.selected, 0);
        screen.move_selection(1, 0);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn focus_prefers_id_then_clamps() {
        let lib = library(&[4, 9, 11]);
        let mut screen = PlayerScreen::default();
        screen.focus(&lib, Some(11));
        assert_eq!(screen.selected, 2);
        assert_eq!(screen.current(&lib).map(|e| e.id), Some(11));

        let shorter = library(&[4]);
        screen.focus(&shorter, Some(99));
        assert_eq!(screen.selected, 0);
    }
}
