use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{clear_all, delete_audio_with_covers};
use crate::importer::{ChosenPath, Importer, MediaKind};
use crate::library::{attach_cover, import_audio_entry, Library};
use crate::models::AudioEntry;
use crate::playback::{MediaController, PlaybackEngine, RodioEngine};

use super::forms::{ConfirmAudioDelete, PathPrompt};
use super::helpers::{audio_row_line, centered_rect, playback_glyph, surface_error, COVER_GLYPH};
use super::screens::PlayerScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the now-playing panel, borders included.
const NOW_PLAYING_HEIGHT: u16 = 4;

/// High-level navigation states.
enum Screen {
    Home,
    Player(PlayerScreen),
}

/// Modal overlays scoped to the player screen.
enum Mode {
    Normal,
    PickingAudio(PathPrompt),
    /// Runs right after an audio import; Esc keeps the entry without a cover.
    PickingCover {
        audio: AudioEntry,
        prompt: PathPrompt,
    },
    ConfirmDelete(ConfirmAudioDelete),
    ConfirmClear,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Composition root: owns the connection, the importer and the playback
/// controller, and re-renders from their state after every action.
pub struct App<E: PlaybackEngine = RodioEngine> {
    conn: Connection,
    importer: Importer,
    controller: MediaController<E>,
    library: Library,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl<E: PlaybackEngine> App<E> {
    pub fn new(conn: Connection, importer: Importer, engine: E) -> Result<Self> {
        let library = Library::load(&conn).context("failed to load media library")?;
        Ok(Self {
            conn,
            importer,
            controller: MediaController::new(engine),
            library,
            screen: Screen::Home,
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Handle one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::PickingAudio(prompt) => self.handle_pick_audio(code, prompt)?,
            Mode::PickingCover { audio, prompt } => self.handle_pick_cover(code, audio, prompt)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ConfirmClear => self.handle_confirm_clear(code)?,
        };

        Ok(exit)
    }

    /// Forward pasted text into an open path prompt.
    pub fn handle_paste(&mut self, text: &str) {
        match &mut self.mode {
            Mode::PickingAudio(prompt) | Mode::PickingCover { prompt, .. } => {
                prompt.push_str(text);
                prompt.error = None;
            }
            _ => {}
        }
    }

    /// Called on every loop iteration to notice tracks that played to the end.
    pub fn tick(&mut self) {
        if self.controller.poll_finished() {
            if let Some(session) = self.controller.session() {
                let title = session.entry().title.clone();
                self.set_status(format!("Finished {title}."), StatusKind::Info);
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let len = self.library.audio.len();
        if matches!(self.screen, Screen::Home) {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => *exit = true,
                KeyCode::Enter | KeyCode::Char('p') => {
                    let mut player = PlayerScreen::default();
                    player.ensure_in_bounds(len);
                    self.screen = Screen::Player(player);
                    self.clear_status();
                }
                _ => {}
            }
            return Ok(Mode::Normal);
        }
        let Screen::Player(player) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.screen = Screen::Home;
                self.clear_status();
            }
            KeyCode::Up | KeyCode::Char('k') => player.move_selection(-1, len),
            KeyCode::Down | KeyCode::Char('j') => player.move_selection(1, len),
            KeyCode::Home | KeyCode::Char('g') => player.select_first(),
            KeyCode::End | KeyCode::Char('G') => player.select_last(len),
            KeyCode::Char('u') | KeyCode::Char('+') => {
                return Ok(Mode::PickingAudio(PathPrompt::new(MediaKind::Audio)));
            }
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Char(' ') => self.toggle_playback(),
            KeyCode::Char('s') => {
                if self.controller.session().is_some() {
                    self.controller.stop();
                    self.set_status("Playback stopped.", StatusKind::Info);
                }
            }
            KeyCode::Char('o') => self.open_selected_cover(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(entry) = self.selected_entry().cloned() {
                    return Ok(Mode::ConfirmDelete(ConfirmAudioDelete { entry }));
                }
                self.set_status("No audio file selected.", StatusKind::Error);
            }
            KeyCode::Char('c') => return Ok(Mode::ConfirmClear),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_pick_audio(&mut self, code: KeyCode, mut prompt: PathPrompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Upload cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Ok(Mode::PickingAudio(prompt))
            }
            KeyCode::Enter => match self.import_audio(&prompt) {
                Ok(Some(audio)) => {
                    self.set_status(
                        format!("Added {}. Pick a cover image or press Esc to skip.", audio.title),
                        StatusKind::Info,
                    );
                    Ok(Mode::PickingCover {
                        audio,
                        prompt: PathPrompt::new(MediaKind::Image),
                    })
                }
                Ok(None) => Ok(Mode::Normal),
                Err(err) => {
                    tracing::error!(error = ?err, "audio import failed");
                    let message = surface_error(&err);
                    prompt.error = Some(message.clone());
                    self.set_status(format!("Import failed: {message}"), StatusKind::Error);
                    Ok(Mode::PickingAudio(prompt))
                }
            },
            KeyCode::Char(ch) => {
                if prompt.push_char(ch) {
                    prompt.error = None;
                }
                Ok(Mode::PickingAudio(prompt))
            }
            _ => Ok(Mode::PickingAudio(prompt)),
        }
    }

    fn handle_pick_cover(
        &mut self,
        code: KeyCode,
        audio: AudioEntry,
        mut prompt: PathPrompt,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(
                    format!("Added {} without a cover.", audio.title),
                    StatusKind::Info,
                );
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Ok(Mode::PickingCover { audio, prompt })
            }
            KeyCode::Enter => match self.import_cover(&prompt, audio.id) {
                Ok(()) => {
                    self.set_status(format!("Added cover for {}.", audio.title), StatusKind::Info);
                    Ok(Mode::Normal)
                }
                Err(err) => {
                    tracing::error!(error = ?err, audio_id = audio.id, "cover import failed");
                    let message = surface_error(&err);
                    prompt.error = Some(message.clone());
                    self.set_status(format!("Cover import failed: {message}"), StatusKind::Error);
                    Ok(Mode::PickingCover { audio, prompt })
                }
            },
            KeyCode::Char(ch) => {
                if prompt.push_char(ch) {
                    prompt.error = None;
                }
                Ok(Mode::PickingCover { audio, prompt })
            }
            _ => Ok(Mode::PickingCover { audio, prompt }),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmAudioDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm.entry) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        tracing::error!(error = ?err, id = confirm.entry.id, "delete failed");
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_confirm_clear(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Clear cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_clear() {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        tracing::error!(error = ?err, "clear failed");
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmClear)
                    }
                }
            }
            _ => Ok(Mode::ConfirmClear),
        }
    }

    fn import_audio(&mut self, prompt: &PathPrompt) -> Result<Option<AudioEntry>> {
        let path = prompt.parse_path()?;
        let mut picker = ChosenPath::new(path);
        let imported = import_audio_entry(
            &self.conn,
            &self.importer,
            self.controller.engine(),
            &mut picker,
        )?;
        if let Some(audio) = &imported {
            self.reload_library(Some(audio.id))?;
        }
        Ok(imported)
    }

    fn import_cover(&mut self, prompt: &PathPrompt, audio_id: i64) -> Result<()> {
        let path = prompt.parse_path()?;
        let mut picker = ChosenPath::new(path);
        attach_cover(&self.conn, &self.importer, &mut picker, audio_id)?;
        self.reload_library(Some(audio_id))
    }

    /// Row "tap": toggle the loaded track, or load the selected one.
    fn activate_selected(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            self.set_status("No audio file selected.", StatusKind::Error);
            return;
        };
        let is_loaded = self
            .controller
            .session()
            .is_some_and(|session| session.entry().id == entry.id);
        if is_loaded {
            self.toggle_playback();
            return;
        }

        let cover = self.library.cover_for(&entry).cloned();
        match self.controller.load(entry.clone(), cover, true) {
            Ok(()) => self.set_status(format!("Playing {}.", entry.title), StatusKind::Info),
            Err(err) => {
                tracing::error!(error = %err, id = entry.id, "failed to play audio");
                self.set_status(format!("Could not play {}: {err}", entry.title), StatusKind::Error);
            }
        }
    }

    fn toggle_playback(&mut self) {
        match self.controller.toggle() {
            Ok(true) => self.clear_status(),
            Ok(false) => self.set_status("Nothing is loaded.", StatusKind::Error),
            Err(err) => {
                tracing::error!(error = %err, "failed to resume playback");
                self.set_status(format!("Playback failed: {err}"), StatusKind::Error);
            }
        }
    }

    fn open_selected_cover(&mut self) {
        let Some(cover) = self
            .selected_entry()
            .and_then(|entry| self.library.cover_for(entry))
            .cloned()
        else {
            self.set_status("No cover for this entry.", StatusKind::Error);
            return;
        };
        if let Err(err) = open_path(cover.path()) {
            tracing::error!(error = %err, path = %cover.file_path, "failed to open cover");
            self.set_status(format!("Could not open cover: {err}"), StatusKind::Error);
        }
    }

    fn perform_delete(&mut self, entry: &AudioEntry) -> Result<()> {
        let is_loaded = self
            .controller
            .session()
            .is_some_and(|session| session.entry().id == entry.id);
        if is_loaded {
            self.controller.stop();
        }
        delete_audio_with_covers(&mut self.conn, entry.id)?;
        self.reload_library(None)?;
        self.set_status(format!("Removed {}.", entry.title), StatusKind::Info);
        Ok(())
    }

    /// Stop playback, wipe both tables and reset the in-memory session.
    fn perform_clear(&mut self) -> Result<()> {
        self.controller.stop();
        clear_all(&self.conn)?;
        self.reload_library(None)?;
        self.set_status("Database cleared.", StatusKind::Info);
        Ok(())
    }

    fn reload_library(&mut self, focus_id: Option<i64>) -> Result<()> {
        self.library = Library::load(&self.conn)?;
        if let Screen::Player(player) = &mut self.screen {
            player.focus(&self.library, focus_id);
        }
        Ok(())
    }

    fn selected_entry(&self) -> Option<&AudioEntry> {
        match &self.screen {
            Screen::Player(player) => player.current(&self.library),
            Screen::Home => None,
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Home => self.draw_home(frame, content_area),
            Screen::Player(player) => self.draw_player(frame, content_area, player),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::PickingAudio(prompt) => self.draw_path_prompt(frame, area, prompt),
            Mode::PickingCover { prompt, .. } => self.draw_path_prompt(frame, area, prompt),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ConfirmClear => self.draw_confirm_clear(frame, area),
            Mode::Normal => {}
        }
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect) {
        let count = self.library.audio.len();
        let noun = if count == 1 { "track" } else { "tracks" };
        let lines = vec![
            Line::from(Span::styled(
                "Pocket Player",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("{count} {noun} in your library")),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter to open the player",
                Style::default().fg(Color::Cyan),
            )),
        ];
        let inner = centered_rect(60, 40, area);
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, inner);
    }

    fn draw_player(&self, frame: &mut Frame, area: Rect, player: &PlayerScreen) {
        let panel_height = if self.controller.session().is_some() {
            NOW_PLAYING_HEIGHT
        } else {
            0
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(panel_height)])
            .split(area);

        self.draw_audio_list(frame, chunks[0], player);
        if panel_height > 0 {
            self.draw_now_playing(frame, chunks[1]);
        }
    }

    fn draw_audio_list(&self, frame: &mut Frame, area: Rect, player: &PlayerScreen) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Audio Files");

        if self.library.is_empty() {
            let message = Paragraph::new("No audio files yet. Press 'u' to upload one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .library
            .audio
            .iter()
            .map(|entry| {
                let cover = self.library.cover_for(entry);
                ListItem::new(audio_row_line(
                    entry,
                    cover,
                    self.controller.is_playing(entry.id),
                ))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(player.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_now_playing(&self, frame: &mut Frame, area: Rect) {
        let Some(session) = self.controller.session() else {
            return;
        };
        let block = Block::default().borders(Borders::ALL).title("Now Playing");

        let mut lines = vec![Line::from(vec![
            Span::raw(format!("Now Playing: {}  ", session.entry().title)),
            Span::styled(
                playback_glyph(session.is_playing()),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];
        if let Some(cover) = session.cover() {
            lines.push(Line::from(Span::styled(
                format!("{COVER_GLYPH} {}", cover.display_name()),
                Style::default().fg(Color::Magenta),
            )));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match (&self.screen, &self.mode) {
            (_, Mode::PickingAudio(_)) | (_, Mode::PickingCover { .. }) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Import   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::ConfirmDelete(_)) | (_, Mode::ConfirmClear) => Line::from(vec![
                Span::styled("[Y]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[N/Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (Screen::Home, _) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Open Player   "),
                Span::styled("[Q]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Player(_), _) => Line::from(vec![
                Span::styled("[U]", key_style),
                Span::raw(" Upload   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Play/Pause   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Toggle   "),
                Span::styled("[S]", key_style),
                Span::raw(" Stop   "),
                Span::styled("[O]", key_style),
                Span::raw(" Cover   "),
                Span::styled("[D]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[C]", key_style),
                Span::raw(" Clear All   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Home"),
            ]),
        }
    }

    fn draw_path_prompt(&self, frame: &mut Frame, area: Rect, prompt: &PathPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(prompt.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![prompt.build_line(), Line::from("")];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            let hint = match prompt.kind {
                MediaKind::Audio => "Enter to import • Esc to cancel",
                MediaKind::Image => "Enter to attach • Esc to skip",
            };
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = prompt.cursor_column(inner.x);
        frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmAudioDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Remove {}?", confirm.entry.title)),
            Line::from("Its cover entry is removed too. Copied files stay on disk."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_clear(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Clear All Data")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Red));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Remove all {} audio entries and their covers?",
                self.library.audio.len()
            )),
            Line::from("Playback stops. This cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}
