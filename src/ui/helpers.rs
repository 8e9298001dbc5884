use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{AudioEntry, ImageEntry};

pub(crate) const PLAY_GLYPH: &str = "▶";
pub(crate) const PAUSE_GLYPH: &str = "⏸";
/// Stand-in for the thumbnail when a cover is matched.
pub(crate) const COVER_GLYPH: &str = "▣";

pub(crate) fn playback_glyph(playing: bool) -> &'static str {
    if playing {
        PAUSE_GLYPH
    } else {
        PLAY_GLYPH
    }
}

/// One list row: cover marker, title, duration and play/pause glyph.
pub(crate) fn audio_row_line(
    entry: &AudioEntry,
    cover: Option<&ImageEntry>,
    playing: bool,
) -> Line<'static> {
    let marker = if cover.is_some() { COVER_GLYPH } else { " " };
    let glyph_style = if playing {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(Color::Magenta)),
        Span::styled(format!("{}  ", playback_glyph(playing)), glyph_style),
        Span::raw(entry.title.clone()),
        Span::styled(
            format!("  {}", entry.duration_label()),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
