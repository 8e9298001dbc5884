//! Ratatui front-end: a home screen with a single way in and the player
//! screen with the audio list, the now-playing panel and the import prompts.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
