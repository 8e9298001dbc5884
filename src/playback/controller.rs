use std::fmt;

use super::engine::{LoadedTrack, PlaybackEngine};
use crate::error::MediaResult;
use crate::models::{AudioEntry, ImageEntry};

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    /// The engine drained the track. The resource stays loaded; playing again
    /// reloads it from the start.
    Finished,
}

/// The one loaded track plus what the UI shows about it.
pub struct PlaybackSession {
    track: Box<dyn LoadedTrack>,
    entry: AudioEntry,
    cover: Option<ImageEntry>,
    playing: bool,
    finished: bool,
}

impl PlaybackSession {
    pub fn entry(&self) -> &AudioEntry {
        &self.entry
    }

    pub fn cover(&self) -> Option<&ImageEntry> {
        self.cover.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("entry", &self.entry)
            .field("cover", &self.cover)
            .field("playing", &self.playing)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Owns the engine and at most one session. Loading always stops and drops
/// the previous track before the engine decodes the next one.
pub struct MediaController<E> {
    engine: E,
    session: Option<PlaybackSession>,
}

impl<E: PlaybackEngine> MediaController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            session: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        match &self.session {
            None => PlaybackState::Idle,
            Some(session) if session.finished => PlaybackState::Finished,
            Some(session) if session.playing => PlaybackState::Playing,
            Some(_) => PlaybackState::Paused,
        }
    }

    /// Whether `entry_id` is the loaded track and currently playing.
    pub fn is_playing(&self, entry_id: i64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.entry.id == entry_id && session.playing)
    }

    /// Replace the current session with `entry`. If decoding fails the
    /// controller is left idle, never with two tracks.
    pub fn load(
        &mut self,
        entry: AudioEntry,
        cover: Option<ImageEntry>,
        autoplay: bool,
    ) -> MediaResult<()> {
        self.stop();

        let mut track = self.engine.load(entry.path())?;
        if autoplay {
            track.play();
        }
        tracing::info!(id = entry.id, title = %entry.title, autoplay, "loaded track");
        self.session = Some(PlaybackSession {
            track,
            entry,
            cover,
            playing: autoplay,
            finished: false,
        });
        Ok(())
    }

    /// Start or resume output. A finished track is reloaded from the start.
    /// Returns false when nothing is loaded.
    pub fn play(&mut self) -> MediaResult<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if session.finished {
            let entry = session.entry.clone();
            let cover = session.cover.clone();
            self.load(entry, cover, true)?;
            return Ok(true);
        }
        session.track.play();
        session.playing = true;
        Ok(true)
    }

    /// Pause output without unloading. Returns false when nothing is loaded.
    pub fn pause(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.track.pause();
        session.playing = false;
        true
    }

    /// Pause when playing, play otherwise.
    pub fn toggle(&mut self) -> MediaResult<bool> {
        match self.state() {
            PlaybackState::Idle => Ok(false),
            PlaybackState::Playing => Ok(self.pause()),
            PlaybackState::Paused | PlaybackState::Finished => self.play(),
        }
    }

    /// Unload the current track and go back to idle.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.track.stop();
            tracing::debug!(id = session.entry.id, "unloaded track");
        }
    }

    /// Check whether the engine drained the track. Returns true on the tick
    /// the track finishes.
    pub fn poll_finished(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.playing && !session.finished && session.track.is_finished() {
            session.playing = false;
            session.finished = true;
            tracing::debug!(id = session.entry.id, "track finished");
            return true;
        }
        false
    }
}

impl<E> Drop for MediaController<E> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.track.stop();
        }
    }
}
