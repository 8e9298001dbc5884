use std::path::Path;
use std::time::Duration;

use crate::error::MediaResult;

/// One decoded audio resource held by the engine.
pub trait LoadedTrack {
    fn play(&mut self);
    fn pause(&mut self);
    /// True once the engine has drained the whole resource.
    fn is_finished(&self) -> bool;
    /// Halt output and release the resource. The track is dropped right after.
    fn stop(&mut self);
}

/// Host playback capability: load resources and read their duration.
pub trait PlaybackEngine {
    /// Decode `path` into a paused track.
    fn load(&mut self, path: &Path) -> MediaResult<Box<dyn LoadedTrack>>;

    /// Open `path` transiently and report its length. `Ok(None)` when the file
    /// cannot be introspected.
    fn probe_duration(&self, path: &Path) -> MediaResult<Option<Duration>>;
}
