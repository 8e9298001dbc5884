//! Single-track playback: the engine seam, its rodio implementation and the
//! controller that owns the one live playback session.

mod controller;
mod engine;
mod sink;

pub use controller::{MediaController, PlaybackSession, PlaybackState};
pub use engine::{LoadedTrack, PlaybackEngine};
pub use sink::RodioEngine;

#[cfg(test)]
pub(crate) use controller::tests as controller_tests;
