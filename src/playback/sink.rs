use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::file::AudioFile;
use lofty::probe::Probe;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::engine::{LoadedTrack, PlaybackEngine};
use crate::error::{MediaError, MediaResult};

/// Playback through the default output device. The stream is opened on the
/// first load so the app still starts on machines without audio output.
#[derive(Default)]
pub struct RodioEngine {
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl RodioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> MediaResult<&OutputStreamHandle> {
        if self.output.is_none() {
            let output =
                OutputStream::try_default().map_err(|err| MediaError::Output(err.to_string()))?;
            tracing::info!("opened default audio output");
            self.output = Some(output);
        }
        match &self.output {
            Some((_, handle)) => Ok(handle),
            None => Err(MediaError::Output("output stream missing".to_string())),
        }
    }
}

struct RodioTrack {
    sink: Sink,
}

impl LoadedTrack for RodioTrack {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> MediaResult<Box<dyn LoadedTrack>> {
        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file)).map_err(|err| MediaError::Decode {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let handle = self.handle()?;
        let sink = Sink::try_new(handle).map_err(|err| MediaError::Output(err.to_string()))?;
        sink.pause();
        sink.append(source);
        Ok(Box::new(RodioTrack { sink }))
    }

    fn probe_duration(&self, path: &Path) -> MediaResult<Option<Duration>> {
        // Container headers first; they know the length of most formats.
        if let Ok(tagged) = Probe::open(path).and_then(|probe| probe.read()) {
            let duration = tagged.properties().duration();
            if !duration.is_zero() {
                return Ok(Some(duration));
            }
        }

        let file = File::open(path)?;
        match Decoder::new(BufReader::new(file)) {
            Ok(decoder) => Ok(decoder.total_duration()),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "decoder rejected file");
                Ok(None)
            }
        }
    }
}
