use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::error::GameError;

/// Thin wrapper over the rodio output device.
///
/// The sink runs on rodio's own audio thread; the game only starts, pauses
/// and stops it, and anchors its clock to the moment playback began. The
/// stream handle must outlive the sink, so both are owned here.
pub struct AudioPlayer {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl AudioPlayer {
    pub fn new() -> Result<Self, GameError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| GameError::Audio(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| GameError::Audio(e.to_string()))?;

        Ok(AudioPlayer {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }

    /// Decode a file and queue it, paused. Playback starts on `resume`, so
    /// the caller can anchor its clock to the same instant.
    pub fn load_file(&self, path: &Path) -> Result<(), GameError> {
        let file = File::open(path).map_err(|e| GameError::Audio(e.to_string()))?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| GameError::Audio(e.to_string()))?;

        self.sink.pause();
        self.sink.append(source);
        Ok(())
    }

    pub fn pause(&self) {
        self.sink.pause();
    }

    pub fn resume(&self) {
        self.sink.play();
    }

    pub fn stop(&self) {
        self.sink.stop();
    }
}
