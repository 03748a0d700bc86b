use thiserror::Error;

/// Runtime errors of the gameplay side. Setup errors abort before the frame
/// loop starts; anything per-frame is logged and survived.
#[derive(Debug, Error)]
pub enum GameError {
    /// Audio output could not be opened or the track failed to decode.
    #[error("audio playback error: {0}")]
    Audio(String),

    /// Input device polling failed; the loop exits gracefully.
    #[error("input device error: {0}")]
    InputDevice(String),
}
