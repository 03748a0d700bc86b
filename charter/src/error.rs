use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the beatmap generation pipeline.
///
/// Everything here is raised before the game's frame loop starts, so callers
/// can surface a reason string and bail without partially-initialized state.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Source audio file could not be read or decoded.
    #[error("failed to decode audio {path}: {reason}")]
    AudioDecode { path: PathBuf, reason: String },

    /// Onset extraction failed or the input was unusable.
    #[error("audio analysis failed: {0}")]
    AudioAnalysis(String),

    /// A serialized beatmap did not parse or violated format invariants.
    #[error("malformed beatmap: {0}")]
    BeatmapFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ChartError {
    fn from(e: serde_json::Error) -> Self {
        ChartError::BeatmapFormat(e.to_string())
    }
}
