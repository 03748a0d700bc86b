pub mod audio;
pub mod beatmap;
pub mod error;
pub mod onset;
pub mod spectrum;

use std::path::Path;

use audio::AudioData;
use beatmap::{Beatmap, BeatmapBuilder, BuilderConfig};
use error::ChartError;
use onset::OnsetConfig;

/// Full generation pipeline configuration.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub onset: OnsetConfig,
    pub builder: BuilderConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            onset: OnsetConfig::default(),
            builder: BuilderConfig::default(),
        }
    }
}

/// Orchestrates decode -> onset extraction -> beatmap build.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Generator { config }
    }

    /// Generate a beatmap from an audio file on disk.
    pub fn generate(&self, audio_path: &Path) -> Result<Beatmap, ChartError> {
        let audio = AudioData::load(audio_path)?;
        let audio_ref = audio_path.to_string_lossy().into_owned();
        self.generate_from_audio(&audio, &audio_ref)
    }

    /// Generate a beatmap from already-decoded audio.
    pub fn generate_from_audio(
        &self,
        audio: &AudioData,
        audio_ref: &str,
    ) -> Result<Beatmap, ChartError> {
        let mono = audio.to_mono();
        let duration = audio.duration();

        let onsets = onset::detect_onsets(&mono, audio.sample_rate, &self.config.onset)?;
        log::info!(
            "extracted {} onsets from {:.1}s of audio",
            onsets.len(),
            duration
        );
        if onsets.is_empty() {
            log::warn!("no onsets found; falling back to minimum-density map");
        }

        let builder = BeatmapBuilder::new(self.config.builder.clone());
        let map = builder.build(&onsets, duration, audio_ref);
        log::info!("built beatmap with {} notes", map.notes.len());
        Ok(map)
    }
}
