use std::path::Path;

use crate::error::ChartError;

#[derive(Clone, Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    /// Load audio from a WAV file.
    pub fn load(path: &Path) -> Result<Self, ChartError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" => Self::load_wav(path),
            ext => Err(ChartError::AudioDecode {
                path: path.to_path_buf(),
                reason: format!("unsupported audio format: {ext:?}"),
            }),
        }
    }

    fn load_wav(path: &Path) -> Result<Self, ChartError> {
        let decode_err = |reason: String| ChartError::AudioDecode {
            path: path.to_path_buf(),
            reason,
        };

        let reader = hound::WavReader::open(path).map_err(|e| decode_err(e.to_string()))?;
        let spec = reader.spec();

        let samples: Result<Vec<f32>, _> = match spec.sample_format {
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                // Normalize integer samples to [-1.0, 1.0]
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect()
            }
        };
        let samples = samples.map_err(|e| decode_err(e.to_string()))?;

        if samples.is_empty() {
            return Err(decode_err("audio file contains no samples".into()));
        }

        Ok(AudioData {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Convert multi-channel audio to mono by averaging channels.
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }

    /// Audio duration in seconds.
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_accounts_for_channels() {
        let audio = AudioData {
            samples: vec![0.0; 44100],
            sample_rate: 44100,
            channels: 2,
        };
        assert_eq!(audio.duration(), 0.5);
    }

    #[test]
    fn test_to_mono_averages_channels() {
        let audio = AudioData {
            samples: vec![1.0, 0.0, 0.5, 0.5],
            sample_rate: 44100,
            channels: 2,
        };
        let mono = audio.to_mono();
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn test_unknown_extension_is_decode_error() {
        let err = AudioData::load(Path::new("song.xyz")).unwrap_err();
        assert!(matches!(err, ChartError::AudioDecode { .. }));
    }
}
