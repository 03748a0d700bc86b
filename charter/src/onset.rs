use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::ChartError;

/// A detected rhythmic attack in the audio signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Onset {
    /// Time in seconds from track start.
    pub time: f32,
    /// Novelty-curve value at the peak, always >= 0.
    pub strength: f32,
}

/// Onset extraction parameters.
#[derive(Clone, Debug)]
pub struct OnsetConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    /// Peaks below `mean + threshold_sigma * stddev` of the novelty curve
    /// are discarded.
    pub threshold_sigma: f32,
    /// Candidates closer than this are merged, keeping the stronger.
    pub min_onset_gap: f32,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        OnsetConfig {
            frame_size: 2048,
            hop_size: 512,
            threshold_sigma: 1.0,
            min_onset_gap: 0.05,
        }
    }
}

/// Extract onsets from a mono signal via a spectral-flux novelty curve.
///
/// Silence produces an empty list, which is not an error; the beatmap
/// builder decides what to do with a degenerate onset set.
pub fn detect_onsets(
    samples: &[f32],
    sample_rate: u32,
    config: &OnsetConfig,
) -> Result<Vec<Onset>, ChartError> {
    if samples.is_empty() {
        return Err(ChartError::AudioAnalysis("empty audio signal".into()));
    }
    if sample_rate == 0 {
        return Err(ChartError::AudioAnalysis("sample rate is zero".into()));
    }
    if samples.len() < config.frame_size {
        // Shorter than one analysis window: nothing rhythmic to find.
        return Ok(Vec::new());
    }

    let novelty = spectral_flux(samples, config);
    let smoothed = smooth_curve(&novelty, 3);
    let peak_indices = find_peaks(&smoothed, config.threshold_sigma);

    let frame_time = config.hop_size as f32 / sample_rate as f32;
    let candidates: Vec<Onset> = peak_indices
        .iter()
        .map(|&idx| Onset {
            time: idx as f32 * frame_time,
            strength: smoothed[idx],
        })
        .collect();

    Ok(merge_close_onsets(candidates, config.min_onset_gap))
}

/// Positive spectral difference between consecutive STFT frames.
fn spectral_flux(samples: &[f32], config: &OnsetConfig) -> Vec<f32> {
    let frame_size = config.frame_size;
    let hop_size = config.hop_size;
    let num_frames = (samples.len() - frame_size) / hop_size + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(frame_size);
    let hann = hann_window(frame_size);

    let mut prev_magnitudes = vec![0.0f32; frame_size / 2];
    let mut flux = Vec::with_capacity(num_frames);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];

    for i in 0..num_frames {
        let start = i * hop_size;
        for (j, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(samples[start + j] * hann[j], 0.0);
        }
        fft.process(&mut buffer);

        let mut frame_flux = 0.0f32;
        for (bin, c) in buffer.iter().take(frame_size / 2).enumerate() {
            let magnitude = c.norm();
            let diff = magnitude - prev_magnitudes[bin];
            if diff > 0.0 {
                frame_flux += diff;
            }
            prev_magnitudes[bin] = magnitude;
        }
        flux.push(frame_flux);
    }

    // First frame's flux is the raw magnitude sum; zero it so the track
    // start does not register as a spurious attack.
    if let Some(first) = flux.first_mut() {
        *first = 0.0;
    }
    flux
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / (size as f32 - 1.0)).cos())
        })
        .collect()
}

/// Smooth a curve with a centered moving average.
fn smooth_curve(data: &[f32], window_size: usize) -> Vec<f32> {
    if data.is_empty() {
        return Vec::new();
    }

    let half_window = window_size / 2;
    let mut smoothed = Vec::with_capacity(data.len());

    for i in 0..data.len() {
        let start = i.saturating_sub(half_window);
        let end = (i + half_window + 1).min(data.len());
        let avg = data[start..end].iter().sum::<f32>() / (end - start) as f32;
        smoothed.push(avg);
    }

    smoothed
}

/// Local maxima above an adaptive mean + sigma threshold.
fn find_peaks(data: &[f32], threshold_sigma: f32) -> Vec<usize> {
    if data.len() < 3 {
        return Vec::new();
    }

    let mean = data.iter().sum::<f32>() / data.len() as f32;
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / data.len() as f32;
    let threshold = mean + threshold_sigma * variance.sqrt();

    let mut peaks = Vec::new();
    for i in 1..data.len() - 1 {
        if data[i] > threshold && data[i] > data[i - 1] && data[i] >= data[i + 1] {
            peaks.push(i);
        }
    }
    peaks
}

/// Merge onset candidates closer than `min_gap`, keeping the stronger one.
pub(crate) fn merge_close_onsets(candidates: Vec<Onset>, min_gap: f32) -> Vec<Onset> {
    let mut merged: Vec<Onset> = Vec::with_capacity(candidates.len());

    for onset in candidates {
        match merged.last_mut() {
            Some(last) if onset.time - last.time < min_gap => {
                if onset.strength > last.strength {
                    *last = onset;
                }
            }
            _ => merged.push(onset),
        }
    }

    merged
}
