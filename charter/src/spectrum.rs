use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

pub const BAND_COUNT: usize = 8;

/// Samples per analysis window. At 44.1 kHz this is ~23ms of audio, enough
/// to resolve the low band while staying well inside a 33ms frame budget.
const WINDOW_SIZE: usize = 1024;

/// Lowest frequency edge of the visualizer, in Hz.
const LOW_EDGE_HZ: f32 = 60.0;

/// Floor fed into the log scaling so silence stays out of the log domain.
const MIN_BAND_AMPLITUDE: f32 = 1e-6;

/// One frame of visualizer levels, all in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectrumFrame {
    pub bands: [f32; BAND_COUNT],
}

/// Per-frame FFT analysis of the playback waveform, bucketed into
/// log-distributed bands.
///
/// The FFT plan, window function and scratch buffer are built once;
/// `frame_at` only does the per-frame transform.
pub struct SpectrumAnalyzer {
    samples: Vec<f32>,
    sample_rate: u32,
    fft: Arc<dyn Fft<f32>>,
    hann: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    /// FFT bin index of each band edge, BAND_COUNT + 1 entries, strictly
    /// increasing.
    band_edges: Vec<usize>,
    /// Smoothed levels carried between frames.
    levels: [f32; BAND_COUNT],
    /// Fall smoothing factor per frame, in (0, 1]; 1.0 disables smoothing.
    fall_rate: f32,
}

impl SpectrumAnalyzer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(WINDOW_SIZE);

        let hann = (0..WINDOW_SIZE)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (WINDOW_SIZE as f32 - 1.0)).cos())
            })
            .collect();

        SpectrumAnalyzer {
            samples,
            sample_rate,
            fft,
            hann,
            buffer: vec![Complex::new(0.0, 0.0); WINDOW_SIZE],
            band_edges: band_edge_bins(sample_rate),
            levels: [0.0; BAND_COUNT],
            fall_rate: 0.25,
        }
    }

    /// Compute the visualizer frame for the given playback time.
    ///
    /// Levels rise instantly but fall by exponential decay, so the bars
    /// never flicker down between frames.
    pub fn frame_at(&mut self, playback_time: f32) -> SpectrumFrame {
        let raw = self.raw_bands_at(playback_time);

        for (level, &new) in self.levels.iter_mut().zip(raw.iter()) {
            if new >= *level {
                *level = new;
            } else {
                *level += (new - *level) * self.fall_rate;
            }
        }

        SpectrumFrame { bands: self.levels }
    }

    fn raw_bands_at(&mut self, playback_time: f32) -> [f32; BAND_COUNT] {
        let time = playback_time.max(0.0);
        let end = (time * self.sample_rate as f32) as usize;
        let start = end.saturating_sub(WINDOW_SIZE);

        // Window of samples ending at the playback position, zero-padded
        // past either track boundary.
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = self.samples.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.hann[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let mut bands = [0.0f32; BAND_COUNT];
        for (band, level) in bands.iter_mut().enumerate() {
            let lo = self.band_edges[band];
            let hi = self.band_edges[band + 1];
            let sum: f32 = self.buffer[lo..hi].iter().map(|c| c.norm()).sum();
            let avg = (sum / (hi - lo) as f32).max(MIN_BAND_AMPLITUDE);

            // Log amplitude scale matches perceived loudness better than
            // linear magnitude.
            *level = (avg.log10() * 0.4 + 1.0).clamp(0.0, 1.0);
        }
        bands
    }

    pub fn band_count(&self) -> usize {
        BAND_COUNT
    }
}

/// FFT bin indices of the band edges: BAND_COUNT + 1 geometrically spaced
/// frequencies from LOW_EDGE_HZ to Nyquist, each band at least one bin wide.
fn band_edge_bins(sample_rate: u32) -> Vec<usize> {
    let nyquist = sample_rate as f32 / 2.0;
    let bin_hz = sample_rate as f32 / WINDOW_SIZE as f32;
    let ratio = nyquist / LOW_EDGE_HZ;

    let mut edges = Vec::with_capacity(BAND_COUNT + 1);
    for i in 0..=BAND_COUNT {
        let freq = LOW_EDGE_HZ * ratio.powf(i as f32 / BAND_COUNT as f32);
        let mut bin = (freq / bin_hz) as usize;
        // Narrow low bands can collapse to zero bins at coarse resolution
        if let Some(&prev) = edges.last() {
            bin = bin.max(prev + 1);
        }
        // Leave one bin per remaining edge so the sequence stays strictly
        // increasing even when the spectrum barely spans BAND_COUNT bins
        edges.push(bin.min(WINDOW_SIZE / 2 - (BAND_COUNT - i)));
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sine_wave;

    #[test]
    fn test_band_edges_strictly_increasing() {
        let edges = band_edge_bins(44100);
        assert_eq!(edges.len(), BAND_COUNT + 1);
        for pair in edges.windows(2) {
            assert!(pair[0] < pair[1], "edges not strictly increasing: {edges:?}");
        }
        assert!(*edges.last().unwrap() <= WINDOW_SIZE / 2);
    }

    #[test]
    fn test_band_edges_stay_distinct_at_low_sample_rates() {
        // Nyquist below the 60 Hz floor: every band must still span at
        // least one bin so the per-band average never divides by zero
        for rate in [50u32, 100, 300, 8000] {
            let edges = band_edge_bins(rate);
            for pair in edges.windows(2) {
                assert!(pair[0] < pair[1], "collapsed edges at rate {rate}: {edges:?}");
            }
        }

        let mut analyzer = SpectrumAnalyzer::new(vec![0.1; 4096], 100);
        let frame = analyzer.frame_at(0.5);
        assert!(frame.bands.iter().all(|b| b.is_finite()));
    }

    #[test]
    fn test_band_edges_are_log_distributed() {
        // Geometric spacing: upper bands span more bins than lower ones
        let edges = band_edge_bins(44100);
        let first_width = edges[1] - edges[0];
        let last_width = edges[BAND_COUNT] - edges[BAND_COUNT - 1];
        assert!(last_width > first_width * 4);
    }

    #[test]
    fn test_levels_never_negative() {
        let samples = sine_wave(440.0, 2.0, 44100);
        let mut analyzer = SpectrumAnalyzer::new(samples, 44100);

        for i in 0..60 {
            let frame = analyzer.frame_at(i as f32 * 0.033);
            assert!(frame.bands.iter().all(|&b| (0.0..=1.0).contains(&b)));
        }
    }

    #[test]
    fn test_out_of_range_time_is_silent_window() {
        let samples = sine_wave(440.0, 1.0, 44100);
        let mut analyzer = SpectrumAnalyzer::new(samples, 44100);

        // Past the end of the track: zero-padded window, levels stay valid
        let frame = analyzer.frame_at(100.0);
        assert!(frame.bands.iter().all(|&b| b.is_finite() && b >= 0.0));
    }

    #[test]
    fn test_tone_concentrates_in_one_band() {
        let sample_rate = 44100;
        let samples = sine_wave(1000.0, 2.0, sample_rate);
        let mut analyzer = SpectrumAnalyzer::new(samples, sample_rate);
        let frame = analyzer.frame_at(1.0);

        let (max_band, _) = frame
            .bands
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();

        // 1 kHz sits in the middle of the 60 Hz..22 kHz log range
        let edges = band_edge_bins(sample_rate);
        let bin_hz = sample_rate as f32 / WINDOW_SIZE as f32;
        let lo = edges[max_band] as f32 * bin_hz;
        let hi = edges[max_band + 1] as f32 * bin_hz;
        assert!(
            (lo..hi).contains(&1000.0),
            "peak band {max_band} spans {lo}..{hi} Hz"
        );
    }

    #[test]
    fn test_levels_fall_gradually_after_signal_stops() {
        let sample_rate = 44100;
        // One second of tone followed by silence
        let mut samples = sine_wave(440.0, 1.0, sample_rate);
        samples.extend(vec![0.0f32; sample_rate as usize]);
        let mut analyzer = SpectrumAnalyzer::new(samples, sample_rate);

        let during = analyzer.frame_at(0.9);
        let just_after = analyzer.frame_at(1.5);

        let sum = |f: &SpectrumFrame| f.bands.iter().sum::<f32>();
        if sum(&during) > 0.0 {
            // Decay, not an instant drop to the silent-floor level
            let mut floor = SpectrumAnalyzer::new(vec![0.0; 44100], sample_rate);
            let silent = floor.frame_at(0.5);
            assert!(sum(&just_after) > sum(&silent));
        }
    }
}
