use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::onset::{merge_close_onsets, Onset};

/// A single playable note: when it should be struck, and in which lane.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub time: f32,
    pub lane: u8,
}

/// The ordered, lane-assigned note sequence for one track.
///
/// Immutable after generation; gameplay only reads it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Beatmap {
    /// Path or identifier of the audio this map was generated from.
    pub audio_ref: String,
    /// Track duration in seconds.
    pub duration: f32,
    pub lanes: u8,
    pub notes: Vec<Note>,
}

impl Beatmap {
    pub fn to_json(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ChartError> {
        let map: Beatmap = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    pub fn save(&self, path: &Path) -> Result<(), ChartError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ChartError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check the structural invariants a well-formed map must satisfy.
    fn validate(&self) -> Result<(), ChartError> {
        if self.lanes == 0 {
            return Err(ChartError::BeatmapFormat("lane count is zero".into()));
        }
        for pair in self.notes.windows(2) {
            if pair[1].time < pair[0].time {
                return Err(ChartError::BeatmapFormat(format!(
                    "notes out of order at t={}",
                    pair[1].time
                )));
            }
        }
        if let Some(bad) = self.notes.iter().find(|n| n.lane >= self.lanes) {
            return Err(ChartError::BeatmapFormat(format!(
                "note at t={} references lane {} of {}",
                bad.time, bad.lane, self.lanes
            )));
        }
        Ok(())
    }
}

/// Beatmap construction parameters.
#[derive(Clone, Debug)]
pub struct BuilderConfig {
    pub lanes: u8,
    /// Minimum spacing between any two notes in the same lane, and the
    /// merge distance for onsets that collapse into one note.
    pub min_note_spacing: f32,
    /// Minimum spacing between notes in different lanes, unless they land
    /// inside the same chord.
    pub global_spacing: f32,
    /// Maximum simultaneous notes across lanes.
    pub max_chord: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            lanes: 4,
            min_note_spacing: 0.15,
            global_spacing: 0.15,
            max_chord: 1,
        }
    }
}

pub struct BeatmapBuilder {
    config: BuilderConfig,
}

impl BeatmapBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        BeatmapBuilder { config }
    }

    /// Build a beatmap from extracted onsets.
    ///
    /// Lane assignment is a pure function of the onset sequence, so the same
    /// audio and parameters always regenerate an identical map.
    pub fn build(&self, onsets: &[Onset], duration: f32, audio_ref: &str) -> Beatmap {
        let lanes = self.config.lanes.max(1);

        // Collapse onsets closer than the note spacing, keeping the stronger.
        let merged = merge_close_onsets(onsets.to_vec(), self.config.min_note_spacing);

        let mut notes = self.assign_lanes(&merged, lanes);
        notes = self.enforce_spacing(notes, lanes);
        if notes.is_empty() {
            notes = self.fallback_notes(duration, lanes);
        }

        Beatmap {
            audio_ref: audio_ref.to_string(),
            duration,
            lanes,
            notes,
        }
    }

    /// Map onset strength to a lane, nudging away from same-lane repeats.
    fn assign_lanes(&self, onsets: &[Onset], lanes: u8) -> Vec<Note> {
        let (min_s, max_s) = onsets.iter().fold((f32::MAX, f32::MIN), |(lo, hi), o| {
            (lo.min(o.strength), hi.max(o.strength))
        });
        let span = max_s - min_s;

        let mut notes = Vec::with_capacity(onsets.len());
        let mut last_lane: Option<u8> = None;

        for onset in onsets {
            let norm = if span > 0.0 {
                (onset.strength - min_s) / span
            } else {
                0.0
            };
            let mut lane = ((norm * lanes as f32) as u8).min(lanes - 1);

            // Long same-lane runs play badly; rotate the repeat away.
            if last_lane == Some(lane) {
                lane = (lane + 1) % lanes;
            }

            notes.push(Note {
                time: onset.time,
                lane,
            });
            last_lane = Some(lane);
        }

        notes
    }

    /// Drop notes that violate per-lane spacing, global spacing, or the
    /// chord cap. Input is already time-ascending.
    fn enforce_spacing(&self, notes: Vec<Note>, lanes: u8) -> Vec<Note> {
        const CHORD_EPSILON: f32 = 0.001;

        let mut last_lane_time = vec![f32::NEG_INFINITY; lanes as usize];
        let mut last_time = f32::NEG_INFINITY;
        let mut chord_size = 0usize;
        let mut kept = Vec::with_capacity(notes.len());

        for note in notes {
            if note.time - last_lane_time[note.lane as usize] < self.config.min_note_spacing {
                continue;
            }

            let in_chord = (note.time - last_time).abs() < CHORD_EPSILON;
            if in_chord {
                if chord_size >= self.config.max_chord {
                    continue;
                }
                chord_size += 1;
            } else {
                if note.time - last_time < self.config.global_spacing {
                    continue;
                }
                chord_size = 1;
            }

            last_lane_time[note.lane as usize] = note.time;
            last_time = note.time;
            kept.push(note);
        }

        kept
    }

    /// A degenerate (near-silent) track still gets a minimal playable map
    /// rather than an empty one: a start note, plus an end note when the
    /// track is long enough for the second note to respect the configured
    /// spacing. A map with any real notes is left untouched.
    fn fallback_notes(&self, duration: f32, lanes: u8) -> Vec<Note> {
        if duration <= 0.0 {
            return Vec::new();
        }

        let start = Note { time: 0.1, lane: 0 };
        let end = Note {
            time: (duration - 0.05).max(0.2),
            lane: lanes - 1,
        };
        let required = if end.lane == start.lane {
            self.config.global_spacing.max(self.config.min_note_spacing)
        } else {
            self.config.global_spacing
        };

        if end.time - start.time >= required {
            vec![start, end]
        } else {
            vec![start]
        }
    }
}
