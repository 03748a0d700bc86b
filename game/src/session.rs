use std::time::Instant;

use lanefall_charter::beatmap::Beatmap;

use crate::clock::{PlaybackClock, Transport};
use crate::judge::{Judge, JudgeConfig, NoteStatus, Resolution, ScoreState};

/// Result of one frame step: keep looping, or leave the play screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    Continue,
    Quit,
}

/// Everything the per-frame step produced, for the renderer.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub time: f32,
    pub resolutions: Vec<Resolution>,
}

/// One play-through: the beatmap plus all mutable gameplay state.
///
/// The frame loop calls `tick` once per frame with the sampled instant and
/// that frame's edge-triggered lane presses; clock advance happens before
/// judging, judging before the caller renders. No rendering or audio
/// concerns live here, so sessions run headless in tests.
pub struct GameSession {
    beatmap: Beatmap,
    clock: PlaybackClock,
    judge: Judge,
    score: ScoreState,
}

impl GameSession {
    pub fn new(beatmap: Beatmap, judge_config: JudgeConfig, latency_offset: f32) -> Self {
        let clock = PlaybackClock::new(beatmap.duration, latency_offset);
        let judge = Judge::new(&beatmap, judge_config);
        GameSession {
            beatmap,
            clock,
            judge,
            score: ScoreState::default(),
        }
    }

    pub fn beatmap(&self) -> &Beatmap {
        &self.beatmap
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn transport(&self) -> Transport {
        self.clock.state()
    }

    pub fn note_status(&self, note_index: usize) -> NoteStatus {
        self.judge.note_status(note_index)
    }

    pub fn start(&mut self, now: Instant) {
        self.clock.play(now);
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        match self.clock.state() {
            Transport::Playing => self.clock.pause(now),
            Transport::Paused => self.clock.resume(now),
            _ => {}
        }
    }

    pub fn current_time(&self, now: Instant) -> f32 {
        self.clock.current_time(now)
    }

    /// Advance one frame: clock first, then the miss sweep, then this
    /// frame's presses. Sweeping first keeps every lane cursor on a note
    /// whose window is still open, so a press in the frame where one note
    /// expired still hits the next note in that lane. `presses` holds the
    /// lanes whose keys went down this frame.
    pub fn tick(&mut self, now: Instant, presses: &[u8]) -> FrameReport {
        let was_playing = self.clock.state() == Transport::Playing;
        let time = self.clock.tick(now);
        let mut report = FrameReport {
            time,
            resolutions: Vec::new(),
        };

        if self.clock.state() == Transport::Finished {
            if was_playing {
                // Track just ran out: no press can arrive anymore, so every
                // note still pending resolves to Missed here, exactly once
                let horizon = self.clock.duration() + self.judge.config().hit_window();
                report
                    .resolutions
                    .extend(self.judge.sweep_misses(horizon, &mut self.score));
            }
            return report;
        }
        if self.clock.state() != Transport::Playing {
            // Paused or stopped: input does not judge against a frozen clock
            return report;
        }

        report
            .resolutions
            .extend(self.judge.sweep_misses(time, &mut self.score));
        for &lane in presses {
            if let Some(res) = self.judge.handle_press(lane, time, &mut self.score) {
                report.resolutions.push(res);
            }
        }

        report
    }

    /// All notes have resolved, or the track ran out.
    pub fn is_over(&self) -> bool {
        self.clock.is_finished() || self.judge.pending_count() == 0
    }
}
