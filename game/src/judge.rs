use lanefall_charter::beatmap::Beatmap;

/// Timing-accuracy tier of a successful hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTier {
    Perfect,
    Great,
    Good,
}

impl HitTier {
    pub fn points(&self) -> u32 {
        match self {
            Self::Perfect => 300,
            Self::Great => 200,
            Self::Good => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT",
            Self::Great => "GREAT",
            Self::Good => "GOOD",
        }
    }
}

/// Hit window and tier boundaries, in seconds from the note's nominal time.
///
/// `good_window` doubles as the outer hit window W: a press farther than W
/// from any note is an empty press, and a note older than `time + W` is a
/// miss.
#[derive(Clone, Copy, Debug)]
pub struct JudgeConfig {
    pub perfect_window: f32,
    pub great_window: f32,
    pub good_window: f32,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        JudgeConfig {
            perfect_window: 0.02,
            great_window: 0.05,
            good_window: 0.08,
        }
    }
}

impl JudgeConfig {
    pub fn hit_window(&self) -> f32 {
        self.good_window
    }

    fn classify(&self, delta: f32) -> Option<HitTier> {
        let d = delta.abs();
        if d < self.perfect_window {
            Some(HitTier::Perfect)
        } else if d < self.great_window {
            Some(HitTier::Great)
        } else if d <= self.good_window {
            Some(HitTier::Good)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TierCounter {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
}

/// Score and combo accumulator. Score only ever increases; combo resets to
/// zero on a miss or an empty press.
#[derive(Debug, Clone, Default)]
pub struct ScoreState {
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub counts: TierCounter,
}

impl ScoreState {
    /// Multiplier applied to the next hit, from the combo held *before* it.
    /// Non-decreasing in combo and capped at x2.
    pub fn combo_multiplier(combo: u32) -> f32 {
        1.0 + 0.05 * combo.min(20) as f32
    }

    fn record_hit(&mut self, tier: HitTier) {
        let points = (tier.points() as f32 * Self::combo_multiplier(self.combo)).round() as u32;
        self.score += points;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        match tier {
            HitTier::Perfect => self.counts.perfect += 1,
            HitTier::Great => self.counts.great += 1,
            HitTier::Good => self.counts.good += 1,
        }
    }

    fn record_miss(&mut self) {
        self.combo = 0;
        self.counts.miss += 1;
    }

    fn break_combo(&mut self) {
        self.combo = 0;
    }
}

/// Lifecycle of one note. Transitions out of Pending exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteStatus {
    Pending,
    Hit(HitTier),
    Missed,
}

/// Outcome of one resolved note, handed to the renderer for feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub note_index: usize,
    pub lane: u8,
    pub note_time: f32,
    pub status: NoteStatus,
}

/// Matches lane presses against pending notes and sweeps expired ones.
///
/// Per lane, unresolved notes are consumed in FIFO order through a cursor:
/// when two notes sit inside the window at once, a press always resolves
/// the earlier one.
pub struct Judge {
    config: JudgeConfig,
    /// note times and lanes, flattened from the beatmap
    times: Vec<f32>,
    status: Vec<NoteStatus>,
    /// per lane: indices into `times`, ascending in time
    lane_notes: Vec<Vec<usize>>,
    /// per lane: position of the first unresolved note in `lane_notes`
    cursors: Vec<usize>,
}

impl Judge {
    pub fn new(beatmap: &Beatmap, config: JudgeConfig) -> Self {
        let lanes = beatmap.lanes as usize;
        let mut lane_notes = vec![Vec::new(); lanes];
        for (i, note) in beatmap.notes.iter().enumerate() {
            lane_notes[note.lane as usize].push(i);
        }

        Judge {
            config,
            times: beatmap.notes.iter().map(|n| n.time).collect(),
            status: vec![NoteStatus::Pending; beatmap.notes.len()],
            lane_notes,
            cursors: vec![0; lanes],
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn note_status(&self, note_index: usize) -> NoteStatus {
        self.status[note_index]
    }

    pub fn pending_count(&self) -> usize {
        self.status
            .iter()
            .filter(|s| **s == NoteStatus::Pending)
            .count()
    }

    /// Judge a single lane press at `time`.
    ///
    /// An empty press (no pending note in window) breaks the combo but
    /// scores nothing, matching the original game's behavior.
    pub fn handle_press(
        &mut self,
        lane: u8,
        time: f32,
        score: &mut ScoreState,
    ) -> Option<Resolution> {
        let lane_idx = lane as usize;
        if lane_idx >= self.lane_notes.len() {
            return None;
        }

        // Notes whose window already closed can no longer be hit; expire
        // them first so the press is judged against the earliest note that
        // is still in reach.
        let window = self.config.hit_window();
        while let Some(&note_index) = self.lane_notes[lane_idx].get(self.cursors[lane_idx]) {
            if time <= self.times[note_index] + window {
                break;
            }
            self.status[note_index] = NoteStatus::Missed;
            self.cursors[lane_idx] += 1;
            score.record_miss();
        }

        // Earliest pending note in this lane
        let cursor = self.cursors[lane_idx];
        let Some(&note_index) = self.lane_notes[lane_idx].get(cursor) else {
            score.break_combo();
            return None;
        };

        let note_time = self.times[note_index];
        let Some(tier) = self.config.classify(time - note_time) else {
            score.break_combo();
            return None;
        };

        self.status[note_index] = NoteStatus::Hit(tier);
        self.cursors[lane_idx] += 1;
        score.record_hit(tier);

        Some(Resolution {
            note_index,
            lane,
            note_time,
            status: NoteStatus::Hit(tier),
        })
    }

    /// Expire every pending note whose hit window has fully elapsed.
    pub fn sweep_misses(&mut self, time: f32, score: &mut ScoreState) -> Vec<Resolution> {
        let window = self.config.hit_window();
        let mut resolutions = Vec::new();

        for lane_idx in 0..self.lane_notes.len() {
            while let Some(&note_index) = self.lane_notes[lane_idx].get(self.cursors[lane_idx]) {
                let note_time = self.times[note_index];
                if time <= note_time + window {
                    break;
                }
                self.status[note_index] = NoteStatus::Missed;
                self.cursors[lane_idx] += 1;
                score.record_miss();
                resolutions.push(Resolution {
                    note_index,
                    lane: lane_idx as u8,
                    note_time,
                    status: NoteStatus::Missed,
                });
            }
        }

        resolutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanefall_charter::beatmap::Note;

    fn map(notes: Vec<Note>) -> Beatmap {
        Beatmap {
            audio_ref: "test.wav".to_string(),
            duration: 30.0,
            lanes: 4,
            notes,
        }
    }

    #[test]
    fn test_press_within_great_window() {
        let beatmap = map(vec![Note { time: 5.00, lane: 0 }]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();

        let res = judge.handle_press(0, 5.03, &mut score).unwrap();
        assert_eq!(res.status, NoteStatus::Hit(HitTier::Great));
        assert_eq!(score.combo, 1);
        // prior combo was 0, so multiplier is x1.0
        assert_eq!(score.score, HitTier::Great.points());
    }

    #[test]
    fn test_tier_boundaries() {
        let config = JudgeConfig::default();
        assert_eq!(config.classify(0.01), Some(HitTier::Perfect));
        assert_eq!(config.classify(-0.03), Some(HitTier::Great));
        assert_eq!(config.classify(0.07), Some(HitTier::Good));
        assert_eq!(config.classify(0.09), None);
    }

    #[test]
    fn test_unpressed_note_misses_exactly_once() {
        let beatmap = map(vec![Note { time: 5.00, lane: 0 }]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();
        score.combo = 7;
        score.score = 1000;

        // Window upper bound is 5.08; at 5.09 the note is gone
        let missed = judge.sweep_misses(5.09, &mut score);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].status, NoteStatus::Missed);
        assert_eq!(score.combo, 0);
        assert_eq!(score.score, 1000);

        // A second sweep does not re-miss the same note
        let again = judge.sweep_misses(6.0, &mut score);
        assert!(again.is_empty());
        assert_eq!(judge.note_status(0), NoteStatus::Missed);
    }

    #[test]
    fn test_note_survives_until_window_closes() {
        let beatmap = map(vec![Note { time: 5.00, lane: 0 }]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();

        assert!(judge.sweep_misses(5.07, &mut score).is_empty());
        assert_eq!(judge.note_status(0), NoteStatus::Pending);
    }

    #[test]
    fn test_fifo_tie_break_within_lane() {
        let beatmap = map(vec![
            Note { time: 5.00, lane: 2 },
            Note { time: 5.06, lane: 2 },
        ]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();

        // Both notes are inside the window at 5.04; the earlier one resolves
        let res = judge.handle_press(2, 5.04, &mut score).unwrap();
        assert_eq!(res.note_time, 5.00);
        assert_eq!(judge.note_status(1), NoteStatus::Pending);

        let res = judge.handle_press(2, 5.08, &mut score).unwrap();
        assert_eq!(res.note_time, 5.06);
    }

    #[test]
    fn test_press_skips_expired_note_and_hits_next() {
        let beatmap = map(vec![
            Note { time: 5.00, lane: 0 },
            Note { time: 5.16, lane: 0 },
        ]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();
        score.combo = 3;

        // 5.085 is past the first note's window (closes at 5.08) but inside
        // the second's: the stale note expires, the press hits the live one
        let res = judge.handle_press(0, 5.085, &mut score).unwrap();
        assert_eq!(res.note_time, 5.16);
        assert_eq!(res.status, NoteStatus::Hit(HitTier::Good));
        assert_eq!(judge.note_status(0), NoteStatus::Missed);
        assert_eq!(score.counts.miss, 1);
        // the expired note broke the combo before the hit restarted it
        assert_eq!(score.combo, 1);
    }

    #[test]
    fn test_empty_press_breaks_combo_without_scoring() {
        let beatmap = map(vec![Note { time: 5.00, lane: 0 }]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();
        score.combo = 4;

        let res = judge.handle_press(0, 2.00, &mut score);
        assert!(res.is_none());
        assert_eq!(score.combo, 0);
        assert_eq!(score.score, 0);
        assert_eq!(judge.note_status(0), NoteStatus::Pending);
    }

    #[test]
    fn test_combo_multiplier_monotonic_and_capped() {
        let mut prev = 0.0;
        for combo in 0..100 {
            let m = ScoreState::combo_multiplier(combo);
            assert!(m >= prev);
            prev = m;
        }
        assert_eq!(ScoreState::combo_multiplier(20), 2.0);
        assert_eq!(ScoreState::combo_multiplier(500), 2.0);
    }

    #[test]
    fn test_combo_scales_score() {
        let beatmap = map(vec![
            Note { time: 1.0, lane: 0 },
            Note { time: 2.0, lane: 1 },
            Note { time: 3.0, lane: 2 },
        ]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();

        judge.handle_press(0, 1.0, &mut score);
        judge.handle_press(1, 2.0, &mut score);
        judge.handle_press(2, 3.0, &mut score);

        // 300*1.0 + 300*1.05 + 300*1.10
        assert_eq!(score.score, 300 + 315 + 330);
        assert_eq!(score.combo, 3);
        assert_eq!(score.max_combo, 3);
        assert_eq!(score.counts.perfect, 3);
    }

    #[test]
    fn test_press_on_wrong_lane_leaves_note_pending() {
        let beatmap = map(vec![Note { time: 5.00, lane: 1 }]);
        let mut judge = Judge::new(&beatmap, JudgeConfig::default());
        let mut score = ScoreState::default();

        let res = judge.handle_press(0, 5.00, &mut score);
        assert!(res.is_none());
        assert_eq!(judge.note_status(0), NoteStatus::Pending);
    }
}
