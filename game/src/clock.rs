use std::time::Instant;

/// Transport state of the playback clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Stopped,
    Playing,
    Paused,
    Finished,
}

/// Single authoritative time source for the session.
///
/// Time is anchored to the instant playback started plus any accumulated
/// pause offset, mirroring how the audio sink is driven, so note motion,
/// judging and the visualizer all read one clock. Every method takes the
/// sampling instant explicitly; tests drive the clock without audio
/// hardware or sleeping.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    state: Transport,
    /// Anchor instant while Playing.
    started_at: Option<Instant>,
    /// Seconds of playback accumulated before the current anchor.
    offset: f32,
    /// Track length; reaching it latches Finished.
    duration: f32,
    /// Correction for audio output latency, added to the reported time.
    latency_offset: f32,
}

impl PlaybackClock {
    pub fn new(duration: f32, latency_offset: f32) -> Self {
        PlaybackClock {
            state: Transport::Stopped,
            started_at: None,
            offset: 0.0,
            duration,
            latency_offset,
        }
    }

    pub fn state(&self) -> Transport {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == Transport::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.state == Transport::Finished
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Stopped -> Playing. No-op from any other state.
    pub fn play(&mut self, now: Instant) {
        if self.state == Transport::Stopped {
            self.state = Transport::Playing;
            self.started_at = Some(now);
            self.offset = 0.0;
        }
    }

    /// Playing -> Paused, freezing the current offset.
    pub fn pause(&mut self, now: Instant) {
        if self.state == Transport::Playing {
            self.offset = self.elapsed(now);
            self.started_at = None;
            self.state = Transport::Paused;
        }
    }

    /// Paused -> Playing, preserving the frozen offset.
    pub fn resume(&mut self, now: Instant) {
        if self.state == Transport::Paused {
            self.started_at = Some(now);
            self.state = Transport::Playing;
        }
    }

    /// Current playback time in seconds. Monotonic while Playing, frozen
    /// while Paused, clamped to the track duration once Finished.
    pub fn current_time(&self, now: Instant) -> f32 {
        match self.state {
            Transport::Stopped => 0.0,
            Transport::Playing => self.elapsed(now) + self.latency_offset,
            Transport::Paused => self.offset + self.latency_offset,
            Transport::Finished => self.duration,
        }
    }

    /// Advance the state machine one frame; latches Finished at the end of
    /// the track. Returns the sampled time.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let time = self.current_time(now);
        if self.state == Transport::Playing && time >= self.duration {
            self.state = Transport::Finished;
            self.started_at = None;
            return self.duration;
        }
        time
    }

    fn elapsed(&self, now: Instant) -> f32 {
        match self.started_at {
            Some(anchor) => self.offset + now.duration_since(anchor).as_secs_f32(),
            None => self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stopped_clock_reads_zero() {
        let clock = PlaybackClock::new(10.0, 0.0);
        assert_eq!(clock.state(), Transport::Stopped);
        assert_eq!(clock.current_time(Instant::now()), 0.0);
    }

    #[test]
    fn test_play_advances_time() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(10.0, 0.0);
        clock.play(t0);

        let t1 = t0 + Duration::from_millis(500);
        assert!((clock.current_time(t1) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_pause_freezes_and_resume_preserves_offset() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(10.0, 0.0);
        clock.play(t0);

        let t1 = t0 + Duration::from_secs(2);
        clock.pause(t1);
        assert_eq!(clock.state(), Transport::Paused);

        // Time does not advance while paused
        let t2 = t1 + Duration::from_secs(5);
        assert!((clock.current_time(t2) - 2.0).abs() < 1e-3);

        clock.resume(t2);
        let t3 = t2 + Duration::from_secs(1);
        assert!((clock.current_time(t3) - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_finishes_at_track_end() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(1.0, 0.0);
        clock.play(t0);

        let time = clock.tick(t0 + Duration::from_secs(2));
        assert_eq!(clock.state(), Transport::Finished);
        assert_eq!(time, 1.0);

        // Finished is terminal
        clock.resume(t0 + Duration::from_secs(3));
        assert_eq!(clock.state(), Transport::Finished);
    }

    #[test]
    fn test_latency_offset_shifts_reported_time() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(10.0, 0.05);
        clock.play(t0);

        let t1 = t0 + Duration::from_secs(1);
        assert!((clock.current_time(t1) - 1.05).abs() < 1e-3);
    }

    #[test]
    fn test_play_from_paused_is_noop() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(10.0, 0.0);
        clock.play(t0);
        clock.pause(t0 + Duration::from_secs(1));
        clock.play(t0 + Duration::from_secs(2));
        assert_eq!(clock.state(), Transport::Paused);
    }
}
