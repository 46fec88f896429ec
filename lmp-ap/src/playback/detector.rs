//! End-of-track detection
//!
//! The output device only reports periodic status samples, so "the track
//! finished" has to be inferred from them. [`AutoAdvanceDetector`] does that
//! with an edge-triggered [`FinishLatch`]: a stopped-at-end sample fires once,
//! and nothing fires again until a playing sample has been seen.

use crate::audio::PlaybackStatus;

/// Distance from the end (seconds) at which a stopped resource counts as finished
pub const FINISH_EPSILON_SECONDS: f64 = 0.6;

/// Minimum position change (seconds) between published playing samples
pub const STALE_THRESHOLD_SECONDS: f64 = 0.5;

/// One-shot latch guarding the finish transition
///
/// Starts disarmed: nothing can finish before it has been observed playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinishLatch {
    armed: bool,
}

impl FinishLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Disarm and report whether the latch was armed
    fn take(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }
}

/// What a status sample means to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The current track reached its end; fires once per latch arming
    Finished,
    /// Position moved enough to publish
    Progress,
    /// Playing sample too close to the last published one
    Stale,
}

/// Turns status samples into finish/progress observations
#[derive(Debug, Default)]
pub struct AutoAdvanceDetector {
    latch: FinishLatch,
    last_published: Option<PlaybackStatus>,
}

impl AutoAdvanceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the current resource: disarm and drop the staleness baseline
    ///
    /// Called whenever a new resource is about to load, so a finish computed
    /// against the old track cannot fire against the new one.
    pub fn reset(&mut self) {
        self.latch.disarm();
        self.last_published = None;
    }

    pub fn is_armed(&self) -> bool {
        self.latch.is_armed()
    }

    /// Classify one status sample
    ///
    /// Arming and finish detection look at every sample; staleness only
    /// decides whether the sample is worth publishing.
    pub fn observe(&mut self, status: PlaybackStatus) -> Observation {
        if status.is_playing {
            self.latch.arm();
        }

        if is_at_end(&status) && self.latch.take() {
            self.last_published = Some(status);
            return Observation::Finished;
        }

        if status.is_playing {
            if let Some(last) = self.last_published {
                if (status.position_seconds - last.position_seconds).abs() < STALE_THRESHOLD_SECONDS
                {
                    return Observation::Stale;
                }
            }
        }

        self.last_published = Some(status);
        Observation::Progress
    }
}

/// Stopped within [`FINISH_EPSILON_SECONDS`] of a known, non-zero duration
fn is_at_end(status: &PlaybackStatus) -> bool {
    status.duration_seconds > 0.0
        && !status.is_playing
        && status.position_seconds >= status.duration_seconds - FINISH_EPSILON_SECONDS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(position: f64) -> PlaybackStatus {
        PlaybackStatus::new(position, 10.0, true)
    }

    fn stopped(position: f64) -> PlaybackStatus {
        PlaybackStatus::new(position, 10.0, false)
    }

    #[test]
    fn test_latch_starts_disarmed() {
        let mut detector = AutoAdvanceDetector::new();
        assert!(!detector.is_armed());
        assert_eq!(detector.observe(stopped(10.0)), Observation::Progress);
    }

    #[test]
    fn test_fires_once_until_playing_again() {
        let mut detector = AutoAdvanceDetector::new();
        detector.observe(playing(9.0));
        assert!(detector.is_armed());

        assert_eq!(detector.observe(stopped(10.0)), Observation::Finished);
        for _ in 0..20 {
            assert_ne!(detector.observe(stopped(10.0)), Observation::Finished);
            assert_ne!(detector.observe(stopped(9.8)), Observation::Finished);
        }

        detector.observe(playing(0.0));
        assert_eq!(detector.observe(stopped(9.7)), Observation::Finished);
    }

    #[test]
    fn test_epsilon_boundary() {
        let mut detector = AutoAdvanceDetector::new();
        detector.observe(playing(5.0));

        // 9.3 is more than 0.6 s from the end
        assert_eq!(detector.observe(stopped(9.3)), Observation::Progress);
        assert!(detector.is_armed());

        assert_eq!(detector.observe(stopped(9.5)), Observation::Finished);
    }

    #[test]
    fn test_zero_duration_never_finishes() {
        let mut detector = AutoAdvanceDetector::new();
        detector.observe(PlaybackStatus::new(0.0, 0.0, true));
        assert_eq!(
            detector.observe(PlaybackStatus::new(0.0, 0.0, false)),
            Observation::Progress
        );
        assert!(detector.is_armed());
    }

    #[test]
    fn test_playing_at_end_does_not_finish() {
        let mut detector = AutoAdvanceDetector::new();
        detector.observe(playing(9.0));
        assert_ne!(detector.observe(playing(9.9)), Observation::Finished);
    }

    #[test]
    fn test_stale_samples_still_arm() {
        let mut detector = AutoAdvanceDetector::new();
        assert_eq!(detector.observe(stopped(9.9)), Observation::Progress);

        // Playing sample that barely moved: stale, but arms the latch
        assert_eq!(detector.observe(playing(9.9)), Observation::Stale);
        assert!(detector.is_armed());

        assert_eq!(detector.observe(stopped(10.0)), Observation::Finished);
    }

    #[test]
    fn test_staleness_measured_from_last_published() {
        let mut detector = AutoAdvanceDetector::new();
        assert_eq!(detector.observe(playing(1.0)), Observation::Progress);
        assert_eq!(detector.observe(playing(1.3)), Observation::Stale);
        assert_eq!(detector.observe(playing(1.6)), Observation::Progress);

        // Backwards seek is a large move
        assert_eq!(detector.observe(playing(0.0)), Observation::Progress);

        // Paused samples are never stale
        assert_eq!(detector.observe(stopped(0.0)), Observation::Progress);
        assert_eq!(detector.observe(stopped(0.0)), Observation::Progress);
    }

    #[test]
    fn test_reset_disarms() {
        let mut detector = AutoAdvanceDetector::new();
        detector.observe(playing(9.0));
        detector.reset();

        assert!(!detector.is_armed());
        assert_eq!(detector.observe(stopped(10.0)), Observation::Progress);
    }
}
