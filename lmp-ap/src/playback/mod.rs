//! Playback queue and auto-advance engine

pub mod controller;
pub mod detector;
pub mod loop_policy;
pub mod queue;

pub use controller::{ControllerConfig, PlaybackController};
pub use detector::{AutoAdvanceDetector, FinishLatch, Observation};
pub use loop_policy::{ManualAction, SkipDirection};
pub use queue::Queue;
