//! Loop policy
//!
//! Pure functions deciding which queue index plays next. Natural finishes and
//! manual skips follow different rules: a finish always lands somewhere
//! (restarting the queue at the end, even with loop mode `none`), while a
//! manual `next` at the end only wraps in loop mode `all`.

use lmp_common::LoopMode;

/// Position above which `previous` restarts the current track instead of
/// moving back, in seconds
pub const PREVIOUS_RESTART_THRESHOLD_SECONDS: f64 = 3.0;

/// Direction of a user-initiated skip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Next,
    Previous,
}

/// Outcome of a user-initiated skip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualAction {
    /// Load and play the track at this index
    Play(usize),
    /// Seek the current track back to position 0
    RestartCurrent,
    /// Do nothing
    Stay,
}

/// Index to play after the current track finished on its own
///
/// Returns None only when there is nothing to play (empty queue or no
/// selection).
pub fn next_index_on_finish(len: usize, current: Option<usize>, mode: LoopMode) -> Option<usize> {
    let current = current.filter(|&i| i < len)?;

    match mode {
        LoopMode::One => Some(current),
        LoopMode::All | LoopMode::None => {
            if current + 1 < len {
                Some(current + 1)
            } else {
                Some(0)
            }
        }
    }
}

/// Action for a user-pressed next/previous
///
/// `position_seconds` only matters for [`SkipDirection::Previous`].
pub fn next_index_on_manual_advance(
    len: usize,
    current: Option<usize>,
    mode: LoopMode,
    direction: SkipDirection,
    position_seconds: f64,
) -> ManualAction {
    let Some(current) = current.filter(|&i| i < len) else {
        return ManualAction::Stay;
    };

    match direction {
        SkipDirection::Next => {
            if current + 1 < len {
                ManualAction::Play(current + 1)
            } else if mode == LoopMode::All {
                ManualAction::Play(0)
            } else {
                ManualAction::Stay
            }
        }
        SkipDirection::Previous => {
            if position_seconds > PREVIOUS_RESTART_THRESHOLD_SECONDS {
                ManualAction::RestartCurrent
            } else if current > 0 {
                ManualAction::Play(current - 1)
            } else if mode == LoopMode::All {
                ManualAction::Play(len - 1)
            } else {
                ManualAction::RestartCurrent
            }
        }
    }
}
