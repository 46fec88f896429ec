//! Playback controller
//!
//! One task owns the queue, loop mode, finish detector and the output device.
//! [`PlaybackController`] is a cheap, cloneable handle that sends commands to
//! that task; the task also polls the device on a fixed interval, so user
//! commands and auto-advance run strictly one after another.
//!
//! A resource load is awaited inside the task. Commands that arrive while it
//! is in flight stay in the channel and run afterwards. When a finish is
//! detected, commands already waiting are taken first; if one of them loads a
//! resource (play, or a next/previous that moves) it replaces the automatic
//! advance, so a race between the two only ever loads one resource. A waiting
//! command that loads nothing leaves the automatic advance in place.

use crate::audio::{AudioOutput, PlaybackStatus};
use crate::playback::detector::{AutoAdvanceDetector, Observation};
use crate::playback::loop_policy::{self, ManualAction, SkipDirection};
use crate::playback::queue::Queue;
use crate::state::{PlaybackState, PlayerView, SharedState};
use crate::store::{session, KeyValueStore};
use chrono::Utc;
use lmp_common::events::{FinishReason, LmpEvent};
use lmp_common::{LoopMode, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Default device status poll interval
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Controller tuning
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// How often the task samples [`AudioOutput::status`]
    pub status_poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            status_poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
        }
    }
}

enum Command {
    PlayTrack {
        track: Track,
        context: Option<Vec<Track>>,
        reply: oneshot::Sender<()>,
    },
    TogglePlayPause {
        reply: oneshot::Sender<()>,
    },
    Seek {
        seconds: f64,
        reply: oneshot::Sender<()>,
    },
    Next {
        reply: oneshot::Sender<()>,
    },
    Previous {
        reply: oneshot::Sender<()>,
    },
    SetLoopMode {
        mode: LoopMode,
        reply: oneshot::Sender<()>,
    },
    ToggleLoopMode {
        reply: oneshot::Sender<LoopMode>,
    },
    ReportStatus {
        status: PlaybackStatus,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::PlayTrack { .. } => "play_track",
            Command::TogglePlayPause { .. } => "toggle_play_pause",
            Command::Seek { .. } => "seek",
            Command::Next { .. } => "next",
            Command::Previous { .. } => "previous",
            Command::SetLoopMode { .. } => "set_loop_mode",
            Command::ToggleLoopMode { .. } => "toggle_loop_mode",
            Command::ReportStatus { .. } => "report_status",
            Command::Shutdown { .. } => "shutdown",
        }
    }
}

/// Handle to the playback controller task
///
/// All operations return once the task has applied them. Device and
/// persistence failures are logged by the task and never returned.
#[derive(Clone)]
pub struct PlaybackController {
    tx: mpsc::Sender<Command>,
    state: Arc<SharedState>,
}

impl PlaybackController {
    /// Restore the saved session and start the controller task
    ///
    /// The restored queue is selected but not played.
    pub async fn spawn(
        output: Box<dyn AudioOutput>,
        store: Arc<dyn KeyValueStore>,
        state: Arc<SharedState>,
        config: ControllerConfig,
    ) -> Self {
        let saved = session::restore(store.as_ref()).await;

        let mut queue = Queue::new();
        if let Some(index) = saved.current_index {
            if let Err(e) = queue.load(saved.tracks, index) {
                warn!("Ignoring restored queue: {}", e);
            }
        }

        info!(
            "Restored session: {} tracks, index {:?}, loop mode {}",
            queue.len(),
            queue.current_index(),
            saved.loop_mode
        );

        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let mut task = ControllerTask {
            output,
            queue,
            loop_mode: saved.loop_mode,
            detector: AutoAdvanceDetector::new(),
            playback_state: PlaybackState::Idle,
            store,
            state: Arc::clone(&state),
            running: true,
        };
        task.publish_restored().await;

        tokio::spawn(task.run(rx, config.status_poll_interval));

        Self { tx, state }
    }

    /// Play `track`, optionally replacing the queue with `queue`
    pub async fn play_track(&self, track: Track, queue: Option<Vec<Track>>) {
        self.request(|reply| Command::PlayTrack {
            track,
            context: queue,
            reply,
        })
        .await;
    }

    pub async fn toggle_play_pause(&self) {
        self.request(|reply| Command::TogglePlayPause { reply }).await;
    }

    /// Seek the current track; negative or non-finite positions seek to 0
    pub async fn seek(&self, seconds: f64) {
        self.request(|reply| Command::Seek { seconds, reply }).await;
    }

    pub async fn next(&self) {
        self.request(|reply| Command::Next { reply }).await;
    }

    pub async fn previous(&self) {
        self.request(|reply| Command::Previous { reply }).await;
    }

    pub async fn set_loop_mode(&self, mode: LoopMode) {
        self.request(|reply| Command::SetLoopMode { mode, reply })
            .await;
    }

    /// Cycle none -> one -> all -> none and return the new mode
    pub async fn toggle_loop_mode(&self) -> LoopMode {
        match self.request(|reply| Command::ToggleLoopMode { reply }).await {
            Some(mode) => mode,
            None => self.state.get_view().await.loop_mode,
        }
    }

    /// Feed a status sample without waiting for the next poll
    ///
    /// For devices that push their status. Samples go through the same queue
    /// as commands, so ordering against user actions is preserved.
    pub fn report_status(&self, status: PlaybackStatus) {
        if let Err(e) = self.tx.try_send(Command::ReportStatus { status }) {
            warn!("Dropping status report: {}", e);
        }
    }

    /// Stop the task; the loaded resource is paused
    pub async fn shutdown(&self) {
        self.request(|reply| Command::Shutdown { reply }).await;
    }

    pub async fn view(&self) -> PlayerView {
        self.state.get_view().await
    }

    pub async fn queue(&self) -> Vec<Track> {
        self.state.get_queue().await
    }

    pub fn shared_state(&self) -> &Arc<SharedState> {
        &self.state
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (reply, rx) = oneshot::channel();
        let command = make(reply);
        let name = command.name();

        if self.tx.send(command).await.is_err() {
            warn!("Playback controller not running, dropping {}", name);
            return None;
        }

        rx.await.ok()
    }
}

/// State owned by the controller task
struct ControllerTask {
    output: Box<dyn AudioOutput>,
    queue: Queue,
    loop_mode: LoopMode,
    detector: AutoAdvanceDetector,
    playback_state: PlaybackState,
    store: Arc<dyn KeyValueStore>,
    state: Arc<SharedState>,
    running: bool,
}

impl ControllerTask {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>, poll_interval: Duration) {
        let mut ticker = time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Playback controller started ({}ms status poll)",
            poll_interval.as_millis()
        );

        while self.running {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.dispatch(command, &mut rx).await,
                    None => break,
                },
                _ = ticker.tick() => {
                    let sample = self.output.status();
                    if let Some(status) = sample {
                        self.on_status(status, &mut rx).await;
                    }
                }
            }
        }

        info!("Playback controller stopped");
    }

    async fn dispatch(&mut self, command: Command, rx: &mut mpsc::Receiver<Command>) {
        match command {
            Command::ReportStatus { status } => self.on_status(status, rx).await,
            other => {
                self.apply(other).await;
            }
        }
    }

    /// Run one command; status reports reaching here are dropped
    ///
    /// Returns true when the command loaded a resource.
    async fn apply(&mut self, command: Command) -> bool {
        let mut loaded = false;
        match command {
            Command::PlayTrack {
                track,
                context,
                reply,
            } => {
                loaded = self.play_track(track, context).await;
                let _ = reply.send(());
            }
            Command::TogglePlayPause { reply } => {
                self.toggle_play_pause().await;
                let _ = reply.send(());
            }
            Command::Seek { seconds, reply } => {
                self.seek(seconds).await;
                let _ = reply.send(());
            }
            Command::Next { reply } => {
                loaded = self.skip(SkipDirection::Next).await;
                let _ = reply.send(());
            }
            Command::Previous { reply } => {
                loaded = self.skip(SkipDirection::Previous).await;
                let _ = reply.send(());
            }
            Command::SetLoopMode { mode, reply } => {
                self.set_loop_mode(mode).await;
                let _ = reply.send(());
            }
            Command::ToggleLoopMode { reply } => {
                let mode = self.loop_mode.cycle();
                self.set_loop_mode(mode).await;
                let _ = reply.send(mode);
            }
            Command::ReportStatus { .. } => {
                // Queued before the finish was handled; describes the old track
                debug!("Dropping status report queued behind a finish");
            }
            Command::Shutdown { reply } => {
                if self.playback_state.is_loaded() {
                    if let Err(e) = self.output.pause() {
                        warn!("Failed to pause on shutdown: {}", e);
                    }
                }
                self.running = false;
                let _ = reply.send(());
            }
        }
        loaded
    }

    async fn on_status(&mut self, status: PlaybackStatus, rx: &mut mpsc::Receiver<Command>) {
        if !self.playback_state.is_loaded() {
            return;
        }

        match self.detector.observe(status) {
            Observation::Finished => self.on_track_finished(status, rx).await,
            Observation::Progress => self.publish_progress(status).await,
            Observation::Stale => {}
        }
    }

    async fn on_track_finished(
        &mut self,
        status: PlaybackStatus,
        rx: &mut mpsc::Receiver<Command>,
    ) {
        let finished = self.queue.current_track().cloned();
        if let Some(track) = &finished {
            info!("Track finished: {}", track.id);
            self.state.broadcast_event(LmpEvent::TrackFinished {
                track_id: track.id.clone(),
                reason: FinishReason::Completed,
                timestamp: Utc::now(),
            });
        }

        self.state
            .update_view(|v| {
                v.is_playing = false;
                v.position_seconds = status.position_seconds;
                v.duration_seconds = status.duration_seconds;
            })
            .await;
        self.set_playback_state(PlaybackState::Finished).await;

        let mut backlog = Vec::new();
        while let Ok(command) = rx.try_recv() {
            backlog.push(command);
        }

        let mut superseded = false;
        for command in backlog {
            let name = command.name();
            if self.apply(command).await && !superseded {
                info!("Auto-advance superseded by queued {}", name);
                superseded = true;
            }
        }

        if !superseded && self.running {
            self.auto_advance().await;
        }
    }

    /// Load the loop policy's choice without pausing first
    async fn auto_advance(&mut self) {
        let next = loop_policy::next_index_on_finish(
            self.queue.len(),
            self.queue.current_index(),
            self.loop_mode,
        );

        let Some(index) = next else {
            info!("Nothing left to play");
            self.set_playback_state(PlaybackState::Idle).await;
            return;
        };

        let Some(track) = self.queue.get(index).cloned() else {
            return;
        };

        debug!("Auto-advancing to index {} ({})", index, track.id);

        match self.load_and_play(&track).await {
            Ok(state) => {
                if let Err(e) = self.queue.advance_to(index) {
                    error!("Auto-advance target vanished: {}", e);
                }
                self.on_track_started(state, false).await;
            }
            Err(e) => {
                error!("Auto-advance to {} failed: {}", track.uri, e);
                self.set_playback_state(PlaybackState::Finished).await;
            }
        }
    }

    /// Returns true when the target was loaded
    async fn play_track(&mut self, track: Track, context: Option<Vec<Track>>) -> bool {
        let (tracks, index) = match context.filter(|c| !c.is_empty()) {
            Some(context) => {
                let index = context.iter().position(|t| t.id == track.id).unwrap_or(0);
                (context, index)
            }
            None => match self.queue.index_of(&track.id) {
                Some(index) => (self.queue.tracks().to_vec(), index),
                None => (vec![track], 0),
            },
        };

        let Some(target) = tracks.get(index).cloned() else {
            return false;
        };

        let previous_state = self.playback_state;
        let outgoing = self.queue.current_track().cloned();
        self.pause_current();

        match self.load_and_play(&target).await {
            Ok(state) => {
                self.supersede(outgoing, previous_state);
                if let Err(e) = self.queue.load(tracks, index) {
                    error!("Failed to replace queue: {}", e);
                }
                self.on_track_started(state, true).await;
                true
            }
            Err(e) => {
                warn!("Failed to load {}: {}", target.uri, e);
                self.recover_failed_load(previous_state).await;
                false
            }
        }
    }

    /// Returns true when a resource was loaded
    async fn skip(&mut self, direction: SkipDirection) -> bool {
        let position = self
            .output
            .status()
            .map(|s| s.position_seconds)
            .unwrap_or(0.0);

        let action = loop_policy::next_index_on_manual_advance(
            self.queue.len(),
            self.queue.current_index(),
            self.loop_mode,
            direction,
            position,
        );

        debug!("{:?} at {:.1}s -> {:?}", direction, position, action);

        match action {
            ManualAction::Play(index) => self.play_index(index).await,
            ManualAction::RestartCurrent if self.playback_state.is_loaded() => {
                self.seek(0.0).await;
                false
            }
            ManualAction::RestartCurrent => match self.queue.current_index() {
                // Restored but never loaded
                Some(index) => self.play_index(index).await,
                None => false,
            },
            ManualAction::Stay => false,
        }
    }

    async fn play_index(&mut self, index: usize) -> bool {
        let Some(target) = self.queue.get(index).cloned() else {
            return false;
        };

        let previous_state = self.playback_state;
        let outgoing = self.queue.current_track().cloned();
        self.pause_current();

        match self.load_and_play(&target).await {
            Ok(state) => {
                self.supersede(outgoing, previous_state);
                if let Err(e) = self.queue.advance_to(index) {
                    error!("Skip target vanished: {}", e);
                }
                self.on_track_started(state, false).await;
                true
            }
            Err(e) => {
                warn!("Failed to load {}: {}", target.uri, e);
                self.recover_failed_load(previous_state).await;
                false
            }
        }
    }

    async fn toggle_play_pause(&mut self) {
        if !self.playback_state.is_loaded() {
            debug!("Toggle ignored, nothing loaded");
            return;
        }

        let playing = self
            .output
            .status()
            .map(|s| s.is_playing)
            .unwrap_or(self.playback_state == PlaybackState::Playing);

        if playing {
            match self.output.pause() {
                Ok(()) => self.set_playback_state(PlaybackState::Paused).await,
                Err(e) => warn!("Pause failed: {}", e),
            }
        } else {
            if let Err(e) = self.output.play() {
                warn!("Resume failed: {}", e);
                return;
            }
            // A device stopped at the end of its resource stays stopped
            let started = self.output.status().map_or(true, |s| s.is_playing);
            if started {
                self.set_playback_state(PlaybackState::Playing).await;
            } else {
                debug!("Resume had no effect, device did not start");
            }
        }
    }

    async fn seek(&mut self, seconds: f64) {
        let target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

        if !self.playback_state.is_loaded() {
            debug!("Seek ignored, nothing loaded");
            return;
        }

        match self.output.seek(target).await {
            Ok(()) => {
                self.state
                    .update_view(|v| v.position_seconds = target)
                    .await;
            }
            Err(e) => warn!("Seek to {:.2}s failed: {}", target, e),
        }
    }

    async fn set_loop_mode(&mut self, mode: LoopMode) {
        if mode == self.loop_mode {
            return;
        }

        info!("Loop mode: {} -> {}", self.loop_mode, mode);
        self.loop_mode = mode;

        if let Err(e) = session::save_loop_mode(self.store.as_ref(), mode).await {
            warn!("Failed to save loop mode: {}", e);
        }

        self.state.update_view(|v| v.loop_mode = mode).await;
        self.state.broadcast_event(LmpEvent::LoopModeChanged {
            mode,
            timestamp: Utc::now(),
        });
    }

    /// Swap in `track` and start it; the detector forgets the old resource first
    async fn load_and_play(&mut self, track: &Track) -> crate::Result<PlaybackState> {
        self.detector.reset();
        self.set_playback_state(PlaybackState::Loading).await;

        self.output.load(&track.uri).await?;

        match self.output.play() {
            Ok(()) => Ok(PlaybackState::Playing),
            Err(e) => {
                warn!("Loaded {} but could not start it: {}", track.id, e);
                Ok(PlaybackState::Paused)
            }
        }
    }

    fn pause_current(&mut self) {
        if self.playback_state.is_loaded() {
            if let Err(e) = self.output.pause() {
                warn!("Failed to pause current track: {}", e);
            }
        }
    }

    /// Put the state machine back where it was before a rejected load
    async fn recover_failed_load(&mut self, previous_state: PlaybackState) {
        if previous_state == PlaybackState::Playing {
            if let Err(e) = self.output.play() {
                warn!("Failed to resume previous track: {}", e);
            }
        }
        self.set_playback_state(previous_state).await;
    }

    fn supersede(&self, outgoing: Option<Track>, previous_state: PlaybackState) {
        if !matches!(previous_state, PlaybackState::Playing | PlaybackState::Paused) {
            return;
        }
        if let Some(track) = outgoing {
            self.state.broadcast_event(LmpEvent::TrackFinished {
                track_id: track.id,
                reason: FinishReason::Superseded,
                timestamp: Utc::now(),
            });
        }
    }

    /// Publish and persist a freshly started track
    async fn on_track_started(&mut self, state: PlaybackState, queue_replaced: bool) {
        let track = self.queue.current_track().cloned();
        let index = self.queue.current_index();
        let length = self.queue.len();

        if queue_replaced {
            let tracks = self.queue.tracks().to_vec();
            if let Err(e) = session::save_queue(self.store.as_ref(), &tracks).await {
                warn!("Failed to save queue: {}", e);
            }
            self.state.set_queue(tracks).await;
        }

        if let Err(e) = session::save_current(self.store.as_ref(), track.as_ref()).await {
            warn!("Failed to save current track: {}", e);
        }

        let view_track = track.clone();
        self.state
            .update_view(move |v| {
                v.current_track = view_track;
                v.current_index = index;
                v.position_seconds = 0.0;
                v.duration_seconds = 0.0;
                v.queue_length = length;
            })
            .await;

        if let (Some(track), Some(index)) = (track, index) {
            info!("Playing [{}] {} - {}", index, track.artist, track.title);
            self.state.broadcast_event(LmpEvent::TrackStarted {
                track,
                index,
                timestamp: Utc::now(),
            });
        }

        self.state.broadcast_event(LmpEvent::QueueChanged {
            length,
            current_index: index,
            timestamp: Utc::now(),
        });

        self.set_playback_state(state).await;
    }

    async fn publish_progress(&mut self, status: PlaybackStatus) {
        self.state
            .update_view(|v| {
                v.position_seconds = status.position_seconds;
                v.duration_seconds = status.duration_seconds;
                v.is_playing = status.is_playing;
            })
            .await;

        if let Some(track) = self.queue.current_track() {
            self.state.broadcast_event(LmpEvent::PlaybackPosition {
                track_id: track.id.clone(),
                position_seconds: status.position_seconds,
                duration_seconds: status.duration_seconds,
                playing: status.is_playing,
                timestamp: Utc::now(),
            });
        }
    }

    async fn set_playback_state(&mut self, state: PlaybackState) {
        if state == self.playback_state {
            return;
        }

        debug!("Playback state: {:?} -> {:?}", self.playback_state, state);
        self.playback_state = state;

        self.state
            .update_view(|v| {
                v.state = state;
                v.is_playing = state == PlaybackState::Playing;
            })
            .await;
        self.state.broadcast_event(LmpEvent::PlaybackStateChanged {
            state,
            timestamp: Utc::now(),
        });
    }

    /// Seed the shared view with the restored session
    async fn publish_restored(&mut self) {
        let tracks = self.queue.tracks().to_vec();
        let track = self.queue.current_track().cloned();
        let index = self.queue.current_index();
        let loop_mode = self.loop_mode;

        self.state.set_queue(tracks.clone()).await;
        self.state
            .update_view(move |v| {
                *v = PlayerView {
                    current_track: track,
                    current_index: index,
                    loop_mode,
                    queue_length: tracks.len(),
                    ..PlayerView::default()
                };
            })
            .await;
    }
}
