use std::time::{Duration, Instant};

use super::buffering::BufferingLabel;

/// Per-item playback state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Buffering,
    Playing,
    Paused,
    Errored(String),
}

impl PlaybackState {
    pub fn is_errored(&self) -> bool {
        matches!(self, PlaybackState::Errored(_))
    }

    /// Waiting for media: loading or buffering.
    pub fn is_waiting(&self) -> bool {
        matches!(self, PlaybackState::Loading | PlaybackState::Buffering)
    }
}

/// Read-only view of one item's playback, for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub should_play: bool,
    pub buffering_label: Option<BufferingLabel>,
    /// When the item started waiting for media without playing.
    pub stalled_since: Option<Instant>,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub muted: bool,
    /// Paused by the user rather than by scrolling or backgrounding.
    pub user_paused: bool,
}

impl PlaybackSnapshot {
    /// Time spent waiting for playback at `now`, if waiting.
    pub fn stalled_for(&self, now: Instant) -> Option<Duration> {
        self.stalled_since
            .map(|since| now.saturating_duration_since(since))
    }
}
