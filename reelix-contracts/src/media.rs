//! Playback contracts.
//!
//! A [`MediaResource`] is driven imperatively (load/play/pause/seek/mute/unload)
//! and reports status asynchronously through a [`MediaEventSink`]. Every event
//! carries the [`MediaTag`] it was created with so the coordinator can drop
//! events that belong to an item or instance that is no longer current.

use reelix_model::{FeedItem, ItemId};
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Identifies the resource instance an event originated from.
///
/// `epoch` changes every time a fresh resource is created for the same item,
/// so events emitted by a discarded instance never match the live one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaTag {
    pub item_id: ItemId,
    pub epoch: u64,
}

/// Periodic playback status reported by the resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaProgress {
    pub is_loaded: bool,
    pub is_buffering: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    /// How far the stream has been buffered, measured from the start.
    pub playable_duration: Option<Duration>,
    pub did_just_finish: bool,
}

impl MediaProgress {
    /// Loaded, not buffering, at `position`.
    pub fn ready_at(position: Duration) -> Self {
        Self {
            is_loaded: true,
            is_buffering: false,
            position,
            ..Self::default()
        }
    }

    /// Time buffered past the playhead.
    pub fn buffered_ahead(&self) -> Duration {
        self.playable_duration
            .map(|playable| playable.saturating_sub(self.position))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaStatus {
    LoadStart,
    Progress(MediaProgress),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub tag: MediaTag,
    pub status: MediaStatus,
}

pub type MediaEventSink = mpsc::UnboundedSender<MediaEvent>;
pub type MediaEventReceiver = mpsc::UnboundedReceiver<MediaEvent>;

pub fn media_event_channel() -> (MediaEventSink, MediaEventReceiver) {
    mpsc::unbounded_channel()
}

/// Synchronous failure raised by a resource command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaFault {
    #[error("decoder failure: {0}")]
    Decoder(String),

    #[error("stream failure: {0}")]
    Stream(String),

    #[error("unsupported media: {0}")]
    Unsupported(String),
}

/// One playable media element.
pub trait MediaResource: Send + std::fmt::Debug {
    /// Begin loading `source`. Status follows through the event sink.
    fn load(&mut self, source: &Url) -> Result<(), MediaFault>;

    fn play(&mut self) -> Result<(), MediaFault>;

    fn pause(&mut self);

    fn seek(&mut self, position: Duration) -> Result<(), MediaFault>;

    fn set_muted(&mut self, muted: bool);

    /// Release decoder and audio resources. The instance must not be reused.
    fn unload(&mut self);
}

/// Creates media resources on demand.
pub trait MediaFactory: Send + Sync + std::fmt::Debug {
    fn create(
        &self,
        item: &FeedItem,
        tag: MediaTag,
        events: MediaEventSink,
    ) -> Box<dyn MediaResource>;
}
