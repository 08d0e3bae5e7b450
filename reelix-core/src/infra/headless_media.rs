//! Media backend without a decoder.
//!
//! Drives the playback state machine end to end (dry runs, the CLI
//! `simulate` command) by reporting the status events a real player would.

use std::time::Duration;

use reelix_contracts::media::{
    MediaEvent, MediaEventSink, MediaFactory, MediaFault, MediaProgress,
    MediaResource, MediaStatus, MediaTag,
};
use reelix_model::FeedItem;
use url::Url;

#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessMediaFactory;

impl HeadlessMediaFactory {
    pub fn new() -> Self {
        Self
    }
}

impl MediaFactory for HeadlessMediaFactory {
    fn create(
        &self,
        item: &FeedItem,
        tag: MediaTag,
        events: MediaEventSink,
    ) -> Box<dyn MediaResource> {
        Box::new(HeadlessMedia::new(item, tag, events))
    }
}

#[derive(Debug)]
pub struct HeadlessMedia {
    tag: MediaTag,
    events: MediaEventSink,
    duration: Option<Duration>,
    source: Option<Url>,
    position: Duration,
    playing: bool,
    muted: bool,
    unloaded: bool,
}

impl HeadlessMedia {
    pub fn new(item: &FeedItem, tag: MediaTag, events: MediaEventSink) -> Self {
        let duration = item
            .duration_seconds
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64);
        Self {
            tag,
            events,
            duration,
            source: None,
            position: Duration::ZERO,
            playing: false,
            muted: false,
            unloaded: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn emit(&self, status: MediaStatus) {
        // Receiver gone means the feed shut down; nothing left to notify.
        let _ = self.events.send(MediaEvent {
            tag: self.tag.clone(),
            status,
        });
    }

    fn ensure_live(&self) -> Result<(), MediaFault> {
        if self.unloaded {
            return Err(MediaFault::Stream(format!(
                "{} was unloaded",
                self.tag.item_id
            )));
        }
        Ok(())
    }

    fn progress(&self) -> MediaProgress {
        MediaProgress {
            duration: self.duration,
            playable_duration: self.duration,
            ..MediaProgress::ready_at(self.position)
        }
    }
}

impl MediaResource for HeadlessMedia {
    fn load(&mut self, source: &Url) -> Result<(), MediaFault> {
        self.ensure_live()?;
        tracing::trace!(item_id = %self.tag.item_id, %source, "headless load");
        self.source = Some(source.clone());
        self.emit(MediaStatus::LoadStart);
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaFault> {
        self.ensure_live()?;
        if self.source.is_none() {
            return Err(MediaFault::Stream("play before load".to_string()));
        }
        self.playing = true;
        self.emit(MediaStatus::Progress(self.progress()));
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, position: Duration) -> Result<(), MediaFault> {
        self.ensure_live()?;
        self.position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        if self.playing {
            self.emit(MediaStatus::Progress(self.progress()));
        }
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn unload(&mut self) {
        self.playing = false;
        self.source = None;
        self.unloaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::fixtures::feed_item;
    use reelix_contracts::media::media_event_channel;

    #[test]
    fn reports_load_start_then_ready_progress() {
        let item = feed_item(1);
        let (sink, mut rx) = media_event_channel();
        let tag = MediaTag {
            item_id: item.id.clone(),
            epoch: 7,
        };
        let mut media = HeadlessMediaFactory::new().create(&item, tag.clone(), sink);

        media.load(&item.media_uri).unwrap();
        media.play().unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.tag, tag);
        assert_eq!(first.status, MediaStatus::LoadStart);

        match rx.try_recv().unwrap().status {
            MediaStatus::Progress(progress) => {
                assert!(progress.is_loaded);
                assert!(!progress.is_buffering);
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn unloaded_instance_refuses_to_play() {
        let item = feed_item(2);
        let (sink, _rx) = media_event_channel();
        let mut media = HeadlessMedia::new(
            &item,
            MediaTag {
                item_id: item.id.clone(),
                epoch: 1,
            },
            sink,
        );
        media.load(&item.media_uri).unwrap();
        media.unload();
        assert!(matches!(media.play(), Err(MediaFault::Stream(_))));
    }
}
