use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use reelix_contracts::media::{
    MediaEvent, MediaEventSink, MediaFactory, MediaFault, MediaProgress,
    MediaResource, MediaStatus, MediaTag,
};
use reelix_model::{FeedItem, ItemId};
use url::Url;

/// One imperative call made against a media resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Create { item_id: ItemId, epoch: u64 },
    Load(ItemId),
    Play(ItemId),
    Pause(ItemId),
    Seek(ItemId, Duration),
    Mute(ItemId, bool),
    Unload(ItemId),
}

impl MediaCall {
    pub fn item_id(&self) -> &ItemId {
        match self {
            MediaCall::Create { item_id, .. } => item_id,
            MediaCall::Load(id)
            | MediaCall::Play(id)
            | MediaCall::Pause(id)
            | MediaCall::Seek(id, _)
            | MediaCall::Mute(id, _)
            | MediaCall::Unload(id) => id,
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<MediaCall>,
    sinks: HashMap<ItemId, (MediaTag, MediaEventSink)>,
    playing: HashSet<ItemId>,
    max_playing: usize,
    failing_play: HashSet<ItemId>,
    failing_load: HashSet<ItemId>,
}

/// Media factory that records every call and lets tests inject status events.
#[derive(Debug, Clone, Default)]
pub struct RecordingMediaFactory {
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingMediaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.inner.lock().calls.clone()
    }

    pub fn calls_for(&self, item_id: &ItemId) -> Vec<MediaCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| call.item_id() == item_id)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Resources currently told to play and not paused or unloaded since.
    pub fn playing(&self) -> HashSet<ItemId> {
        self.inner.lock().playing.clone()
    }

    /// Highest number of simultaneously playing resources ever observed.
    pub fn max_concurrent_playing(&self) -> usize {
        self.inner.lock().max_playing
    }

    pub fn fail_play_for(&self, item_id: &ItemId) {
        self.inner.lock().failing_play.insert(item_id.clone());
    }

    pub fn fail_load_for(&self, item_id: &ItemId) {
        self.inner.lock().failing_load.insert(item_id.clone());
    }

    pub fn heal(&self, item_id: &ItemId) {
        let mut inner = self.inner.lock();
        inner.failing_play.remove(item_id);
        inner.failing_load.remove(item_id);
    }

    /// Tag of the most recently created resource for `item_id`.
    pub fn latest_tag(&self, item_id: &ItemId) -> Option<MediaTag> {
        self.inner
            .lock()
            .sinks
            .get(item_id)
            .map(|(tag, _)| tag.clone())
    }

    /// Send `status` as if the latest resource for `item_id` reported it.
    pub fn emit(&self, item_id: &ItemId, status: MediaStatus) -> bool {
        let inner = self.inner.lock();
        match inner.sinks.get(item_id) {
            Some((tag, sink)) => sink
                .send(MediaEvent {
                    tag: tag.clone(),
                    status,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Send `status` with an explicit tag, e.g. one from a discarded instance.
    pub fn emit_tagged(&self, tag: MediaTag, status: MediaStatus) -> bool {
        let inner = self.inner.lock();
        match inner.sinks.get(&tag.item_id) {
            Some((_, sink)) => sink.send(MediaEvent { tag, status }).is_ok(),
            None => false,
        }
    }

    pub fn emit_ready(&self, item_id: &ItemId) -> bool {
        self.emit(
            item_id,
            MediaStatus::Progress(MediaProgress {
                duration: Some(Duration::from_secs(30)),
                playable_duration: Some(Duration::from_secs(10)),
                ..MediaProgress::ready_at(Duration::ZERO)
            }),
        )
    }
}

impl MediaFactory for RecordingMediaFactory {
    fn create(
        &self,
        item: &FeedItem,
        tag: MediaTag,
        events: MediaEventSink,
    ) -> Box<dyn MediaResource> {
        let mut inner = self.inner.lock();
        inner.calls.push(MediaCall::Create {
            item_id: item.id.clone(),
            epoch: tag.epoch,
        });
        inner
            .sinks
            .insert(item.id.clone(), (tag.clone(), events));
        Box::new(RecordingMedia {
            item_id: item.id.clone(),
            recorder: Arc::clone(&self.inner),
        })
    }
}

#[derive(Debug)]
struct RecordingMedia {
    item_id: ItemId,
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingMedia {
    fn record(&self, call: MediaCall) {
        self.recorder.lock().calls.push(call);
    }

    fn stop(&self, call: MediaCall) {
        let mut recorder = self.recorder.lock();
        recorder.calls.push(call);
        recorder.playing.remove(&self.item_id);
    }
}

impl MediaResource for RecordingMedia {
    fn load(&mut self, _source: &Url) -> Result<(), MediaFault> {
        self.record(MediaCall::Load(self.item_id.clone()));
        if self.recorder.lock().failing_load.contains(&self.item_id) {
            return Err(MediaFault::Unsupported("scripted load failure".into()));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaFault> {
        let mut recorder = self.recorder.lock();
        recorder.calls.push(MediaCall::Play(self.item_id.clone()));
        if recorder.failing_play.contains(&self.item_id) {
            return Err(MediaFault::Decoder("scripted play failure".into()));
        }
        recorder.playing.insert(self.item_id.clone());
        recorder.max_playing = recorder.max_playing.max(recorder.playing.len());
        Ok(())
    }

    fn pause(&mut self) {
        self.stop(MediaCall::Pause(self.item_id.clone()));
    }

    fn seek(&mut self, position: Duration) -> Result<(), MediaFault> {
        self.record(MediaCall::Seek(self.item_id.clone(), position));
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(MediaCall::Mute(self.item_id.clone(), muted));
    }

    fn unload(&mut self) {
        self.stop(MediaCall::Unload(self.item_id.clone()));
    }
}
