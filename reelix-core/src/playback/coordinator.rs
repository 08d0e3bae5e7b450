use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use reelix_contracts::media::{
    MediaEvent, MediaEventSink, MediaFactory, MediaFault, MediaProgress,
    MediaStatus, MediaTag,
};
use reelix_model::{FeedItem, ItemId};

use super::{
    buffering::{BufferingLabel, classify_buffering},
    lease::MediaLease,
    state::{PlaybackSnapshot, PlaybackState},
};
use crate::error::{FeedError, FeedResult};

/// How many neighbours of the active item keep their resource instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    pub behind: usize,
    pub ahead: usize,
}

impl RetentionWindow {
    pub fn new(behind: usize, ahead: usize) -> Self {
        Self { behind, ahead }
    }

    fn contains(&self, active: usize, index: usize) -> bool {
        index + self.behind >= active && index <= active + self.ahead
    }
}

#[derive(Debug)]
struct Slot {
    lease: MediaLease,
    state: PlaybackState,
    progress: MediaProgress,
    buffering_label: Option<BufferingLabel>,
    stalled_since: Option<Instant>,
    user_paused: bool,
    /// The instance reported a fault and must not be reused.
    faulted: bool,
}

impl Slot {
    fn epoch(&self) -> u64 {
        self.lease.tag().epoch
    }

    fn is_ready(&self) -> bool {
        self.progress.is_loaded && !self.progress.is_buffering
    }

    fn fail(&mut self, reason: String) {
        self.lease.pause();
        self.state = PlaybackState::Errored(reason);
        self.buffering_label = None;
        self.stalled_since = None;
        self.faulted = true;
    }
}

/// Owns every instantiated media resource and the active-item pointer.
///
/// At most one item has `should_play` set at any time; activation always
/// pauses the previous item before the next one is told to play.
#[derive(Debug)]
pub struct PlaybackCoordinator {
    factory: Arc<dyn MediaFactory>,
    events: MediaEventSink,
    slots: HashMap<ItemId, Slot>,
    active: Option<ItemId>,
    should_play: bool,
    retention: RetentionWindow,
    next_epoch: u64,
    muted: bool,
    suspended: bool,
}

impl PlaybackCoordinator {
    pub fn new(
        factory: Arc<dyn MediaFactory>,
        events: MediaEventSink,
        retention: RetentionWindow,
        muted: bool,
    ) -> Self {
        Self {
            factory,
            events,
            slots: HashMap::new(),
            active: None,
            should_play: false,
            retention,
            next_epoch: 0,
            muted,
            suspended: false,
        }
    }

    pub fn active_id(&self) -> Option<&ItemId> {
        self.active.as_ref()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Number of items allowed to play right now: always 0 or 1.
    pub fn should_play_count(&self) -> usize {
        usize::from(self.should_play && self.active.is_some())
    }

    pub fn instantiated(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.slots.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub fn state(&self, id: &ItemId) -> PlaybackState {
        self.slots
            .get(id)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self, id: &ItemId) -> PlaybackSnapshot {
        let is_active = self.active.as_ref() == Some(id);
        match self.slots.get(id) {
            Some(slot) => PlaybackSnapshot {
                state: slot.state.clone(),
                should_play: is_active && self.should_play,
                buffering_label: slot.buffering_label,
                stalled_since: slot.stalled_since,
                position: slot.progress.position,
                duration: slot.progress.duration,
                muted: self.muted,
                user_paused: slot.user_paused,
            },
            None => PlaybackSnapshot {
                muted: self.muted,
                ..PlaybackSnapshot::default()
            },
        }
    }

    /// Make `id` the single playable item.
    ///
    /// Calling this again for the active id is a no-op. Returns whether the
    /// active item changed.
    pub fn activate(&mut self, items: &[FeedItem], id: &ItemId, now: Instant) -> bool {
        if self.active.as_ref() == Some(id) {
            return false;
        }
        let Some(index) = items.iter().position(|item| &item.id == id) else {
            tracing::warn!(item_id = %id, "activate for an item not in the feed");
            return false;
        };

        // Silence everything else before anything may start producing audio.
        self.deactivate_all_except(id);

        tracing::info!(item_id = %id, index, "activating item");
        self.active = Some(id.clone());
        self.should_play = !self.suspended;

        let needs_fresh = self
            .slots
            .get(id)
            .is_none_or(|slot| slot.faulted);
        if needs_fresh {
            self.instantiate(&items[index], now);
        } else if let Some(slot) = self.slots.get_mut(id) {
            slot.user_paused = false;
            if self.should_play {
                Self::start(slot, now);
            }
        }

        self.enforce_retention(items);
        true
    }

    /// Pause every instantiated item except `id`.
    pub fn deactivate_all_except(&mut self, id: &ItemId) {
        if self.active.as_ref().is_some_and(|active| active != id) {
            self.should_play = false;
        }
        for (slot_id, slot) in self.slots.iter_mut() {
            if slot_id == id {
                continue;
            }
            slot.lease.pause();
            Self::settle_paused(slot);
        }
    }

    /// Apply a status event from a media resource. Events for an item that is
    /// not active, or from a discarded instance, are dropped.
    pub fn handle_event(&mut self, event: MediaEvent, now: Instant) -> bool {
        let MediaEvent { tag, status } = event;
        if self.active.as_ref() != Some(&tag.item_id) {
            tracing::debug!(item_id = %tag.item_id, epoch = tag.epoch, "dropping event for inactive item");
            return false;
        }
        let should_play = self.should_play;
        let Some(slot) = self.slots.get_mut(&tag.item_id) else {
            return false;
        };
        if slot.epoch() != tag.epoch {
            tracing::debug!(
                item_id = %tag.item_id,
                epoch = tag.epoch,
                current = slot.epoch(),
                "dropping event from discarded instance"
            );
            return false;
        }
        if slot.faulted {
            return false;
        }

        match status {
            MediaStatus::LoadStart => {
                if slot.state == PlaybackState::Loading {
                    slot.state = PlaybackState::Buffering;
                    slot.buffering_label = Some(BufferingLabel::InitialLoad);
                }
                slot.stalled_since.get_or_insert(now);
            }
            MediaStatus::Progress(progress) => {
                let finished = progress.did_just_finish;
                slot.progress = progress;
                if finished && should_play {
                    // Shorts loop.
                    if let Err(fault) = slot.lease.seek(Duration::ZERO) {
                        tracing::warn!(item_id = %tag.item_id, error = %fault, "loop seek failed");
                    }
                    slot.progress.position = Duration::ZERO;
                }
                Self::apply_progress(slot, should_play, now);
            }
            MediaStatus::Error(reason) => {
                tracing::warn!(item_id = %tag.item_id, %reason, "media error");
                slot.fail(reason);
            }
        }
        tracing::trace!(item_id = %tag.item_id, state = ?slot.state, "media event applied");
        true
    }

    /// Throw away the item's resource and start over with a fresh instance.
    pub fn reload(&mut self, items: &[FeedItem], id: &ItemId, now: Instant) -> bool {
        let Some(item) = items.iter().find(|item| &item.id == id) else {
            return false;
        };
        if let Some(old) = self.slots.remove(id) {
            tracing::info!(item_id = %id, epoch = old.epoch(), "reloading media");
        }
        if self.active.as_ref() == Some(id) {
            self.should_play = !self.suspended;
            self.instantiate(item, now);
        }
        true
    }

    /// User play/pause on the active item. Returns the resulting state.
    pub fn toggle(&mut self, id: &ItemId, now: Instant) -> Option<PlaybackState> {
        if self.active.as_ref() != Some(id) || self.suspended {
            return None;
        }
        let should_play = !self.should_play;
        let slot = self.slots.get_mut(id)?;
        if slot.faulted {
            return Some(slot.state.clone());
        }

        if should_play {
            slot.user_paused = false;
            Self::start(slot, now);
        } else {
            slot.user_paused = true;
            slot.lease.pause();
            Self::settle_paused(slot);
        }
        self.should_play = should_play && !slot.state.is_errored();
        tracing::debug!(item_id = %id, should_play = self.should_play, "playback toggled");
        Some(slot.state.clone())
    }

    pub fn seek(&mut self, id: &ItemId, position: Duration) -> FeedResult<()> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| FeedError::Playback(format!("{id} is not loaded")))?;
        slot.lease.seek(position).map_err(FeedError::from)?;
        slot.progress.position = position;
        Ok(())
    }

    /// Global mute, applied to every instantiated resource.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        for slot in self.slots.values_mut() {
            slot.lease.set_muted(muted);
        }
    }

    /// App went to the background.
    pub fn suspend(&mut self) {
        if self.suspended {
            return;
        }
        self.suspended = true;
        self.pause_active();
        tracing::debug!("playback suspended");
    }

    /// App returned to the foreground. A user-paused item stays paused.
    pub fn resume_foreground(&mut self, now: Instant) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        let Some(id) = self.active.clone() else {
            return;
        };
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if slot.user_paused || slot.faulted {
            return;
        }
        self.should_play = true;
        Self::start(slot, now);
        tracing::debug!(item_id = %id, "playback resumed");
    }

    /// Release resources for items no longer in `items`, then re-apply the
    /// retention window.
    pub fn retain(&mut self, items: &[FeedItem]) {
        self.slots
            .retain(|id, _| items.iter().any(|item| &item.id == id));
        if let Some(active) = &self.active
            && !items.iter().any(|item| &item.id == active)
        {
            tracing::debug!(item_id = %active, "active item left the feed");
            self.active = None;
            self.should_play = false;
        }
        self.enforce_retention(items);
    }

    /// Unload everything outside the retention window around the active item.
    pub fn enforce_retention(&mut self, items: &[FeedItem]) {
        let Some(active_index) = self
            .active
            .as_ref()
            .and_then(|active| items.iter().position(|item| &item.id == active))
        else {
            return;
        };
        let window = self.retention;
        let before = self.slots.len();
        self.slots.retain(|id, _| {
            items
                .iter()
                .position(|item| &item.id == id)
                .is_some_and(|index| window.contains(active_index, index))
        });
        let released = before - self.slots.len();
        if released > 0 {
            tracing::debug!(released, "released media outside retention window");
        }
    }

    /// Drop a single item's resource (the item left the feed).
    pub fn release(&mut self, id: &ItemId) {
        self.slots.remove(id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
            self.should_play = false;
        }
    }

    /// Teardown: every lease is dropped, which pauses and unloads it.
    pub fn release_all(&mut self) {
        self.should_play = false;
        self.active = None;
        let count = self.slots.len();
        self.slots.clear();
        tracing::debug!(count, "released all media");
    }

    fn pause_active(&mut self) {
        self.should_play = false;
        let Some(active) = &self.active else {
            return;
        };
        if let Some(slot) = self.slots.get_mut(active) {
            slot.lease.pause();
            Self::settle_paused(slot);
        }
    }

    fn settle_paused(slot: &mut Slot) {
        match slot.state {
            PlaybackState::Playing
            | PlaybackState::Buffering
            | PlaybackState::Loading
            | PlaybackState::Errored(_) => {
                slot.state = PlaybackState::Paused;
            }
            PlaybackState::Idle | PlaybackState::Paused => {}
        }
        slot.buffering_label = None;
        slot.stalled_since = None;
    }

    fn instantiate(&mut self, item: &FeedItem, now: Instant) {
        self.next_epoch += 1;
        let tag = MediaTag {
            item_id: item.id.clone(),
            epoch: self.next_epoch,
        };
        let resource = self.factory.create(item, tag.clone(), self.events.clone());
        let mut slot = Slot {
            lease: MediaLease::new(tag, resource),
            state: PlaybackState::Idle,
            progress: MediaProgress::default(),
            buffering_label: None,
            stalled_since: None,
            user_paused: false,
            faulted: false,
        };

        slot.lease.set_muted(self.muted);
        slot.state = PlaybackState::Loading;
        slot.stalled_since = Some(now);
        tracing::debug!(item_id = %item.id, epoch = self.next_epoch, "media instantiated");

        if let Err(fault) = slot.lease.load(&item.media_uri) {
            Self::fault(&mut slot, &item.id, fault);
        } else if self.should_play {
            if let Err(fault) = slot.lease.play() {
                Self::fault(&mut slot, &item.id, fault);
            }
        }

        // Replacing an existing slot drops its lease, releasing the old instance.
        self.slots.insert(item.id.clone(), slot);
    }

    fn start(slot: &mut Slot, now: Instant) {
        if let Err(fault) = slot.lease.play() {
            let id = slot.lease.tag().item_id.clone();
            Self::fault(slot, &id, fault);
            return;
        }
        if slot.is_ready() {
            slot.state = PlaybackState::Playing;
            slot.buffering_label = None;
            slot.stalled_since = None;
        } else {
            if slot.state == PlaybackState::Paused || slot.state == PlaybackState::Idle {
                slot.state = if slot.progress.is_loaded {
                    PlaybackState::Buffering
                } else {
                    PlaybackState::Loading
                };
            }
            slot.stalled_since.get_or_insert(now);
        }
    }

    fn apply_progress(slot: &mut Slot, should_play: bool, now: Instant) {
        if slot.is_ready() {
            slot.buffering_label = None;
            slot.stalled_since = None;
            slot.state = if should_play {
                PlaybackState::Playing
            } else {
                PlaybackState::Paused
            };
        } else if should_play {
            let stalled = slot.state == PlaybackState::Playing
                || slot.state == PlaybackState::Buffering;
            slot.state = PlaybackState::Buffering;
            slot.buffering_label = Some(classify_buffering(&slot.progress, stalled));
            slot.stalled_since.get_or_insert(now);
        }
    }

    fn fault(slot: &mut Slot, id: &ItemId, fault: MediaFault) {
        tracing::warn!(item_id = %id, error = %fault, "media fault");
        slot.fail(fault.to_string());
    }
}
