//! The shorts feed: one paginated list, one playing item.
//!
//! [`ShortsFeed`] wires the feed controller, viewability tracker, playback
//! coordinator, interaction store and moderation together and owns the
//! per-item cards. Hosts drive it with viewability batches, taps, clock
//! ticks and the media event stream, and render [`CardView`]s.
//!
//! Nothing here holds the feed across a network wait. Requests start
//! synchronously and come back as owned futures ([`PendingPage`],
//! [`PendingLike`], [`ReactionSync`]) that the host runs wherever it likes
//! while it keeps feeding scroll and tap input. Finished page fetches go back
//! in through [`ShortsFeed::apply_page`]. The `async` conveniences run
//! start, fetch and apply back to back for hosts that don't need that.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use reelix_contracts::{
    client::{FeedClient, InteractionClient},
    media::{MediaEventReceiver, MediaFactory, media_event_channel},
};
use reelix_model::{Comment, CommentId, CreatorId, FeedItem, ItemId, ReportReason, ReportTarget};

use crate::{
    card::{Card, CardCommand, CardView},
    config::FeedConfig,
    error::{FeedError, FeedResult},
    feed::{FeedController, PageOutcome, PageState, PendingPage},
    interaction::{
        CommentOutcome, CommentThread, InteractionState, InteractionStore, LikeOutcome,
        PendingLike, ReactionSync,
    },
    moderation::ModerationService,
    notices::{Notice, NoticeBoard},
    playback::{PlaybackCoordinator, PlaybackSnapshot, PlaybackState, RetentionWindow},
    session::AuthSession,
    viewability::{ViewabilityTracker, ViewableToken},
};

/// Result of a viewability batch.
#[derive(Debug, Default)]
pub struct ViewabilityOutcome {
    /// Newly activated item, if the selection changed.
    pub activated: Option<ItemId>,
    /// The active item is close enough to the end to load the next page.
    pub near_end: bool,
    /// Server fetch of whether the newly active item is already liked.
    pub reaction_sync: Option<ReactionSync>,
}

#[derive(Debug, Default)]
pub struct TapOutcome {
    /// What the card asked for; playback toggles are already applied.
    pub commands: Vec<CardCommand>,
    /// The like a double tap started, already visible optimistically.
    pub like: Option<PendingLike>,
}

pub struct ShortsFeed {
    config: FeedConfig,
    feed: FeedController,
    viewability: ViewabilityTracker,
    playback: PlaybackCoordinator,
    interactions: InteractionStore,
    moderation: ModerationService,
    cards: HashMap<ItemId, Card>,
    media_events: MediaEventReceiver,
    notices: NoticeBoard,
    session: AuthSession,
    reaction_sync: Option<ReactionSync>,
}

impl std::fmt::Debug for ShortsFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortsFeed")
            .field("feed", &self.feed)
            .field("active", &self.playback.active_id())
            .field("cards", &self.cards.len())
            .finish()
    }
}

impl ShortsFeed {
    pub fn new(
        config: FeedConfig,
        feed_client: Arc<dyn FeedClient>,
        interaction_client: Arc<dyn InteractionClient>,
        media: Arc<dyn MediaFactory>,
        session: AuthSession,
    ) -> Self {
        let notices = NoticeBoard::new();
        let (sink, media_events) = media_event_channel();

        let feed = FeedController::new(feed_client, config.page_size, config.sort);
        let viewability = ViewabilityTracker::new(config.viewability_threshold);
        let playback = PlaybackCoordinator::new(
            media,
            sink,
            RetentionWindow::new(config.retain_behind, config.retain_ahead),
            config.start_muted,
        );
        let interactions = InteractionStore::new(
            Arc::clone(&interaction_client),
            session.clone(),
            notices.clone(),
            config.interaction_cache_capacity,
            config.comments_page_size,
        );
        let moderation = ModerationService::new(interaction_client, session.clone(), notices.clone());

        Self {
            config,
            feed,
            viewability,
            playback,
            interactions,
            moderation,
            cards: HashMap::new(),
            media_events,
            notices,
            session,
            reaction_sync: None,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Shared handle to the feed controller, for hosts that drive page
    /// requests themselves.
    pub fn controller(&self) -> &FeedController {
        &self.feed
    }

    /// Shared handle to the interaction store. Clones run like and comment
    /// requests without borrowing the feed.
    pub fn interactions(&self) -> &InteractionStore {
        &self.interactions
    }

    pub fn moderation(&self) -> &ModerationService {
        &self.moderation
    }

    pub fn page_state(&self) -> PageState {
        self.feed.snapshot()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.feed.items()
    }

    pub fn active_id(&self) -> Option<&ItemId> {
        self.playback.active_id()
    }

    pub fn playback_snapshot(&self, id: &ItemId) -> PlaybackSnapshot {
        self.playback.snapshot(id)
    }

    pub fn playback_state(&self, id: &ItemId) -> PlaybackState {
        self.playback.state(id)
    }

    /// Items currently allowed to play; never more than one.
    pub fn should_play_count(&self) -> usize {
        self.playback.should_play_count()
    }

    pub fn instantiated_media(&self) -> Vec<ItemId> {
        self.playback.instantiated()
    }

    pub fn interaction_state(&self, id: &ItemId) -> Option<InteractionState> {
        self.interactions.state(id)
    }

    pub fn comments(&self, id: &ItemId) -> Option<CommentThread> {
        self.interactions.comments(id)
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Mark page 1 loading, superseding anything in flight.
    pub fn begin_first_page(&self) -> PendingPage {
        self.feed.pending(self.feed.begin_first_page(false))
    }

    pub fn begin_refresh(&self) -> PendingPage {
        self.feed.pending(self.feed.begin_first_page(true))
    }

    /// `None` while a page is loading or the feed is exhausted.
    pub fn begin_next_page(&self) -> Option<PendingPage> {
        self.feed
            .begin_next_page()
            .map(|request| self.feed.pending(request))
    }

    /// Re-issue the page that last failed, if any.
    pub fn begin_retry(&self) -> Option<PendingPage> {
        self.feed
            .begin_retry()
            .map(|request| self.feed.pending(request))
    }

    /// Bring the rest of the feed in line with a finished page fetch.
    ///
    /// A replaced collection keeps the active item if it survived and falls
    /// back to the first item otherwise. Returns the reaction fetch for an
    /// item this activated.
    pub fn apply_page(&mut self, outcome: &PageOutcome, now: Instant) -> Option<ReactionSync> {
        match outcome {
            PageOutcome::Replaced { .. } => {
                let items = self.feed.items();
                self.playback.retain(&items);
                self.interactions.retain_present(&items);
                self.cards.retain(|id, _| items.iter().any(|item| &item.id == id));

                let target = self
                    .playback
                    .active_id()
                    .filter(|id| items.iter().any(|item| &item.id == *id))
                    .cloned()
                    .or_else(|| items.first().map(|item| item.id.clone()));
                match target {
                    Some(id) => {
                        self.activate(&id, now);
                    }
                    None => self.viewability.reset(),
                }
            }
            PageOutcome::Appended { .. } => {
                if self.playback.active_id().is_none()
                    && let Some(first) = self.feed.item_at(0)
                {
                    self.activate(&first.id, now);
                }
            }
            PageOutcome::Failed(err) => self.notices.push(Notice::page_retry(err)),
            PageOutcome::Stale | PageOutcome::Skipped => {}
        }
        self.reaction_sync.take()
    }

    pub async fn load_first_page(&mut self, now: Instant) -> PageOutcome {
        let outcome = self.begin_first_page().run().await;
        self.settle_page(outcome, now).await
    }

    pub async fn refresh(&mut self, now: Instant) -> PageOutcome {
        let outcome = self.begin_refresh().run().await;
        self.settle_page(outcome, now).await
    }

    pub async fn load_next_page(&mut self, now: Instant) -> PageOutcome {
        let Some(pending) = self.begin_next_page() else {
            return PageOutcome::Skipped;
        };
        let outcome = pending.run().await;
        self.settle_page(outcome, now).await
    }

    pub async fn retry(&mut self, now: Instant) -> PageOutcome {
        let Some(pending) = self.begin_retry() else {
            return PageOutcome::Skipped;
        };
        let outcome = pending.run().await;
        self.settle_page(outcome, now).await
    }

    async fn settle_page(&mut self, outcome: PageOutcome, now: Instant) -> PageOutcome {
        if let Some(sync) = self.apply_page(&outcome, now) {
            run_reaction_sync(sync).await;
        }
        outcome
    }

    /// Apply a viewability batch from the list.
    pub fn on_viewable_items_changed(&mut self, tokens: &[ViewableToken], now: Instant) -> ViewabilityOutcome {
        let activated = match self.viewability.on_viewable_items_changed(tokens) {
            Some(id) if self.activate(&id, now) => Some(id),
            _ => None,
        };
        ViewabilityOutcome {
            activated,
            near_end: self.near_end(),
            reaction_sync: self.reaction_sync.take(),
        }
    }

    /// Reaction fetch queued by the last activation that nobody collected.
    pub fn take_reaction_sync(&mut self) -> Option<ReactionSync> {
        self.reaction_sync.take()
    }

    fn near_end(&self) -> bool {
        let state = self.feed.snapshot();
        if !state.has_more {
            return false;
        }
        let Some(index) = self.playback.active_id().and_then(|id| state.index_of(id)) else {
            return false;
        };
        state.len() - 1 - index <= self.config.load_more_threshold
    }

    fn activate(&mut self, id: &ItemId, now: Instant) -> bool {
        let items = self.feed.items();
        let Some(index) = items.iter().position(|item| &item.id == id) else {
            return false;
        };

        if let Some(previous) = self.playback.active_id().cloned()
            && &previous != id
            && let Some(card) = self.cards.get_mut(&previous)
        {
            card.on_hidden();
        }

        let changed = self.playback.activate(&items, id, now);
        self.viewability.sync(self.playback.active_id().cloned());

        let item = &items[index];
        self.interactions.ensure(item);
        self.interactions
            .retain_near(&items, index, self.config.interaction_retain_distance);
        self.card_mut(item);
        if changed {
            self.reaction_sync = self.interactions.reaction_sync(id);
        }
        changed
    }

    fn card_mut(&mut self, item: &FeedItem) -> &mut Card {
        let config = &self.config;
        self.cards.entry(item.id.clone()).or_insert_with(|| {
            Card::new(
                item.clone(),
                config.double_tap_window,
                config.heart_burst,
                config.stall_window,
            )
        })
    }

    /// Apply every queued media status event. Returns how many were applied.
    pub fn pump_media_events(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.media_events.try_recv() {
            if self.playback.handle_event(event, now) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next media event and apply it; `None` once every sender
    /// is gone.
    pub async fn next_media_event(&mut self) -> Option<bool> {
        let event = self.media_events.recv().await?;
        Some(self.playback.handle_event(event, Instant::now()))
    }

    /// Route a tap on `id`'s card and carry out what it asks for. A like is
    /// applied optimistically and handed back unsent.
    pub fn tap(&mut self, id: &ItemId, now: Instant) -> FeedResult<TapOutcome> {
        let item = self
            .feed
            .item(id)
            .ok_or_else(|| FeedError::Validation(format!("{id} is not in the feed")))?;
        let is_liked = self
            .interactions
            .state(id)
            .is_some_and(|state| state.is_liked);
        let commands = self.card_mut(&item).on_tap(now, is_liked);

        let mut like = None;
        for command in &commands {
            match command {
                CardCommand::TogglePlayback => {
                    self.playback.toggle(id, now);
                }
                CardCommand::Like => {
                    like = self.start_like(id)?;
                }
            }
        }
        Ok(TapOutcome { commands, like })
    }

    /// Fire expired single taps. Returns what was carried out, per item.
    pub fn tick(&mut self, now: Instant) -> Vec<(ItemId, CardCommand)> {
        let mut fired = Vec::new();
        for (id, card) in self.cards.iter_mut() {
            for command in card.tick(now) {
                fired.push((id.clone(), command));
            }
        }
        for (id, command) in &fired {
            if *command == CardCommand::TogglePlayback {
                self.playback.toggle(id, now);
            }
        }
        fired
    }

    /// Earliest instant at which [`tick`](Self::tick) has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.cards.values().filter_map(Card::next_deadline).min()
    }

    /// Apply the optimistic toggle; `Ok(None)` while a reaction is pending.
    pub fn start_like(&self, id: &ItemId) -> FeedResult<Option<PendingLike>> {
        let item = self
            .feed
            .item(id)
            .ok_or_else(|| FeedError::Validation(format!("{id} is not in the feed")))?;
        self.interactions.ensure(&item);
        self.interactions.start_like(id)
    }

    pub async fn like(&self, id: &ItemId) -> FeedResult<LikeOutcome> {
        match self.start_like(id)? {
            Some(pending) => Ok(pending.settle().await),
            None => Ok(LikeOutcome::Pending),
        }
    }

    /// Reaction fetch for `id` if it has not been seeded yet.
    pub fn reaction_sync(&self, id: &ItemId) -> Option<ReactionSync> {
        self.interactions.reaction_sync(id)
    }

    pub async fn load_reaction_state(&self, id: &ItemId) -> FeedResult<Option<bool>> {
        if let Some(item) = self.feed.item(id) {
            self.interactions.ensure(&item);
        }
        self.interactions.load_reaction_state(id).await
    }

    /// User-triggered reload from the error or stall overlay.
    pub fn reload(&mut self, id: &ItemId, now: Instant) -> bool {
        let items = self.feed.items();
        self.playback.reload(&items, id, now)
    }

    pub fn seek(&mut self, id: &ItemId, position: Duration) -> FeedResult<()> {
        self.playback.seek(id, position)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.playback.set_muted(muted);
    }

    pub fn card_view(&self, id: &ItemId, now: Instant) -> Option<CardView> {
        let snapshot = self.playback.snapshot(id);
        let interaction = self.interactions.state(id);
        match self.cards.get(id) {
            Some(card) => Some(card.view(now, &snapshot, interaction.as_ref())),
            None => {
                let item = self.feed.item(id)?;
                let card = Card::new(
                    item,
                    self.config.double_tap_window,
                    self.config.heart_burst,
                    self.config.stall_window,
                );
                Some(card.view(now, &snapshot, interaction.as_ref()))
            }
        }
    }

    /// App backgrounded.
    pub fn suspend(&mut self) {
        self.playback.suspend();
    }

    /// App foregrounded; a user-paused item stays paused.
    pub fn resume(&mut self, now: Instant) {
        self.playback.resume_foreground(now);
    }

    /// Teardown: cancel requests and release every media resource.
    pub fn shutdown(&mut self) {
        self.feed.cancel_in_flight();
        self.playback.release_all();
        self.interactions.clear();
        self.cards.clear();
        self.viewability.reset();
        tracing::info!("shorts feed shut down");
    }

    /// Drop `creator_id`'s items and their media. If the active item was
    /// theirs, the item that slid into its place becomes active. Returns the
    /// removed ids.
    pub fn hide_creator(&mut self, creator_id: &CreatorId, now: Instant) -> Vec<ItemId> {
        let active_index = self
            .playback
            .active_id()
            .and_then(|id| self.feed.index_of(id));
        let removed = self.feed.remove_creator(creator_id);
        for id in &removed {
            self.playback.release(id);
            self.interactions.evict(id);
            self.cards.remove(id);
        }

        if self.playback.active_id().is_none()
            && let Some(index) = active_index
        {
            let len = self.feed.len();
            if len > 0
                && let Some(next) = self.feed.item_at(index.min(len - 1))
            {
                self.activate(&next.id, now);
            }
        }
        if self.playback.active_id().is_none() {
            self.viewability.reset();
        }
        removed
    }

    /// Block `creator_id` server-side, then hide their items.
    pub async fn block_creator(
        &mut self,
        creator_id: &CreatorId,
        reason: &str,
        now: Instant,
    ) -> FeedResult<Vec<ItemId>> {
        let moderation = self.moderation.clone();
        moderation.block_creator(creator_id, reason).await?;
        let removed = self.hide_creator(creator_id, now);
        if let Some(sync) = self.reaction_sync.take() {
            run_reaction_sync(sync).await;
        }
        Ok(removed)
    }

    pub async fn report(&self, target: &ReportTarget, reason: ReportReason, free_text: &str) -> FeedResult<()> {
        self.moderation.report(target, reason, free_text).await
    }

    pub async fn load_comments(&self, id: &ItemId, page: u32) -> FeedResult<CommentOutcome> {
        if let Some(item) = self.feed.item(id) {
            self.interactions.ensure(&item);
        }
        self.interactions.load_comments(id, page).await
    }

    pub async fn load_more_comments(&self, id: &ItemId) -> FeedResult<CommentOutcome> {
        self.interactions.load_more_comments(id).await
    }

    pub async fn post_comment(&self, id: &ItemId, text: &str) -> FeedResult<Comment> {
        self.interactions.post_comment(id, text).await
    }

    pub async fn toggle_comment_like(&self, id: &ItemId, comment_id: &CommentId) -> FeedResult<CommentOutcome> {
        self.interactions.toggle_comment_like(id, comment_id).await
    }
}

/// Failures are already on the notice board.
async fn run_reaction_sync(sync: ReactionSync) {
    let item_id = sync.item_id().clone();
    if let Err(err) = sync.run().await {
        tracing::debug!(item_id = %item_id, error = %err, "reaction state not seeded");
    }
}
