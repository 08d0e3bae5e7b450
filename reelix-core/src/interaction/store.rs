use std::{num::NonZeroUsize, sync::Arc};

use lru::LruCache;
use parking_lot::Mutex;
use reelix_contracts::client::InteractionClient;
use reelix_model::{
    AuthToken, Comment, CommentId, FeedItem, ItemId, ReactionCounts, ReactionKind,
};
use tokio_util::sync::CancellationToken;

use super::{
    comments::{CommentOutcome, CommentThread, validate_comment},
    optimistic::{Settlement, Transaction},
};
use crate::{
    error::{FeedError, FeedResult},
    notices::{Notice, NoticeBoard, NoticeScope},
    session::AuthSession,
};

/// The part of a like toggle that is applied optimistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeState {
    pub like_count: u64,
    pub is_liked: bool,
}

impl LikeState {
    /// Flip `is_liked` and move the count by one in the same direction.
    pub fn toggle(&mut self) {
        self.is_liked = !self.is_liked;
        self.like_count = if self.is_liked {
            self.like_count.saturating_add(1)
        } else {
            self.like_count.saturating_sub(1)
        };
    }
}

/// Per-item like and comment-count state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub like_count: u64,
    pub is_liked: bool,
    pub is_loading_reaction: bool,
    pub comment_count: u64,
}

impl InteractionState {
    pub fn seeded(item: &FeedItem) -> Self {
        Self {
            like_count: item.like_count,
            is_liked: false,
            is_loading_reaction: false,
            comment_count: item.comment_count,
        }
    }

    pub fn like_state(&self) -> LikeState {
        LikeState {
            like_count: self.like_count,
            is_liked: self.is_liked,
        }
    }

    fn apply_like(&mut self, like: LikeState) {
        self.like_count = like.like_count;
        self.is_liked = like.is_liked;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LikeOutcome {
    Committed(InteractionState),
    RolledBack {
        state: InteractionState,
        error: FeedError,
    },
    /// A reaction for this item is already in flight.
    Pending,
    /// The entry was evicted while the request was in flight.
    Stale,
}

/// An optimistic like that has been applied and awaits the server.
///
/// Dropping an unsettled ticket restores the snapshot and clears the
/// in-flight flag.
#[derive(Debug)]
pub struct LikeTicket {
    pub item_id: ItemId,
    pub kind: ReactionKind,
    generation: u64,
    cancel: CancellationToken,
    token: AuthToken,
    txn: Transaction<LikeState>,
    guard: RollbackGuard,
}

#[derive(Debug, Clone)]
enum RollbackTarget {
    Item,
    Comment(CommentId),
}

/// Undoes an optimistic toggle whose request was abandoned mid-flight.
///
/// Must not be dropped while `inner` is locked.
struct RollbackGuard {
    inner: Arc<Mutex<Inner>>,
    item_id: ItemId,
    generation: u64,
    target: RollbackTarget,
    snapshot: LikeState,
    armed: bool,
}

impl RollbackGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl std::fmt::Debug for RollbackGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackGuard")
            .field("item_id", &self.item_id)
            .field("target", &self.target)
            .field("armed", &self.armed)
            .finish()
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock();
        let Some(entry) = inner.current(&self.item_id, self.generation) else {
            return;
        };
        match &self.target {
            RollbackTarget::Item => {
                entry.state.apply_like(self.snapshot);
                entry.state.is_loading_reaction = false;
            }
            RollbackTarget::Comment(comment_id) => {
                entry.thread.finish_like(comment_id, &self.snapshot);
            }
        }
        tracing::debug!(item_id = %self.item_id, target = ?self.target, "abandoned reaction rolled back");
    }
}

/// A like whose optimistic toggle is already visible.
///
/// [`settle`](Self::settle) owns everything it needs, so hosts can spawn it
/// and keep driving the feed. Dropping it unsettled rolls the toggle back.
#[derive(Debug)]
pub struct PendingLike {
    store: InteractionStore,
    ticket: LikeTicket,
}

impl PendingLike {
    pub fn item_id(&self) -> &ItemId {
        &self.ticket.item_id
    }

    pub fn kind(&self) -> ReactionKind {
        self.ticket.kind
    }

    pub async fn settle(self) -> LikeOutcome {
        self.store.send_like(self.ticket).await
    }
}

/// Fetches whether the signed-in user already liked an item.
#[derive(Debug)]
pub struct ReactionSync {
    store: InteractionStore,
    item_id: ItemId,
}

impl ReactionSync {
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub async fn run(self) -> FeedResult<Option<bool>> {
        self.store.load_reaction_state(&self.item_id).await
    }
}

#[derive(Debug)]
struct Entry {
    state: InteractionState,
    generation: u64,
    cancel: CancellationToken,
    thread: CommentThread,
    /// `is_liked` came from the server rather than the feed default.
    reaction_known: bool,
    /// Bumped by every committed like; an older reaction fetch is ignored.
    reaction_version: u64,
}

impl Entry {
    fn release(&self) {
        self.cancel.cancel();
    }
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<ItemId, Entry>,
    next_generation: u64,
}

impl Inner {
    fn entry(&mut self, id: &ItemId) -> FeedResult<&mut Entry> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| FeedError::Validation(format!("{id} is not tracked")))
    }

    /// Entry for `id`, but only if it is the same one a request started on.
    fn current(&mut self, id: &ItemId, generation: u64) -> Option<&mut Entry> {
        self.entries
            .get_mut(id)
            .filter(|entry| entry.generation == generation)
    }
}

/// Optimistic likes and comments for the items near the active one.
///
/// Entries live in an LRU; evicting an entry cancels its in-flight requests
/// and any late result is ignored.
#[derive(Clone)]
pub struct InteractionStore {
    client: Arc<dyn InteractionClient>,
    session: AuthSession,
    notices: NoticeBoard,
    comments_page_size: u32,
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for InteractionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("InteractionStore")
            .field("entries", &inner.entries.len())
            .field("capacity", &inner.entries.cap())
            .finish()
    }
}

impl InteractionStore {
    pub fn new(
        client: Arc<dyn InteractionClient>,
        session: AuthSession,
        notices: NoticeBoard,
        capacity: usize,
        comments_page_size: u32,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            session,
            notices,
            comments_page_size: comments_page_size.max(1),
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(capacity),
                next_generation: 0,
            })),
        }
    }

    /// Track `item`, seeding counts from the feed payload on first sight.
    pub fn ensure(&self, item: &FeedItem) -> InteractionState {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get(&item.id) {
            return entry.state.clone();
        }
        inner.next_generation += 1;
        let entry = Entry {
            state: InteractionState::seeded(item),
            generation: inner.next_generation,
            cancel: CancellationToken::new(),
            thread: CommentThread::new(),
            reaction_known: false,
            reaction_version: 0,
        };
        let state = entry.state.clone();
        if let Some((evicted_id, evicted)) = inner.entries.push(item.id.clone(), entry)
            && evicted_id != item.id
        {
            tracing::debug!(item_id = %evicted_id, "interaction entry evicted");
            evicted.release();
        }
        state
    }

    pub fn state(&self, id: &ItemId) -> Option<InteractionState> {
        self.inner.lock().entries.peek(id).map(|entry| entry.state.clone())
    }

    pub fn comments(&self, id: &ItemId) -> Option<CommentThread> {
        self.inner
            .lock()
            .entries
            .peek(id)
            .map(|entry| entry.thread.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.inner.lock().entries.contains(id)
    }

    /// Drop an entry and cancel its requests.
    pub fn evict(&self, id: &ItemId) {
        if let Some(entry) = self.inner.lock().entries.pop(id) {
            tracing::debug!(item_id = %id, "interaction entry dropped");
            entry.release();
        }
    }

    /// Keep entries within `distance` of `active_index` in `items`.
    pub fn retain_near(&self, items: &[FeedItem], active_index: usize, distance: usize) {
        let low = active_index.saturating_sub(distance);
        let high = active_index.saturating_add(distance);
        self.retain_where(|id| {
            items
                .iter()
                .position(|item| &item.id == id)
                .is_some_and(|index| (low..=high).contains(&index))
        });
    }

    /// Keep entries for items still in the feed.
    pub fn retain_present(&self, items: &[FeedItem]) {
        self.retain_where(|id| items.iter().any(|item| &item.id == id));
    }

    pub fn clear(&self) {
        self.retain_where(|_| false);
    }

    fn retain_where(&self, keep: impl Fn(&ItemId) -> bool) {
        let mut inner = self.inner.lock();
        let doomed: Vec<ItemId> = inner
            .entries
            .iter()
            .map(|(id, _)| id)
            .filter(|id| !keep(*id))
            .cloned()
            .collect();
        for id in doomed {
            if let Some(entry) = inner.entries.pop(&id) {
                entry.release();
            }
        }
    }

    fn token(&self, scope: NoticeScope) -> FeedResult<AuthToken> {
        self.session.token().inspect_err(|err| {
            self.notices.push(Notice::interaction(scope, err));
        })
    }

    fn report_failure(&self, scope: NoticeScope, err: &FeedError) {
        tracing::warn!(scope = ?scope, error = %err, "interaction failed");
        if err.requires_sign_in() {
            self.session.sign_out();
        }
        self.notices.push(Notice::interaction(scope, err));
    }

    /// Apply the optimistic toggle. `Ok(None)` while a reaction is pending.
    pub fn begin_like(&self, item_id: &ItemId) -> FeedResult<Option<LikeTicket>> {
        let token = self.token(NoticeScope::Item(item_id.clone()))?;
        let mut inner = self.inner.lock();
        let entry = inner.entry(item_id)?;
        if entry.state.is_loading_reaction {
            return Ok(None);
        }

        let prior = entry.state.like_state();
        let kind = ReactionKind::toggle_from(prior.is_liked);
        let txn = Transaction::begin(&prior, LikeState::toggle);
        entry.state.apply_like(*txn.optimistic());
        entry.state.is_loading_reaction = true;

        tracing::debug!(item_id = %item_id, kind = kind.as_str(), "optimistic reaction applied");

        let guard = RollbackGuard {
            inner: Arc::clone(&self.inner),
            item_id: item_id.clone(),
            generation: entry.generation,
            target: RollbackTarget::Item,
            snapshot: *txn.snapshot(),
            armed: true,
        };
        Ok(Some(LikeTicket {
            item_id: item_id.clone(),
            kind,
            generation: entry.generation,
            cancel: entry.cancel.child_token(),
            token,
            txn,
            guard,
        }))
    }

    /// Reconcile with the server's counts, or roll back on failure.
    pub fn finish_like(
        &self,
        ticket: LikeTicket,
        result: FeedResult<ReactionCounts>,
    ) -> LikeOutcome {
        let LikeTicket {
            item_id,
            generation,
            txn,
            guard,
            ..
        } = ticket;
        guard.disarm();

        let settlement = txn.settle(result, |like, counts| like.like_count = counts.likes);

        let outcome = {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.current(&item_id, generation) else {
                return LikeOutcome::Stale;
            };
            entry.state.is_loading_reaction = false;
            entry.state.apply_like(*settlement.state());
            match settlement {
                Settlement::Committed(_) => {
                    entry.reaction_known = true;
                    entry.reaction_version += 1;
                    LikeOutcome::Committed(entry.state.clone())
                }
                Settlement::RolledBack { error, .. } => LikeOutcome::RolledBack {
                    state: entry.state.clone(),
                    error,
                },
            }
        };

        if let LikeOutcome::RolledBack { error, .. } = &outcome {
            self.report_failure(NoticeScope::Item(item_id), error);
        }
        outcome
    }

    /// Apply the optimistic toggle and hand back the request as an owned
    /// future. `Ok(None)` while a reaction is pending.
    pub fn start_like(&self, item_id: &ItemId) -> FeedResult<Option<PendingLike>> {
        Ok(self.begin_like(item_id)?.map(|ticket| PendingLike {
            store: self.clone(),
            ticket,
        }))
    }

    /// Send `ticket` and settle it. Eviction while in flight yields `Stale`.
    pub async fn send_like(&self, ticket: LikeTicket) -> LikeOutcome {
        let result = tokio::select! {
            _ = ticket.cancel.cancelled() => return LikeOutcome::Stale,
            result = self.client.post_reaction(&ticket.item_id, ticket.kind, &ticket.token) => {
                result.map_err(FeedError::from)
            }
        };
        self.finish_like(ticket, result)
    }

    /// Toggle the like on `item_id`.
    pub async fn like(&self, item_id: &ItemId) -> FeedResult<LikeOutcome> {
        match self.begin_like(item_id)? {
            Some(ticket) => Ok(self.send_like(ticket).await),
            None => Ok(LikeOutcome::Pending),
        }
    }

    /// A reaction-state fetch for `item_id`, if signed in and its `is_liked`
    /// has not been seeded from the server yet.
    pub fn reaction_sync(&self, item_id: &ItemId) -> Option<ReactionSync> {
        if !self.session.is_signed_in() {
            return None;
        }
        let needed = self
            .inner
            .lock()
            .entries
            .peek(item_id)
            .is_some_and(|entry| !entry.reaction_known && !entry.state.is_loading_reaction);
        needed.then(|| ReactionSync {
            store: self.clone(),
            item_id: item_id.clone(),
        })
    }

    /// Seed `is_liked` from the server. Does nothing when signed out.
    pub async fn load_reaction_state(&self, item_id: &ItemId) -> FeedResult<Option<bool>> {
        let Ok(token) = self.session.token() else {
            return Ok(None);
        };
        let (generation, version, cancel) = {
            let mut inner = self.inner.lock();
            let entry = inner.entry(item_id)?;
            (entry.generation, entry.reaction_version, entry.cancel.child_token())
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            result = self.client.fetch_reaction_state(item_id, &token) => {
                result.map_err(FeedError::from)
            }
        };

        match result {
            Ok(reaction) => {
                let mut inner = self.inner.lock();
                let Some(entry) = inner.current(item_id, generation) else {
                    return Ok(None);
                };
                // A toggle in flight or committed since the fetch started wins.
                if !entry.state.is_loading_reaction && entry.reaction_version == version {
                    entry.state.is_liked = reaction.liked;
                    entry.reaction_known = true;
                }
                Ok(Some(entry.state.is_liked))
            }
            Err(err) => {
                self.report_failure(NoticeScope::Item(item_id.clone()), &err);
                Err(err)
            }
        }
    }

    /// Load page `page` of the comments (1 replaces, later pages append).
    pub async fn load_comments(&self, item_id: &ItemId, page: u32) -> FeedResult<CommentOutcome> {
        let (generation, thread_generation, cancel) = {
            let mut inner = self.inner.lock();
            let entry = inner.entry(item_id)?;
            let Some(thread_generation) = entry.thread.begin_load(page) else {
                return Ok(CommentOutcome::Skipped);
            };
            (entry.generation, thread_generation, entry.cancel.child_token())
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => return Ok(CommentOutcome::Stale),
            result = self.client.fetch_comments(item_id, page, self.comments_page_size) => {
                result.map_err(FeedError::from)
            }
        };

        let outcome = {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.current(item_id, generation) else {
                return Ok(CommentOutcome::Stale);
            };
            entry.thread.finish_load(thread_generation, page, result)
        };

        if let CommentOutcome::Failed(err) = &outcome {
            self.report_failure(NoticeScope::Item(item_id.clone()), err);
        }
        Ok(outcome)
    }

    /// Load the page after the last one, unless past `total_pages`.
    pub async fn load_more_comments(&self, item_id: &ItemId) -> FeedResult<CommentOutcome> {
        let next = {
            let mut inner = self.inner.lock();
            inner.entry(item_id)?.thread.next_page()
        };
        match next {
            Some(page) => self.load_comments(item_id, page).await,
            None => Ok(CommentOutcome::Skipped),
        }
    }

    /// Post a comment; on success it is prepended and the count bumped.
    pub async fn post_comment(&self, item_id: &ItemId, text: &str) -> FeedResult<Comment> {
        let text = validate_comment(text)?;
        let token = self.token(NoticeScope::Item(item_id.clone()))?;
        let generation = self.inner.lock().entry(item_id)?.generation;

        match self
            .client
            .post_comment(item_id, text, &token)
            .await
            .map_err(FeedError::from)
        {
            Ok(comment) => {
                let mut inner = self.inner.lock();
                if let Some(entry) = inner.current(item_id, generation) {
                    entry.thread.prepend(comment.clone());
                    entry.state.comment_count = entry.state.comment_count.saturating_add(1);
                }
                tracing::debug!(item_id = %item_id, comment_id = %comment.id, "comment posted");
                Ok(comment)
            }
            Err(err) => {
                self.report_failure(NoticeScope::Item(item_id.clone()), &err);
                Err(err)
            }
        }
    }

    /// Optimistically toggle the like on one comment row.
    pub async fn toggle_comment_like(
        &self,
        item_id: &ItemId,
        comment_id: &CommentId,
    ) -> FeedResult<CommentOutcome> {
        let token = self.token(NoticeScope::Comment(comment_id.clone()))?;
        let (generation, cancel, txn, kind) = {
            let mut inner = self.inner.lock();
            let entry = inner.entry(item_id)?;
            let Some((txn, kind)) = entry.thread.begin_like(comment_id)? else {
                return Ok(CommentOutcome::Skipped);
            };
            (entry.generation, entry.cancel.child_token(), txn, kind)
        };
        let guard = RollbackGuard {
            inner: Arc::clone(&self.inner),
            item_id: item_id.clone(),
            generation,
            target: RollbackTarget::Comment(comment_id.clone()),
            snapshot: *txn.snapshot(),
            armed: true,
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => return Ok(CommentOutcome::Stale),
            result = self.client.post_comment_reaction(comment_id, kind, &token) => {
                result.map_err(FeedError::from)
            }
        };
        guard.disarm();

        let settlement = txn.settle(result, |like, counts| like.like_count = counts.likes);
        {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.current(item_id, generation) else {
                return Ok(CommentOutcome::Stale);
            };
            entry.thread.finish_like(comment_id, settlement.state());
        }

        Ok(match settlement {
            Settlement::Committed(state) => CommentOutcome::Liked(state),
            Settlement::RolledBack { state, error } => {
                self.report_failure(NoticeScope::Comment(comment_id.clone()), &error);
                CommentOutcome::RolledBack { state, error }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::{InteractionCall, StubInteractionClient, fixtures};
    use crate::notices::NoticeKind;
    use reelix_contracts::client::ClientError;
    use std::time::Duration;

    struct Harness {
        client: StubInteractionClient,
        session: AuthSession,
        notices: NoticeBoard,
        store: InteractionStore,
    }

    fn harness(capacity: usize) -> Harness {
        let client = StubInteractionClient::new();
        let session = AuthSession::signed_in(AuthToken::new("token"));
        let notices = NoticeBoard::new();
        let store = InteractionStore::new(
            Arc::new(client.clone()),
            session.clone(),
            notices.clone(),
            capacity,
            2,
        );
        Harness {
            client,
            session,
            notices,
            store,
        }
    }

    #[tokio::test]
    async fn like_commits_server_count() {
        let h = harness(4);
        let item = fixtures::feed_item(1);
        h.client.seed_likes(&item.id, 12, false);
        h.store.ensure(&item);

        let outcome = h.store.like(&item.id).await.unwrap();
        let LikeOutcome::Committed(state) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert!(state.is_liked);
        assert_eq!(state.like_count, 13);
        assert!(!state.is_loading_reaction);
        assert_eq!(
            h.client.calls(),
            vec![InteractionCall::PostReaction(item.id.clone(), ReactionKind::Like)]
        );
    }

    #[tokio::test]
    async fn network_failure_restores_prior_values_exactly() {
        let h = harness(4);
        let item = fixtures::feed_item(2);
        let before = h.store.ensure(&item);

        h.client.fail_next(ClientError::Network("offline".into()));
        let outcome = h.store.like(&item.id).await.unwrap();

        let LikeOutcome::RolledBack { state, error } = outcome else {
            panic!("expected rollback");
        };
        assert_eq!(error, FeedError::Network("offline".into()));
        assert_eq!(state.is_liked, before.is_liked);
        assert_eq!(state.like_count, before.like_count);
        assert!(!state.is_loading_reaction);
        assert_eq!(h.notices.drain()[0].kind, NoticeKind::Transient);
        assert!(h.session.is_signed_in());
    }

    #[tokio::test]
    async fn unauthorized_clears_session_and_asks_for_sign_in() {
        let h = harness(4);
        let item = fixtures::feed_item(3);
        h.store.ensure(&item);

        h.client.fail_next(ClientError::Unauthorized);
        let outcome = h.store.like(&item.id).await.unwrap();
        assert!(matches!(
            outcome,
            LikeOutcome::RolledBack {
                error: FeedError::AuthRequired,
                ..
            }
        ));
        assert!(!h.session.is_signed_in());
        assert_eq!(h.notices.drain()[0].kind, NoticeKind::SignIn);

        assert_eq!(h.store.like(&item.id).await, Err(FeedError::AuthRequired));
        assert_eq!(h.client.call_count(), 1);
    }

    #[test]
    fn second_like_while_pending_is_refused() {
        let h = harness(4);
        let item = fixtures::feed_item(4);
        h.store.ensure(&item);

        let ticket = h.store.begin_like(&item.id).unwrap().unwrap();
        assert!(h.store.state(&item.id).unwrap().is_loading_reaction);
        assert!(h.store.begin_like(&item.id).unwrap().is_none());

        h.store.finish_like(ticket, Ok(ReactionCounts { likes: 41, dislikes: 0 }));
        let state = h.store.state(&item.id).unwrap();
        assert_eq!(state.like_count, 41);
        assert!(!state.is_loading_reaction);
    }

    #[tokio::test]
    async fn like_twice_returns_to_original() {
        let h = harness(4);
        let item = fixtures::feed_item(5);
        h.client.seed_likes(&item.id, item.like_count, false);
        let before = h.store.ensure(&item);

        h.store.like(&item.id).await.unwrap();
        let LikeOutcome::Committed(after) = h.store.like(&item.id).await.unwrap() else {
            panic!("expected commit");
        };
        assert_eq!(after.is_liked, before.is_liked);
        assert_eq!(after.like_count, before.like_count);
    }

    #[tokio::test]
    async fn eviction_cancels_in_flight_like() {
        let h = harness(1);
        let first = fixtures::feed_item(6);
        let second = fixtures::feed_item(7);
        h.client.set_delay(Duration::from_millis(50));
        h.store.ensure(&first);

        let store = h.store.clone();
        let id = first.id.clone();
        let pending = tokio::spawn(async move { store.like(&id).await });
        while h.client.call_count() == 0 {
            tokio::task::yield_now().await;
        }

        h.store.ensure(&second);
        assert!(!h.store.contains(&first.id));
        assert_eq!(pending.await.unwrap(), Ok(LikeOutcome::Stale));
        assert!(h.notices.is_empty());
    }

    #[tokio::test]
    async fn stale_result_after_re_ensure_is_ignored() {
        let h = harness(4);
        let item = fixtures::feed_item(8);
        h.store.ensure(&item);
        let ticket = h.store.begin_like(&item.id).unwrap().unwrap();

        h.store.evict(&item.id);
        let fresh = h.store.ensure(&item);

        let outcome = h.store.finish_like(ticket, Ok(ReactionCounts { likes: 999, dislikes: 0 }));
        assert_eq!(outcome, LikeOutcome::Stale);
        assert_eq!(h.store.state(&item.id).unwrap(), fresh);
    }

    #[tokio::test]
    async fn comments_paginate_and_posting_bumps_count() {
        let h = harness(4);
        let item = fixtures::feed_item(9);
        h.client.seed_comments(
            &item.id,
            (0..3).map(|n| fixtures::comment(&item.id, n)).collect(),
        );
        let before = h.store.ensure(&item);

        assert_eq!(
            h.store.load_comments(&item.id, 1).await.unwrap(),
            CommentOutcome::Loaded { page: 1, count: 2 }
        );
        assert_eq!(
            h.store.load_more_comments(&item.id).await.unwrap(),
            CommentOutcome::Loaded { page: 2, count: 1 }
        );
        assert_eq!(
            h.store.load_more_comments(&item.id).await.unwrap(),
            CommentOutcome::Skipped
        );

        let posted = h.store.post_comment(&item.id, "  great  ").await.unwrap();
        assert_eq!(posted.text, "great");
        let thread = h.store.comments(&item.id).unwrap();
        assert_eq!(thread.items.len(), 4);
        assert_eq!(thread.items[0].id, posted.id);
        assert_eq!(
            h.store.state(&item.id).unwrap().comment_count,
            before.comment_count + 1
        );
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_without_a_request() {
        let h = harness(4);
        let item = fixtures::feed_item(10);
        h.store.ensure(&item);

        let err = h.store.post_comment(&item.id, " \n ").await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert_eq!(h.client.call_count(), 0);
    }

    #[tokio::test]
    async fn comment_like_rolls_back_on_failure() {
        let h = harness(4);
        let item = fixtures::feed_item(11);
        h.client.seed_comments(&item.id, vec![fixtures::comment(&item.id, 5)]);
        h.store.ensure(&item);
        h.store.load_comments(&item.id, 1).await.unwrap();
        let comment_id = h.store.comments(&item.id).unwrap().items[0].id.clone();

        h.client.fail_next(ClientError::Server {
            status: Some(503),
            message: "busy".into(),
        });
        let outcome = h.store.toggle_comment_like(&item.id, &comment_id).await.unwrap();
        assert!(matches!(outcome, CommentOutcome::RolledBack { .. }));

        let thread = h.store.comments(&item.id).unwrap();
        let row = thread.comment(&comment_id).unwrap();
        assert!(!row.is_liked);
        assert_eq!(row.like_count, 5);
        assert!(thread.pending_likes.is_empty());
    }

    #[test]
    fn lru_capacity_bounds_entries() {
        let h = harness(2);
        for n in 1..=3 {
            h.store.ensure(&fixtures::feed_item(n));
        }
        assert_eq!(h.store.len(), 2);
        assert!(!h.store.contains(&fixtures::feed_item(1).id));
    }

    #[test]
    fn retain_near_drops_far_entries() {
        let h = harness(8);
        let items = fixtures::feed_items(1, 6);
        for item in &items {
            h.store.ensure(item);
        }
        h.store.retain_near(&items, 4, 1);
        let kept: Vec<_> = items
            .iter()
            .filter(|item| h.store.contains(&item.id))
            .map(|item| item.id.clone())
            .collect();
        assert_eq!(kept, vec![items[3].id.clone(), items[4].id.clone(), items[5].id.clone()]);
    }

    #[tokio::test]
    async fn abandoned_like_rolls_back_and_frees_the_item() {
        let h = harness(4);
        let item = fixtures::feed_item(12);
        h.client.seed_likes(&item.id, item.like_count, false);
        let before = h.store.ensure(&item);
        h.client.set_delay(Duration::from_millis(200));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), h.store.like(&item.id)).await;
        assert!(timed_out.is_err());

        let state = h.store.state(&item.id).unwrap();
        assert_eq!(state, before);
        assert!(!state.is_loading_reaction);

        let outcome = h.store.like(&item.id).await.unwrap();
        assert!(matches!(outcome, LikeOutcome::Committed(_)), "got {outcome:?}");
    }

    #[test]
    fn dropping_a_pending_like_restores_the_snapshot() {
        let h = harness(4);
        let item = fixtures::feed_item(13);
        let before = h.store.ensure(&item);

        let pending = h.store.start_like(&item.id).unwrap().unwrap();
        assert_eq!(pending.kind(), ReactionKind::Like);
        assert!(h.store.state(&item.id).unwrap().is_liked);

        drop(pending);
        assert_eq!(h.store.state(&item.id).unwrap(), before);
        assert!(h.store.begin_like(&item.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn pending_like_settles_on_another_task() {
        let h = harness(4);
        let item = fixtures::feed_item(14);
        h.client.seed_likes(&item.id, 3, false);
        h.store.ensure(&item);

        let pending = h.store.start_like(&item.id).unwrap().unwrap();
        assert_eq!(pending.item_id(), &item.id);
        let outcome = tokio::spawn(pending.settle()).await.unwrap();
        let LikeOutcome::Committed(state) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!(state.like_count, 4);
        assert!(state.is_liked);
    }

    #[tokio::test]
    async fn abandoned_comment_like_rolls_back_the_row() {
        let h = harness(4);
        let item = fixtures::feed_item(15);
        h.client.seed_comments(&item.id, vec![fixtures::comment(&item.id, 5)]);
        h.store.ensure(&item);
        h.store.load_comments(&item.id, 1).await.unwrap();
        let comment_id = h.store.comments(&item.id).unwrap().items[0].id.clone();
        let before = h.store.comments(&item.id).unwrap().comment(&comment_id).cloned().unwrap();

        h.client.set_delay(Duration::from_millis(200));
        let timed_out = tokio::time::timeout(
            Duration::from_millis(10),
            h.store.toggle_comment_like(&item.id, &comment_id),
        )
        .await;
        assert!(timed_out.is_err());

        let thread = h.store.comments(&item.id).unwrap();
        let row = thread.comment(&comment_id).unwrap();
        assert_eq!(row.is_liked, before.is_liked);
        assert_eq!(row.like_count, before.like_count);
        assert!(thread.pending_likes.is_empty());

        let outcome = h.store.toggle_comment_like(&item.id, &comment_id).await.unwrap();
        assert!(matches!(outcome, CommentOutcome::Liked(_)), "got {outcome:?}");
    }

    #[tokio::test]
    async fn reaction_state_seeds_is_liked_once() {
        let h = harness(4);
        let item = fixtures::feed_item(16);
        h.client.seed_likes(&item.id, 9, true);
        h.store.ensure(&item);

        let sync = h.store.reaction_sync(&item.id).unwrap();
        assert_eq!(sync.item_id(), &item.id);
        assert_eq!(sync.run().await, Ok(Some(true)));
        assert!(h.store.state(&item.id).unwrap().is_liked);
        assert!(h.store.reaction_sync(&item.id).is_none());
        assert_eq!(
            h.client.calls(),
            vec![InteractionCall::FetchReactionState(item.id.clone())]
        );
    }

    #[tokio::test]
    async fn reaction_state_is_skipped_when_signed_out() {
        let h = harness(4);
        let item = fixtures::feed_item(17);
        h.store.ensure(&item);
        h.session.sign_out();

        assert!(h.store.reaction_sync(&item.id).is_none());
        assert_eq!(h.store.load_reaction_state(&item.id).await, Ok(None));
        assert_eq!(h.client.call_count(), 0);
        assert!(h.notices.is_empty());
    }

    #[tokio::test]
    async fn reaction_state_does_not_override_a_like_in_flight() {
        let h = harness(4);
        let item = fixtures::feed_item(18);
        h.client.seed_likes(&item.id, 2, false);
        h.store.ensure(&item);

        let ticket = h.store.begin_like(&item.id).unwrap().unwrap();
        assert!(h.store.reaction_sync(&item.id).is_none());
        assert_eq!(h.store.load_reaction_state(&item.id).await, Ok(Some(true)));
        assert!(h.store.state(&item.id).unwrap().is_liked);

        h.store.finish_like(ticket, Ok(ReactionCounts { likes: 3, dislikes: 0 }));
        let state = h.store.state(&item.id).unwrap();
        assert!(state.is_liked);
        assert_eq!(state.like_count, 3);
    }

    #[tokio::test]
    async fn reaction_state_failure_is_reported() {
        let h = harness(4);
        let item = fixtures::feed_item(19);
        h.store.ensure(&item);

        h.client.fail_next(ClientError::Network("offline".into()));
        assert_eq!(
            h.store.load_reaction_state(&item.id).await,
            Err(FeedError::Network("offline".into()))
        );
        assert_eq!(h.notices.drain()[0].kind, NoticeKind::Transient);
        assert!(h.store.reaction_sync(&item.id).is_some());
    }
}
