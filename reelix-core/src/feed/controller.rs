use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;
use reelix_contracts::client::FeedClient;
use reelix_model::{CreatorId, FeedItem, FeedSort, ItemId};
use tokio_util::sync::CancellationToken;

use super::state::PageState;
use crate::error::{FeedError, FeedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequestKind {
    /// Page 1, replacing the collection.
    First,
    /// The page after the last loaded one, appended.
    Next,
}

/// An issued page fetch. Results are only applied while `generation` is
/// still current.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub kind: PageRequestKind,
    pub page: u32,
    pub page_size: u32,
    pub sort: FeedSort,
    pub generation: u64,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The collection was replaced by page 1.
    Replaced { count: usize },
    /// Items were appended; `added` excludes duplicates and blocked creators.
    Appended { added: usize },
    Failed(FeedError),
    /// A newer request superseded this one; nothing changed.
    Stale,
    /// Nothing to do: already loading or the feed is exhausted.
    Skipped,
}

impl PageOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PageOutcome::Replaced { .. } | PageOutcome::Appended { .. })
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: PageState,
    generation: u64,
    in_flight: Option<CancellationToken>,
    last_failed: Option<PageRequestKind>,
    blocked: HashSet<CreatorId>,
}

/// A page fetch that has been marked in flight. [`run`](Self::run) owns
/// everything it needs, so it can be spawned while the feed keeps scrolling.
#[derive(Debug)]
pub struct PendingPage {
    controller: FeedController,
    request: PageRequest,
}

impl PendingPage {
    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    pub async fn run(self) -> PageOutcome {
        self.controller.execute(self.request).await
    }
}

/// Owns the ordered feed collection, load-more and refresh.
#[derive(Clone)]
pub struct FeedController {
    client: Arc<dyn FeedClient>,
    page_size: u32,
    sort: FeedSort,
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for FeedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FeedController")
            .field("page_size", &self.page_size)
            .field("sort", &self.sort)
            .field("items", &inner.state.items.len())
            .field("page", &inner.state.page)
            .field("generation", &inner.generation)
            .finish()
    }
}

impl FeedController {
    pub fn new(client: Arc<dyn FeedClient>, page_size: u32, sort: FeedSort) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
            sort,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn snapshot(&self) -> PageState {
        self.inner.lock().state.clone()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.inner.lock().state.items.clone()
    }

    pub fn item(&self, id: &ItemId) -> Option<FeedItem> {
        self.inner
            .lock()
            .state
            .items
            .iter()
            .find(|item| &item.id == id)
            .cloned()
    }

    pub fn item_at(&self, index: usize) -> Option<FeedItem> {
        self.inner.lock().state.items.get(index).cloned()
    }

    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.inner.lock().state.index_of(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().state.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().state.items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.inner.lock().state.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().state.is_loading
    }

    /// Start a page-1 load, superseding anything in flight.
    pub fn begin_first_page(&self, refreshing: bool) -> PageRequest {
        let mut inner = self.inner.lock();
        if let Some(previous) = inner.in_flight.take() {
            previous.cancel();
        }
        inner.generation += 1;
        let cancel = CancellationToken::new();
        inner.in_flight = Some(cancel.clone());
        inner.state.is_loading = true;
        inner.state.is_refreshing = refreshing;
        inner.state.error = None;

        tracing::debug!(generation = inner.generation, refreshing, "first page requested");

        PageRequest {
            kind: PageRequestKind::First,
            page: 1,
            page_size: self.page_size,
            sort: self.sort,
            generation: inner.generation,
            cancel,
        }
    }

    /// Start loading the next page, or `None` when loading or exhausted.
    pub fn begin_next_page(&self) -> Option<PageRequest> {
        let mut inner = self.inner.lock();
        if inner.state.is_loading || !inner.state.has_more {
            return None;
        }
        inner.generation += 1;
        let cancel = CancellationToken::new();
        inner.in_flight = Some(cancel.clone());
        inner.state.is_loading = true;
        inner.state.error = None;
        let page = inner.state.page + 1;

        tracing::debug!(generation = inner.generation, page, "next page requested");

        Some(PageRequest {
            kind: PageRequestKind::Next,
            page,
            page_size: self.page_size,
            sort: self.sort,
            generation: inner.generation,
            cancel,
        })
    }

    /// Apply the result of `request`. Stale results leave state untouched.
    pub fn finish(
        &self,
        request: &PageRequest,
        result: FeedResult<Vec<FeedItem>>,
    ) -> PageOutcome {
        let mut inner = self.inner.lock();
        if request.generation != inner.generation || request.cancel.is_cancelled() {
            tracing::debug!(
                generation = request.generation,
                current = inner.generation,
                page = request.page,
                "discarding stale page result"
            );
            return PageOutcome::Stale;
        }

        inner.in_flight = None;
        inner.state.is_loading = false;
        inner.state.is_refreshing = false;

        let items = match result {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(page = request.page, error = %err, "page fetch failed");
                inner.state.error = Some(err.clone());
                inner.last_failed = Some(request.kind);
                return PageOutcome::Failed(err);
            }
        };

        let returned = items.len();
        inner.last_failed = None;
        inner.state.error = None;
        inner.state.page = request.page;
        inner.state.has_more = returned == request.page_size as usize;

        match request.kind {
            PageRequestKind::First => {
                let mut seen = HashSet::new();
                let items: Vec<FeedItem> = items
                    .into_iter()
                    .filter(|item| !inner.blocked.contains(item.creator_id()))
                    .filter(|item| seen.insert(item.id.clone()))
                    .collect();
                let count = items.len();
                inner.state.items = items;
                tracing::info!(count, has_more = inner.state.has_more, "feed replaced");
                PageOutcome::Replaced { count }
            }
            PageRequestKind::Next => {
                let mut seen: HashSet<ItemId> =
                    inner.state.items.iter().map(|item| item.id.clone()).collect();
                let fresh: Vec<FeedItem> = items
                    .into_iter()
                    .filter(|item| !inner.blocked.contains(item.creator_id()))
                    .filter(|item| seen.insert(item.id.clone()))
                    .collect();
                let added = fresh.len();
                if added < returned {
                    tracing::debug!(
                        dropped = returned - added,
                        page = request.page,
                        "dropped duplicate or blocked items"
                    );
                }
                inner.state.items.extend(fresh);
                tracing::info!(
                    page = request.page,
                    added,
                    total = inner.state.items.len(),
                    has_more = inner.state.has_more,
                    "page appended"
                );
                PageOutcome::Appended { added }
            }
        }
    }

    /// Run `request` against the client, abandoning it if cancelled.
    pub async fn execute(&self, request: PageRequest) -> PageOutcome {
        let fetch = self
            .client
            .fetch_shorts_page(request.page, request.page_size, request.sort);

        let result = tokio::select! {
            _ = request.cancel.cancelled() => return PageOutcome::Stale,
            result = fetch => result.map_err(FeedError::from),
        };

        self.finish(&request, result)
    }

    /// Re-issue whichever request last failed, or `None` if nothing did.
    pub fn begin_retry(&self) -> Option<PageRequest> {
        let last_failed = self.inner.lock().last_failed;
        match last_failed? {
            PageRequestKind::First => Some(self.begin_first_page(false)),
            PageRequestKind::Next => self.begin_next_page(),
        }
    }

    /// Issue `request` as an owned fetch that does not borrow the controller.
    pub fn pending(&self, request: PageRequest) -> PendingPage {
        PendingPage {
            controller: self.clone(),
            request,
        }
    }

    pub async fn load_first_page(&self) -> PageOutcome {
        let request = self.begin_first_page(false);
        self.execute(request).await
    }

    pub async fn refresh(&self) -> PageOutcome {
        let request = self.begin_first_page(true);
        self.execute(request).await
    }

    pub async fn load_next_page(&self) -> PageOutcome {
        match self.begin_next_page() {
            Some(request) => self.execute(request).await,
            None => PageOutcome::Skipped,
        }
    }

    pub async fn retry(&self) -> PageOutcome {
        match self.begin_retry() {
            Some(request) => self.execute(request).await,
            None => PageOutcome::Skipped,
        }
    }

    /// Cancel whatever fetch is in flight and clear the loading flags.
    pub fn cancel_in_flight(&self) {
        let mut inner = self.inner.lock();
        if let Some(token) = inner.in_flight.take() {
            token.cancel();
            inner.generation += 1;
            inner.state.is_loading = false;
            inner.state.is_refreshing = false;
        }
    }

    /// Hide `creator_id` from now on and drop their loaded items.
    /// Returns the ids that were removed.
    pub fn remove_creator(&self, creator_id: &CreatorId) -> Vec<ItemId> {
        let mut inner = self.inner.lock();
        inner.blocked.insert(creator_id.clone());
        let mut removed = Vec::new();
        inner.state.items.retain(|item| {
            if item.creator_id() == creator_id {
                removed.push(item.id.clone());
                false
            } else {
                true
            }
        });
        tracing::info!(creator_id = %creator_id, removed = removed.len(), "creator hidden");
        removed
    }

    pub fn is_blocked(&self, creator_id: &CreatorId) -> bool {
        self.inner.lock().blocked.contains(creator_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::{StubFeedClient, fixtures};
    use reelix_contracts::client::ClientError;

    fn controller(stub: &StubFeedClient, page_size: u32) -> FeedController {
        FeedController::new(Arc::new(stub.clone()), page_size, FeedSort::Latest)
    }

    #[tokio::test]
    async fn first_page_replaces_and_detects_end() {
        let stub = StubFeedClient::with_catalog(fixtures::feed_items(1, 3));
        let feed = controller(&stub, 2);

        assert_eq!(feed.load_first_page().await, PageOutcome::Replaced { count: 2 });
        assert!(feed.has_more());

        assert_eq!(feed.load_next_page().await, PageOutcome::Appended { added: 1 });
        let state = feed.snapshot();
        assert_eq!(state.items.len(), 3);
        assert_eq!(state.page, 2);
        assert!(!state.has_more);

        assert_eq!(feed.load_next_page().await, PageOutcome::Skipped);
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn failed_next_page_keeps_loaded_items_and_retries() {
        let stub = StubFeedClient::with_catalog(fixtures::feed_items(1, 6));
        let feed = controller(&stub, 3);
        feed.load_first_page().await;

        stub.fail_next(ClientError::Network("offline".into()));
        let outcome = feed.load_next_page().await;
        assert_eq!(outcome, PageOutcome::Failed(FeedError::Network("offline".into())));

        let state = feed.snapshot();
        assert_eq!(state.items.len(), 3);
        assert!(!state.is_loading);
        assert!(state.error.is_some());

        assert_eq!(feed.retry().await, PageOutcome::Appended { added: 3 });
        assert_eq!(stub.calls().last().map(|call| call.0), Some(2));
        assert!(feed.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn duplicates_are_dropped_but_has_more_uses_raw_count() {
        let stub = StubFeedClient::new();
        stub.push_response(Ok(fixtures::feed_items(1, 2)));
        stub.push_response(Ok(vec![fixtures::feed_item(2), fixtures::feed_item(3)]));
        let feed = controller(&stub, 2);

        feed.load_first_page().await;
        assert_eq!(feed.load_next_page().await, PageOutcome::Appended { added: 1 });
        assert!(feed.has_more());
        assert_eq!(feed.len(), 3);
    }

    #[test]
    fn superseded_result_is_ignored() {
        let feed = controller(&StubFeedClient::new(), 2);

        let first = feed.begin_first_page(false);
        let second = feed.begin_first_page(true);
        assert!(first.cancel.is_cancelled());

        assert_eq!(
            feed.finish(&first, Ok(fixtures::feed_items(1, 2))),
            PageOutcome::Stale
        );
        assert!(feed.is_empty());
        assert!(feed.snapshot().is_refreshing);

        assert_eq!(
            feed.finish(&second, Ok(fixtures::feed_items(5, 1))),
            PageOutcome::Replaced { count: 1 }
        );
        assert_eq!(feed.items()[0].id, ItemId::new("item-5"));
    }

    #[test]
    fn next_page_is_not_issued_while_loading() {
        let feed = controller(&StubFeedClient::new(), 2);
        let _first = feed.begin_first_page(false);
        assert!(feed.begin_next_page().is_none());
    }

    #[tokio::test]
    async fn blocked_creator_is_removed_and_filtered() {
        let stub = StubFeedClient::new();
        stub.push_response(Ok(vec![
            fixtures::feed_item_by(1, 7),
            fixtures::feed_item_by(2, 8),
        ]));
        stub.push_response(Ok(vec![
            fixtures::feed_item_by(3, 7),
            fixtures::feed_item_by(4, 9),
        ]));
        let feed = controller(&stub, 2);
        feed.load_first_page().await;

        let removed = feed.remove_creator(&CreatorId::new("creator-7"));
        assert_eq!(removed, vec![ItemId::new("item-1")]);

        feed.load_next_page().await;
        let ids: Vec<_> = feed.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![ItemId::new("item-2"), ItemId::new("item-4")]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_an_exhausted_feed_exhausted() {
        let stub = StubFeedClient::with_catalog(fixtures::feed_items(1, 2));
        let feed = controller(&stub, 5);
        feed.load_first_page().await;
        assert!(!feed.has_more());

        stub.fail_next(ClientError::Network("offline".into()));
        assert!(matches!(feed.refresh().await, PageOutcome::Failed(_)));
        assert!(!feed.has_more());
        assert_eq!(feed.len(), 2);

        assert_eq!(feed.load_next_page().await, PageOutcome::Skipped);
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn pending_page_runs_off_the_controller() {
        let stub = StubFeedClient::with_catalog(fixtures::feed_items(1, 4));
        let feed = controller(&stub, 2);

        let pending = feed.pending(feed.begin_first_page(false));
        assert!(feed.is_loading());
        let outcome = tokio::spawn(pending.run()).await.unwrap();
        assert_eq!(outcome, PageOutcome::Replaced { count: 2 });

        stub.fail_next(ClientError::Network("offline".into()));
        let next = feed.begin_next_page().unwrap();
        assert!(matches!(feed.pending(next).run().await, PageOutcome::Failed(_)));

        let retry = feed.begin_retry().unwrap();
        assert_eq!(retry.page, 2);
        assert_eq!(feed.pending(retry).run().await, PageOutcome::Appended { added: 2 });
        assert!(feed.begin_retry().is_none());
    }
}
