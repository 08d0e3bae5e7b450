use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use reelix_contracts::client::{
    ClientError, ClientResult, FeedClient, InteractionClient,
};
use reelix_model::{
    AuthToken, Comment, CommentId, CommentPage, CreatorId, FeedItem, FeedSort,
    ItemId, ReactionCounts, ReactionKind, ReactionState, ReportReason,
    ReportTarget,
};

use super::fixtures;

#[derive(Debug, Default)]
struct FeedInner {
    catalog: Vec<FeedItem>,
    scripted: VecDeque<ClientResult<Vec<FeedItem>>>,
    calls: Vec<(u32, u32, FeedSort)>,
    delay: Option<Duration>,
}

/// Feed source serving a fixed catalog page by page.
///
/// Scripted responses, when queued, are returned first and in order.
#[derive(Debug, Clone, Default)]
pub struct StubFeedClient {
    inner: Arc<Mutex<FeedInner>>,
}

impl StubFeedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Vec<FeedItem>) -> Self {
        let stub = Self::default();
        stub.inner.lock().catalog = catalog;
        stub
    }

    pub fn set_catalog(&self, catalog: Vec<FeedItem>) {
        self.inner.lock().catalog = catalog;
    }

    pub fn push_response(&self, response: ClientResult<Vec<FeedItem>>) {
        self.inner.lock().scripted.push_back(response);
    }

    pub fn fail_next(&self, err: ClientError) {
        self.push_response(Err(err));
    }

    /// Delay every response, for tests that race fetches against refresh.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<(u32, u32, FeedSort)> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }
}

#[async_trait]
impl FeedClient for StubFeedClient {
    async fn fetch_shorts_page(
        &self,
        page: u32,
        page_size: u32,
        sort: FeedSort,
    ) -> ClientResult<Vec<FeedItem>> {
        let (delay, response) = {
            let mut inner = self.inner.lock();
            inner.calls.push((page, page_size, sort));
            let response = match inner.scripted.pop_front() {
                Some(response) => response,
                None => {
                    let start = (page.saturating_sub(1) as usize)
                        .saturating_mul(page_size as usize);
                    Ok(inner
                        .catalog
                        .iter()
                        .skip(start)
                        .take(page_size as usize)
                        .cloned()
                        .collect())
                }
            };
            (inner.delay, response)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

/// Call recorded by [`StubInteractionClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionCall {
    FetchReactionState(ItemId),
    PostReaction(ItemId, ReactionKind),
    FetchComments(ItemId, u32),
    PostComment(ItemId, String),
    PostCommentReaction(CommentId, ReactionKind),
    Report(ReportTarget, ReportReason, String),
    Block(CreatorId, String),
}

#[derive(Debug, Default)]
struct InteractionInner {
    calls: Vec<InteractionCall>,
    likes: HashMap<ItemId, u64>,
    liked: HashSet<ItemId>,
    comment_likes: HashMap<CommentId, u64>,
    comments: HashMap<ItemId, Vec<Comment>>,
    next_comment: u32,
    failures: VecDeque<ClientError>,
    delay: Option<Duration>,
}

/// In-memory reaction/comment/moderation backend.
///
/// Counts behave like a server would: a like increments, a remove decrements.
#[derive(Debug, Clone, Default)]
pub struct StubInteractionClient {
    inner: Arc<Mutex<InteractionInner>>,
}

impl StubInteractionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_likes(&self, item_id: &ItemId, likes: u64, liked: bool) {
        let mut inner = self.inner.lock();
        inner.likes.insert(item_id.clone(), likes);
        if liked {
            inner.liked.insert(item_id.clone());
        } else {
            inner.liked.remove(item_id);
        }
    }

    pub fn seed_comments(&self, item_id: &ItemId, comments: Vec<Comment>) {
        self.inner.lock().comments.insert(item_id.clone(), comments);
    }

    /// The next call, whatever it is, fails with `err`.
    pub fn fail_next(&self, err: ClientError) {
        self.inner.lock().failures.push_back(err);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<InteractionCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    async fn begin(&self, call: InteractionCall) -> ClientResult<()> {
        let (delay, failure) = {
            let mut inner = self.inner.lock();
            inner.calls.push(call);
            (inner.delay, inner.failures.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn apply_reaction(likes: &mut u64, liked: bool, kind: ReactionKind) -> bool {
    match kind {
        ReactionKind::Like if !liked => {
            *likes += 1;
            true
        }
        ReactionKind::Remove | ReactionKind::Dislike if liked => {
            *likes = likes.saturating_sub(1);
            false
        }
        ReactionKind::Like => true,
        ReactionKind::Remove | ReactionKind::Dislike => false,
    }
}

#[async_trait]
impl InteractionClient for StubInteractionClient {
    async fn fetch_reaction_state(
        &self,
        item_id: &ItemId,
        _token: &AuthToken,
    ) -> ClientResult<ReactionState> {
        self.begin(InteractionCall::FetchReactionState(item_id.clone()))
            .await?;
        Ok(ReactionState {
            liked: self.inner.lock().liked.contains(item_id),
        })
    }

    async fn post_reaction(
        &self,
        item_id: &ItemId,
        kind: ReactionKind,
        _token: &AuthToken,
    ) -> ClientResult<ReactionCounts> {
        self.begin(InteractionCall::PostReaction(item_id.clone(), kind))
            .await?;
        let mut inner = self.inner.lock();
        let liked = inner.liked.contains(item_id);
        let likes = inner.likes.entry(item_id.clone()).or_default();
        let now_liked = apply_reaction(likes, liked, kind);
        let likes = *likes;
        if now_liked {
            inner.liked.insert(item_id.clone());
        } else {
            inner.liked.remove(item_id);
        }
        Ok(ReactionCounts { likes, dislikes: 0 })
    }

    async fn fetch_comments(
        &self,
        item_id: &ItemId,
        page: u32,
        page_size: u32,
    ) -> ClientResult<CommentPage> {
        self.begin(InteractionCall::FetchComments(item_id.clone(), page))
            .await?;
        let inner = self.inner.lock();
        let all = inner.comments.get(item_id).cloned().unwrap_or_default();
        let size = page_size.max(1) as usize;
        let total_pages = all.len().div_ceil(size).max(1) as u32;
        let start = (page.saturating_sub(1) as usize).saturating_mul(size);
        Ok(CommentPage {
            items: all.into_iter().skip(start).take(size).collect(),
            page,
            total_pages,
        })
    }

    async fn post_comment(
        &self,
        item_id: &ItemId,
        text: &str,
        _token: &AuthToken,
    ) -> ClientResult<Comment> {
        self.begin(InteractionCall::PostComment(
            item_id.clone(),
            text.to_string(),
        ))
        .await?;
        let mut inner = self.inner.lock();
        inner.next_comment += 1;
        let mut comment = fixtures::comment(item_id, 1000 + inner.next_comment);
        comment.text = text.to_string();
        comment.like_count = 0;
        inner
            .comments
            .entry(item_id.clone())
            .or_default()
            .insert(0, comment.clone());
        Ok(comment)
    }

    async fn post_comment_reaction(
        &self,
        comment_id: &CommentId,
        kind: ReactionKind,
        _token: &AuthToken,
    ) -> ClientResult<ReactionCounts> {
        self.begin(InteractionCall::PostCommentReaction(
            comment_id.clone(),
            kind,
        ))
        .await?;
        let mut inner = self.inner.lock();
        let likes = inner.comment_likes.entry(comment_id.clone()).or_default();
        match kind {
            ReactionKind::Like => *likes += 1,
            ReactionKind::Remove | ReactionKind::Dislike => {
                *likes = likes.saturating_sub(1)
            }
        }
        Ok(ReactionCounts {
            likes: *likes,
            dislikes: 0,
        })
    }

    async fn report_content(
        &self,
        target: &ReportTarget,
        reason: ReportReason,
        free_text: &str,
        _token: &AuthToken,
    ) -> ClientResult<()> {
        self.begin(InteractionCall::Report(
            target.clone(),
            reason,
            free_text.to_string(),
        ))
        .await
    }

    async fn block_creator(
        &self,
        creator_id: &CreatorId,
        reason_text: &str,
        _token: &AuthToken,
    ) -> ClientResult<()> {
        self.begin(InteractionCall::Block(
            creator_id.clone(),
            reason_text.to_string(),
        ))
        .await
    }
}
