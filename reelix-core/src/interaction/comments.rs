use std::collections::HashSet;

use reelix_model::{Comment, CommentId, CommentPage, ReactionKind};

use super::{optimistic::Transaction, store::LikeState};
use crate::error::{FeedError, FeedResult};
use crate::infra::constants::interaction::MAX_COMMENT_CHARS;

#[derive(Debug, Clone, PartialEq)]
pub enum CommentOutcome {
    Loaded { page: u32, count: usize },
    Liked(LikeState),
    RolledBack { state: LikeState, error: FeedError },
    Failed(FeedError),
    /// Nothing to do: past the last page, already loading, or a like for
    /// this row is still pending.
    Skipped,
    /// Superseded or evicted while in flight.
    Stale,
}

/// Paginated comments under one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentThread {
    pub items: Vec<Comment>,
    /// Last page loaded; 0 before the first load.
    pub page: u32,
    pub total_pages: u32,
    pub is_loading: bool,
    pub error: Option<FeedError>,
    pub pending_likes: HashSet<CommentId>,
    generation: u64,
}

impl CommentThread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.items.iter().find(|comment| &comment.id == id)
    }

    /// Page that `load_more` would fetch, if any.
    pub fn next_page(&self) -> Option<u32> {
        if self.is_loading || self.page == 0 || self.page >= self.total_pages {
            None
        } else {
            Some(self.page + 1)
        }
    }

    /// Page 1 always proceeds and supersedes whatever is loading.
    pub(crate) fn begin_load(&mut self, page: u32) -> Option<u64> {
        if page == 0 || (page > 1 && self.is_loading) {
            return None;
        }
        if page > 1 && self.total_pages > 0 && page > self.total_pages {
            return None;
        }
        self.generation += 1;
        self.is_loading = true;
        self.error = None;
        Some(self.generation)
    }

    pub(crate) fn finish_load(
        &mut self,
        generation: u64,
        requested: u32,
        result: FeedResult<CommentPage>,
    ) -> CommentOutcome {
        if generation != self.generation {
            return CommentOutcome::Stale;
        }
        self.is_loading = false;

        match result {
            Ok(page) => {
                let count = page.items.len();
                if requested <= 1 {
                    self.items = page.items;
                } else {
                    let seen: HashSet<CommentId> =
                        self.items.iter().map(|c| c.id.clone()).collect();
                    self.items.extend(
                        page.items.into_iter().filter(|c| !seen.contains(&c.id)),
                    );
                }
                self.page = requested;
                self.total_pages = page.total_pages;
                CommentOutcome::Loaded {
                    page: requested,
                    count,
                }
            }
            Err(err) => {
                self.error = Some(err.clone());
                CommentOutcome::Failed(err)
            }
        }
    }

    pub(crate) fn prepend(&mut self, comment: Comment) {
        self.items.retain(|existing| existing.id != comment.id);
        self.items.insert(0, comment);
    }

    /// Apply the optimistic flip to one row. `Ok(None)` while a like for that
    /// row is already pending.
    pub(crate) fn begin_like(
        &mut self,
        id: &CommentId,
    ) -> FeedResult<Option<(Transaction<LikeState>, ReactionKind)>> {
        if self.pending_likes.contains(id) {
            return Ok(None);
        }
        let row = self
            .items
            .iter_mut()
            .find(|comment| &comment.id == id)
            .ok_or_else(|| FeedError::Validation(format!("unknown comment {id}")))?;

        let prior = LikeState {
            like_count: row.like_count,
            is_liked: row.is_liked,
        };
        let kind = ReactionKind::toggle_from(prior.is_liked);
        let txn = Transaction::begin(&prior, LikeState::toggle);
        row.like_count = txn.optimistic().like_count;
        row.is_liked = txn.optimistic().is_liked;
        self.pending_likes.insert(id.clone());
        Ok(Some((txn, kind)))
    }

    /// Write the settled value back. The row may be gone after a reload.
    pub(crate) fn finish_like(&mut self, id: &CommentId, settled: &LikeState) {
        self.pending_likes.remove(id);
        if let Some(row) = self.items.iter_mut().find(|comment| &comment.id == id) {
            row.like_count = settled.like_count;
            row.is_liked = settled.is_liked;
        }
    }
}

/// Client-side checks made before any request is sent.
pub fn validate_comment(text: &str) -> FeedResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FeedError::Validation("comment cannot be empty".into()));
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(FeedError::Validation(format!(
            "comment exceeds {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(trimmed)
}
