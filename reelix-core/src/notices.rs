//! User-facing banners raised by failures.
//!
//! Components push notices; the host UI drains them. Nothing here blocks
//! playback or scrolling.

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use reelix_model::{CommentId, CreatorId, ItemId};

use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeScope {
    /// The feed page as a whole (page fetch failures).
    Page,
    Item(ItemId),
    Comment(CommentId),
    Creator(CreatorId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Inline retry affordance; existing content stays visible.
    Retry,
    /// Short-lived banner after a rolled back interaction.
    Transient,
    /// The user has to sign in before trying again.
    SignIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub scope: NoticeScope,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn page_retry(err: &FeedError) -> Self {
        Self {
            scope: NoticeScope::Page,
            kind: if err.requires_sign_in() {
                NoticeKind::SignIn
            } else {
                NoticeKind::Retry
            },
            message: err.to_string(),
        }
    }

    /// Notice for a failed interaction within `scope`.
    pub fn interaction(scope: NoticeScope, err: &FeedError) -> Self {
        Self {
            scope,
            kind: if err.requires_sign_in() {
                NoticeKind::SignIn
            } else {
                NoticeKind::Transient
            },
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    queue: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        tracing::debug!(kind = ?notice.kind, scope = ?notice.scope, message = %notice.message, "notice raised");
        self.queue.lock().push_back(notice);
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_ask_for_sign_in() {
        let id = ItemId::new("a");
        let notice = Notice::interaction(
            NoticeScope::Item(id.clone()),
            &FeedError::AuthRequired,
        );
        assert_eq!(notice.kind, NoticeKind::SignIn);

        let notice = Notice::interaction(
            NoticeScope::Item(id.clone()),
            &FeedError::Network("offline".into()),
        );
        assert_eq!(notice.kind, NoticeKind::Transient);
        assert_eq!(notice.scope, NoticeScope::Item(id));
    }

    #[test]
    fn drain_empties_the_board() {
        let board = NoticeBoard::new();
        board.push(Notice::page_retry(&FeedError::Server("500".into())));
        assert_eq!(board.len(), 1);
        assert_eq!(board.drain()[0].kind, NoticeKind::Retry);
        assert!(board.is_empty());
    }
}
