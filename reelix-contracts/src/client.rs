//! REST collaborator contracts.
//!
//! Implemented over HTTP in `reelix-core` and by stubs in tests. Every call
//! can fail with a network, auth or server error; see [`ClientError`].

use async_trait::async_trait;
use reelix_model::{
    AuthToken, Comment, CommentId, CommentPage, CreatorId, FeedItem, FeedSort,
    ItemId, ReactionCounts, ReactionKind, ReactionState, ReportReason,
    ReportTarget,
};

/// Failure reported by a REST collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("server error ({status:?}): {message}")]
    Server { status: Option<u16>, message: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("request cancelled")]
    Cancelled,
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Source of feed pages.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Returns at most `page_size` items; fewer signals the end of the feed.
    async fn fetch_shorts_page(
        &self,
        page: u32,
        page_size: u32,
        sort: FeedSort,
    ) -> ClientResult<Vec<FeedItem>>;
}

/// Reactions, comments and moderation endpoints.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait InteractionClient: Send + Sync {
    async fn fetch_reaction_state(
        &self,
        item_id: &ItemId,
        token: &AuthToken,
    ) -> ClientResult<ReactionState>;

    async fn post_reaction(
        &self,
        item_id: &ItemId,
        kind: ReactionKind,
        token: &AuthToken,
    ) -> ClientResult<ReactionCounts>;

    async fn fetch_comments(
        &self,
        item_id: &ItemId,
        page: u32,
        page_size: u32,
    ) -> ClientResult<CommentPage>;

    async fn post_comment(
        &self,
        item_id: &ItemId,
        text: &str,
        token: &AuthToken,
    ) -> ClientResult<Comment>;

    async fn post_comment_reaction(
        &self,
        comment_id: &CommentId,
        kind: ReactionKind,
        token: &AuthToken,
    ) -> ClientResult<ReactionCounts>;

    async fn report_content(
        &self,
        target: &ReportTarget,
        reason: ReportReason,
        free_text: &str,
        token: &AuthToken,
    ) -> ClientResult<()>;

    async fn block_creator(
        &self,
        creator_id: &CreatorId,
        reason_text: &str,
        token: &AuthToken,
    ) -> ClientResult<()>;
}
