//! Core data model definitions shared across Reelix crates.
#![allow(missing_docs)]

pub mod api;
pub mod auth;
pub mod comments;
pub mod error;
pub mod feed;
pub mod ids;
pub mod moderation;
pub mod prelude;
pub mod reactions;

// Intentionally curated re-exports for downstream consumers.
pub use api::{
    ApiResponse, BlockCreatorRequest, PostCommentRequest, ReactionRequest,
    ReportRequest,
};
pub use auth::AuthToken;
pub use comments::{Comment, CommentPage};
pub use error::{ModelError, Result as ModelResult};
pub use feed::{Creator, FeedItem, FeedSort};
pub use ids::{CommentId, CreatorId, ItemId};
pub use moderation::{ReportReason, ReportTarget};
pub use reactions::{ReactionCounts, ReactionKind, ReactionState};
