//! Convenience re-exports for consumers that touch most of the model.

pub use crate::api::ApiResponse;
pub use crate::auth::AuthToken;
pub use crate::comments::{Comment, CommentPage};
pub use crate::feed::{Creator, FeedItem, FeedSort};
pub use crate::ids::{CommentId, CreatorId, ItemId};
pub use crate::moderation::{ReportReason, ReportTarget};
pub use crate::reactions::{ReactionCounts, ReactionKind, ReactionState};
