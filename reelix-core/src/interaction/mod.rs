//! Optimistic per-item interactions: likes, comments.

mod comments;
mod optimistic;
mod store;

pub use comments::{CommentOutcome, CommentThread};
pub use optimistic::{Settlement, Transaction};
pub use store::{
    InteractionState, InteractionStore, LikeOutcome, LikeState, LikeTicket, PendingLike,
    ReactionSync,
};
