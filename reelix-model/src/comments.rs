use crate::feed::Creator;
use crate::ids::{CommentId, ItemId};
use chrono::{DateTime, Utc};

/// A single comment row under a feed item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    pub id: CommentId,
    pub item_id: ItemId,
    pub author: Creator,
    pub text: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub like_count: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of comments plus the server's pagination metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommentPage {
    pub items: Vec<Comment>,
    pub page: u32,
    pub total_pages: u32,
}
