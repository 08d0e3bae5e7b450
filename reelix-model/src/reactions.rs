use crate::error::ModelError;
use std::str::FromStr;

/// Reaction posted against an item or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReactionKind {
    Like,
    Dislike,
    Remove,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
            ReactionKind::Remove => "remove",
        }
    }

    /// Reaction that moves a like toggle from `currently_liked` to its opposite.
    pub fn toggle_from(currently_liked: bool) -> Self {
        if currently_liked {
            ReactionKind::Remove
        } else {
            ReactionKind::Like
        }
    }
}

impl FromStr for ReactionKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            "remove" => Ok(ReactionKind::Remove),
            other => Err(ModelError::UnknownReactionKind(other.to_string())),
        }
    }
}

/// Authoritative counters returned after a reaction is posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionCounts {
    pub likes: u64,
    pub dislikes: u64,
}

/// Whether the signed-in user has liked an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionState {
    pub liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_direction_follows_current_state() {
        assert_eq!(ReactionKind::toggle_from(false), ReactionKind::Like);
        assert_eq!(ReactionKind::toggle_from(true), ReactionKind::Remove);
    }
}
