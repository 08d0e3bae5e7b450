use crate::error::ModelError;
use crate::ids::{CreatorId, ItemId};
use std::str::FromStr;
use url::Url;

/// The channel that published a feed item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Creator {
    pub id: CreatorId,
    pub display_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub avatar_url: Option<Url>,
}

/// One short-form video in the feed.
///
/// Immutable once fetched. Feed order is the order items were received in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedItem {
    pub id: ItemId,
    pub title: String,
    pub author: Creator,
    #[cfg_attr(feature = "serde", serde(default))]
    pub thumbnail_url: Option<Url>,
    pub media_uri: Url,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_seconds: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub like_count: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub comment_count: u64,
}

impl FeedItem {
    pub fn creator_id(&self) -> &CreatorId {
        &self.author.id
    }
}

/// Ordering requested from the shorts endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FeedSort {
    #[default]
    Latest,
    Trending,
    Random,
}

impl FeedSort {
    /// Value used for the `sort` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            FeedSort::Latest => "latest",
            FeedSort::Trending => "trending",
            FeedSort::Random => "random",
        }
    }
}

impl FromStr for FeedSort {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(FeedSort::Latest),
            "trending" => Ok(FeedSort::Trending),
            "random" => Ok(FeedSort::Random),
            other => Err(ModelError::UnknownSort(other.to_string())),
        }
    }
}

impl std::fmt::Display for FeedSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_case_insensitively() {
        assert_eq!("Trending".parse::<FeedSort>().unwrap(), FeedSort::Trending);
        assert!(matches!(
            "oldest".parse::<FeedSort>(),
            Err(ModelError::UnknownSort(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn feed_item_defaults_optional_counters() {
        let json = r#"{
            "id": "v1",
            "title": "Sunset",
            "author": { "id": "c1", "display_name": "Ana" },
            "media_uri": "https://cdn.example.com/v1.m3u8"
        }"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.like_count, 0);
        assert_eq!(item.comment_count, 0);
        assert!(item.thumbnail_url.is_none());
        assert_eq!(item.creator_id().as_str(), "c1");
    }
}
