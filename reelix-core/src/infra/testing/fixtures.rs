use chrono::{TimeZone, Utc};
use reelix_model::{Comment, CommentId, Creator, CreatorId, FeedItem, ItemId};
use url::Url;

pub fn creator(n: u32) -> Creator {
    Creator {
        id: CreatorId::new(format!("creator-{n}")),
        display_name: format!("Creator {n}"),
        avatar_url: None,
    }
}

/// Item `item-{n}` by `creator-{n}`.
pub fn feed_item(n: u32) -> FeedItem {
    feed_item_by(n, n)
}

pub fn feed_item_by(n: u32, creator_n: u32) -> FeedItem {
    FeedItem {
        id: ItemId::new(format!("item-{n}")),
        title: format!("Short {n}"),
        author: creator(creator_n),
        thumbnail_url: Url::parse(&format!(
            "https://cdn.example.com/thumbs/{n}.jpg"
        ))
        .ok(),
        media_uri: Url::parse(&format!(
            "https://cdn.example.com/shorts/{n}.m3u8"
        ))
        .unwrap_or_else(|_| panic!("fixture url for item {n}")),
        duration_seconds: Some(30.0),
        like_count: u64::from(n) * 10,
        comment_count: u64::from(n),
    }
}

/// Items numbered `start..start + count`.
pub fn feed_items(start: u32, count: u32) -> Vec<FeedItem> {
    (start..start + count).map(feed_item).collect()
}

pub fn comment(item_id: &ItemId, n: u32) -> Comment {
    Comment {
        id: CommentId::new(format!("{item_id}-comment-{n}")),
        item_id: item_id.clone(),
        author: creator(100 + n),
        text: format!("comment {n}"),
        like_count: u64::from(n),
        is_liked: false,
        created_at: Utc
            .timestamp_opt(1_700_000_000 + i64::from(n), 0)
            .single()
            .unwrap_or_default(),
    }
}
