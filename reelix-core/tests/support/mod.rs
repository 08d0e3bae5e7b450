#![allow(dead_code)]

use std::{sync::Arc, time::Instant};

use reelix_core::{
    AuthSession, FeedConfig, ShortsFeed, ViewableToken,
    infra::testing::{RecordingMediaFactory, StubFeedClient, StubInteractionClient, fixtures},
};
use reelix_model::{AuthToken, FeedItem, ItemId};

pub struct Rig {
    pub feed: ShortsFeed,
    pub media: RecordingMediaFactory,
    pub pages: StubFeedClient,
    pub api: StubInteractionClient,
    pub session: AuthSession,
    pub t0: Instant,
}

pub fn config(page_size: u32) -> FeedConfig {
    FeedConfig {
        page_size,
        ..FeedConfig::default()
    }
}

/// A signed-in feed over `catalog`.
pub fn rig(catalog: Vec<FeedItem>, page_size: u32) -> Rig {
    let media = RecordingMediaFactory::new();
    let pages = StubFeedClient::with_catalog(catalog);
    let api = StubInteractionClient::new();
    let session = AuthSession::signed_in(AuthToken::new("test-token"));
    let feed = ShortsFeed::new(
        config(page_size),
        Arc::new(pages.clone()),
        Arc::new(api.clone()),
        Arc::new(media.clone()),
        session.clone(),
    );
    Rig {
        feed,
        media,
        pages,
        api,
        session,
        t0: Instant::now(),
    }
}

pub fn catalog(count: u32) -> Vec<FeedItem> {
    fixtures::feed_items(1, count)
}

pub fn id(n: u32) -> ItemId {
    fixtures::feed_item(n).id
}

/// Token for feed position `index` (item `index + 1`).
pub fn token(index: usize, fraction: f32) -> ViewableToken {
    ViewableToken::new(id(index as u32 + 1), index, fraction)
}

/// Report `index` as the only, fully visible item.
pub fn full(index: usize) -> Vec<ViewableToken> {
    vec![token(index, 1.0)]
}
