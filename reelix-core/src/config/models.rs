use std::time::Duration;

use reelix_model::FeedSort;
use url::Url;

use crate::infra::constants::{
    api, feed, gestures, interaction, playback, viewability,
};

/// Engine tuning shared by every component of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub page_size: u32,
    pub sort: FeedSort,
    /// Minimum visible fraction (0, 1] for an item to become active.
    pub viewability_threshold: f32,
    pub double_tap_window: Duration,
    pub heart_burst: Duration,
    /// UI-unblock window: reload offered and controls forced visible after
    /// this long without playback. Playback itself is never cancelled.
    pub stall_window: Duration,
    pub retain_behind: usize,
    pub retain_ahead: usize,
    pub interaction_cache_capacity: usize,
    pub interaction_retain_distance: usize,
    pub load_more_threshold: usize,
    pub comments_page_size: u32,
    pub start_muted: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: feed::PAGE_SIZE,
            sort: FeedSort::default(),
            viewability_threshold: viewability::VISIBLE_THRESHOLD,
            double_tap_window: Duration::from_millis(
                gestures::DOUBLE_TAP_WINDOW_MS,
            ),
            heart_burst: Duration::from_millis(gestures::HEART_BURST_MS),
            stall_window: Duration::from_millis(playback::STALL_WINDOW_MS),
            retain_behind: playback::RETAIN_BEHIND,
            retain_ahead: playback::RETAIN_AHEAD,
            interaction_cache_capacity: interaction::CACHE_CAPACITY,
            interaction_retain_distance: interaction::RETAIN_DISTANCE,
            load_more_threshold: feed::LOAD_MORE_THRESHOLD,
            comments_page_size: interaction::COMMENTS_PAGE_SIZE,
            start_muted: false,
        }
    }
}

/// Where and how to reach the REST API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(api::DEFAULT_BASE_URL)
                .expect("default base url is a valid url"),
            request_timeout: Duration::from_millis(api::REQUEST_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub feed: FeedConfig,
}
