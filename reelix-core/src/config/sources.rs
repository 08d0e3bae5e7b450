use serde::Deserialize;
use std::path::PathBuf;

/// On-disk `reelix.toml` layout. Every field is optional; absent values fall
/// back to the environment and then to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api: FileApiConfig,
    pub feed: FileFeedConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileApiConfig {
    pub base_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileFeedConfig {
    pub page_size: Option<u32>,
    pub sort: Option<String>,
    pub viewability_threshold: Option<f32>,
    pub double_tap_window_ms: Option<u64>,
    pub heart_burst_ms: Option<u64>,
    pub stall_window_ms: Option<u64>,
    pub retain_behind: Option<usize>,
    pub retain_ahead: Option<usize>,
    pub interaction_cache_capacity: Option<usize>,
    pub interaction_retain_distance: Option<usize>,
    pub load_more_threshold: Option<usize>,
    pub comments_page_size: Option<u32>,
    pub start_muted: Option<bool>,
}

/// Raw environment overrides. Parsing happens in the loader so errors can
/// name the offending variable.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub page_size: Option<String>,
    pub feed_sort: Option<String>,
    pub request_timeout_ms: Option<String>,
}

impl EnvConfig {
    pub const CONFIG_PATH: &'static str = "REELIX_CONFIG";
    pub const API_URL: &'static str = "REELIX_API_URL";
    pub const PAGE_SIZE: &'static str = "REELIX_PAGE_SIZE";
    pub const FEED_SORT: &'static str = "REELIX_FEED_SORT";
    pub const REQUEST_TIMEOUT_MS: &'static str = "REELIX_REQUEST_TIMEOUT_MS";

    /// Read the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup (tests pass a map instead of mutating
    /// the process environment).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            config_path: non_empty(Self::CONFIG_PATH).map(PathBuf::from),
            api_url: non_empty(Self::API_URL),
            page_size: non_empty(Self::PAGE_SIZE),
            feed_sort: non_empty(Self::FEED_SORT),
            request_timeout_ms: non_empty(Self::REQUEST_TIMEOUT_MS),
        }
    }
}
