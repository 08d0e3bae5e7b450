use once_cell::sync::Lazy;
use reelix_model::FeedSort;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

use super::{
    models::{ApiConfig, ClientConfig, FeedConfig},
    sources::{EnvConfig, FileConfig},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("reelix.toml"),
        PathBuf::from("config/reelix.toml"),
    ]
});

const MAX_PAGE_SIZE: u32 = 50;
const MIN_VIEWABILITY_THRESHOLD: f32 = 0.05;

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Use these overrides instead of reading the process environment.
    pub env: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: ClientConfig,
    pub warnings: ConfigWarnings,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file {path} does not exist")]
    MissingConfig { path: PathBuf },

    #[error("failed to read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to load env file")]
    EnvFile(#[from] dotenvy::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid api base url {value:?}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env = match &self.options.env {
            Some(env) => env.clone(),
            None => {
                self.load_env_file()?;
                EnvConfig::gather()
            }
        };

        let (file_config, source) = self.load_file_config(&env)?;
        let (config, warnings) =
            compose_config(file_config, &env, source.is_some())?;

        tracing::debug!(
            source = ?source,
            warnings = warnings.len(),
            base_url = %config.api.base_url,
            "configuration loaded"
        );

        Ok(ConfigLoad {
            config,
            warnings,
            source,
        })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        loaded.or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            other => Err(ConfigLoadError::EnvFile(other)),
        })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.clone(),
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: &EnvConfig,
    config_present: bool,
) -> Result<(ClientConfig, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if !config_present {
        warnings.push_with_hint(
            "No reelix.toml detected; using environment variables and defaults",
            "Create reelix.toml or set REELIX_CONFIG to point at one",
        );
    }

    let FileConfig {
        api: file_api,
        feed: file_feed,
    } = file_config.unwrap_or_default();

    let defaults = ClientConfig::default();

    let raw_base_url = env.api_url.clone().or(file_api.base_url);
    let base_url = match raw_base_url {
        Some(raw) => normalize_base_url(&raw)?,
        None => defaults.api.base_url.clone(),
    };

    let request_timeout_ms = match &env.request_timeout_ms {
        Some(raw) => Some(parse_env(EnvConfig::REQUEST_TIMEOUT_MS, raw)?),
        None => file_api.request_timeout_ms,
    };
    let request_timeout = request_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.api.request_timeout);

    let page_size = match &env.page_size {
        Some(raw) => Some(parse_env(EnvConfig::PAGE_SIZE, raw)?),
        None => file_feed.page_size,
    };
    let sort = match env.feed_sort.as_deref().or(file_feed.sort.as_deref()) {
        Some(raw) => {
            raw.parse::<FeedSort>()
                .map_err(|_| ConfigLoadError::InvalidValue {
                    key: EnvConfig::FEED_SORT,
                    value: raw.to_string(),
                })?
        }
        None => defaults.feed.sort,
    };

    let base = defaults.feed;
    let ms = |value: Option<u64>, fallback: Duration| {
        value.map(Duration::from_millis).unwrap_or(fallback)
    };

    let mut feed = FeedConfig {
        page_size: page_size.unwrap_or(base.page_size),
        sort,
        viewability_threshold: file_feed
            .viewability_threshold
            .unwrap_or(base.viewability_threshold),
        double_tap_window: ms(
            file_feed.double_tap_window_ms,
            base.double_tap_window,
        ),
        heart_burst: ms(file_feed.heart_burst_ms, base.heart_burst),
        stall_window: ms(file_feed.stall_window_ms, base.stall_window),
        retain_behind: file_feed.retain_behind.unwrap_or(base.retain_behind),
        retain_ahead: file_feed.retain_ahead.unwrap_or(base.retain_ahead),
        interaction_cache_capacity: file_feed
            .interaction_cache_capacity
            .unwrap_or(base.interaction_cache_capacity),
        interaction_retain_distance: file_feed
            .interaction_retain_distance
            .unwrap_or(base.interaction_retain_distance),
        load_more_threshold: file_feed
            .load_more_threshold
            .unwrap_or(base.load_more_threshold),
        comments_page_size: file_feed
            .comments_page_size
            .unwrap_or(base.comments_page_size),
        start_muted: file_feed.start_muted.unwrap_or(base.start_muted),
    };

    apply_guard_rails(&mut feed, &mut warnings);

    Ok((
        ClientConfig {
            api: ApiConfig {
                base_url,
                request_timeout,
            },
            feed,
        },
        warnings,
    ))
}

/// Clamp values that would break the engine instead of refusing to start.
fn apply_guard_rails(feed: &mut FeedConfig, warnings: &mut ConfigWarnings) {
    let defaults = FeedConfig::default();

    if feed.page_size == 0 {
        warnings.push(format!(
            "feed.page_size must be positive; using {}",
            defaults.page_size
        ));
        feed.page_size = defaults.page_size;
    } else if feed.page_size > MAX_PAGE_SIZE {
        warnings.push(format!(
            "feed.page_size {} exceeds {MAX_PAGE_SIZE}; clamping",
            feed.page_size
        ));
        feed.page_size = MAX_PAGE_SIZE;
    }

    if feed.comments_page_size == 0 {
        warnings.push(format!(
            "feed.comments_page_size must be positive; using {}",
            defaults.comments_page_size
        ));
        feed.comments_page_size = defaults.comments_page_size;
    }

    let threshold = feed.viewability_threshold;
    if !threshold.is_finite()
        || !(MIN_VIEWABILITY_THRESHOLD..=1.0).contains(&threshold)
    {
        let clamped = if threshold.is_finite() {
            threshold.clamp(MIN_VIEWABILITY_THRESHOLD, 1.0)
        } else {
            defaults.viewability_threshold
        };
        warnings.push_with_hint(
            format!(
                "feed.viewability_threshold {threshold} out of range; using {clamped}"
            ),
            "Use a fraction such as 0.8",
        );
        feed.viewability_threshold = clamped;
    }

    if feed.interaction_cache_capacity == 0 {
        warnings.push("feed.interaction_cache_capacity must be positive; using 1");
        feed.interaction_cache_capacity = 1;
    }

    if feed.double_tap_window.is_zero() {
        warnings.push(format!(
            "feed.double_tap_window_ms must be positive; using {}ms",
            defaults.double_tap_window.as_millis()
        ));
        feed.double_tap_window = defaults.double_tap_window;
    }
}

fn parse_env<T: std::str::FromStr>(
    key: &'static str,
    raw: &str,
) -> Result<T, ConfigLoadError> {
    raw.parse::<T>().map_err(|_| ConfigLoadError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Accept `localhost:3000`-style input: add a scheme when missing and drop
/// trailing slashes so route joining never doubles them.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, ConfigLoadError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme =
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
    Url::parse(&with_scheme).map_err(|source| ConfigLoadError::InvalidBaseUrl {
        value: raw.to_string(),
        source,
    })
}
