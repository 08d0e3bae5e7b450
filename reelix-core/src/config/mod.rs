//! Client configuration: models, file/env sources and the loader.

pub mod loader;
pub mod models;
pub mod sources;

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions,
    ConfigWarning, ConfigWarnings,
};
pub use models::{ApiConfig, ClientConfig, FeedConfig};
pub use sources::{EnvConfig, FileApiConfig, FileConfig, FileFeedConfig};
