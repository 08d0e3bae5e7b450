pub mod api_client;
pub mod constants;
pub mod headless_media;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api_client::HttpApiClient;
pub use headless_media::{HeadlessMedia, HeadlessMediaFactory};
