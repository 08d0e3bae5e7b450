//! Trait surfaces for the collaborators the feed engine consumes.
//!
//! The engine never talks to a decoder or the network directly; it goes
//! through [`media::MediaResource`] / [`media::MediaFactory`] for playback and
//! [`client::FeedClient`] / [`client::InteractionClient`] for the REST API.

pub mod client;
pub mod media;

/// Frequently used contract items.
pub mod prelude {
    pub use super::client::{
        ClientError, ClientResult, FeedClient, InteractionClient,
    };
    pub use super::media::{
        MediaEvent, MediaEventReceiver, MediaEventSink, MediaFactory,
        MediaFault, MediaProgress, MediaResource, MediaStatus, MediaTag,
        media_event_channel,
    };
}
