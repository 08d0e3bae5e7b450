//! Test doubles for the feed engine's collaborators.
//!
//! Stubs are cheap to clone: every clone shares the same recorded state, so a
//! test keeps one handle for assertions and hands another to the engine.

pub mod clients;
pub mod fixtures;
pub mod media;

pub use clients::{InteractionCall, StubFeedClient, StubInteractionClient};
pub use media::{MediaCall, RecordingMediaFactory};
