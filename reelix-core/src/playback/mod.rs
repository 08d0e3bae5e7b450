//! Single-active playback coordination.

mod buffering;
mod coordinator;
mod lease;
mod state;

pub use buffering::{BufferingLabel, classify_buffering};
pub use coordinator::{PlaybackCoordinator, RetentionWindow};
pub use lease::MediaLease;
pub use state::{PlaybackSnapshot, PlaybackState};
