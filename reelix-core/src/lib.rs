//! Reelix core: the short-form video feed engine.
//!
//! A full-screen, one-at-a-time feed where exactly one paginated item is live
//! at any moment. The pieces, leaves first:
//!
//! - [`feed::FeedController`] owns the paginated collection.
//! - [`viewability::ViewabilityTracker`] turns viewability batches into a
//!   single active item.
//! - [`playback::PlaybackCoordinator`] owns every media resource and enforces
//!   the single-playing-item invariant.
//! - [`gesture::GestureRouter`] separates single taps from double taps.
//! - [`interaction::InteractionStore`] applies likes and comments
//!   optimistically and reconciles them with the server.
//! - [`shorts::ShortsFeed`] wires everything together behind one surface.
#![allow(missing_docs)]

pub mod card;
pub mod config;
pub mod error;
pub mod feed;
pub mod gesture;
pub mod infra;
pub mod interaction;
pub mod moderation;
pub mod notices;
pub mod playback;
pub mod session;
pub mod shorts;
pub mod viewability;

pub use card::{Card, CardCommand, CardView};
pub use config::{ClientConfig, ConfigLoader, FeedConfig};
pub use error::{FeedError, FeedResult};
pub use feed::{FeedController, PageOutcome, PageState, PendingPage};
pub use gesture::{Gesture, GestureRouter};
pub use infra::{HeadlessMediaFactory, HttpApiClient};
pub use interaction::{InteractionState, InteractionStore, LikeOutcome, PendingLike, ReactionSync};
pub use notices::{Notice, NoticeKind, NoticeScope};
pub use playback::{BufferingLabel, PlaybackCoordinator, PlaybackSnapshot, PlaybackState};
pub use session::AuthSession;
pub use shorts::{ShortsFeed, TapOutcome, ViewabilityOutcome};
pub use viewability::{ViewabilityTracker, ViewableToken};
