//! Paginated feed collection.

mod controller;
mod state;

pub use controller::{FeedController, PageOutcome, PageRequest, PageRequestKind, PendingPage};
pub use state::PageState;
