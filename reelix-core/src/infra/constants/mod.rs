//! Constants module for centralized default values

pub mod routes;

pub mod feed {
    pub const PAGE_SIZE: u32 = 10;
    /// Start prefetching the next page this many items before the end.
    pub const LOAD_MORE_THRESHOLD: usize = 2;
}

pub mod viewability {
    /// Fraction of an item that must be on screen before it can become active.
    pub const VISIBLE_THRESHOLD: f32 = 0.80;
}

pub mod playback {
    pub const RETAIN_BEHIND: usize = 1;
    pub const RETAIN_AHEAD: usize = 1;
    /// After this long without playback the reload affordance appears and
    /// controls are forced visible.
    pub const STALL_WINDOW_MS: u64 = 12_000;

    pub mod buffering {
        /// Positions below this count as the initial load.
        pub const INITIAL_LOAD_POSITION_MS: u64 = 1_500;
        /// Buffered-ahead fraction of the duration below which playback is
        /// still considered to be warming up.
        pub const INITIAL_LOAD_BUFFER_FRACTION: f64 = 0.20;
        /// A stall with less than this buffered ahead reads as a reconnect.
        pub const RECONNECT_BUFFER_MS: u64 = 2_000;
    }
}

pub mod gestures {
    pub const DOUBLE_TAP_WINDOW_MS: u64 = 300;
    pub const HEART_BURST_MS: u64 = 800;
}

pub mod interaction {
    pub const CACHE_CAPACITY: usize = 32;
    /// Items further than this from the active one drop their interaction state.
    pub const RETAIN_DISTANCE: usize = 3;
    pub const COMMENTS_PAGE_SIZE: u32 = 20;
    pub const MAX_COMMENT_CHARS: usize = 500;
    pub const MAX_REPORT_DETAILS_CHARS: usize = 500;
}

pub mod api {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
    pub const REQUEST_TIMEOUT_MS: u64 = 30_000;
    pub const API_VERSION: &str = "v1";
}
