//! Per-item card: gesture routing and the render-ready view.

use std::time::{Duration, Instant};

use reelix_model::{FeedItem, ItemId};
use url::Url;

use crate::{
    gesture::{Gesture, GestureRouter},
    interaction::InteractionState,
    playback::{BufferingLabel, PlaybackSnapshot, PlaybackState},
};

/// What a gesture asks the feed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardCommand {
    TogglePlayback,
    Like,
}

/// Everything the host needs to draw one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub item_id: ItemId,
    pub title: String,
    pub creator_name: String,
    pub status: PlaybackState,
    pub buffering_label: Option<BufferingLabel>,
    pub show_spinner: bool,
    pub show_reload: bool,
    pub controls_visible: bool,
    pub show_poster: bool,
    pub poster_url: Option<Url>,
    pub heart_burst: bool,
    pub like_count: u64,
    pub is_liked: bool,
    pub like_pending: bool,
    pub comment_count: u64,
    pub muted: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Card {
    item: FeedItem,
    gestures: GestureRouter,
    heart_burst: Duration,
    heart_until: Option<Instant>,
    stall_window: Duration,
}

impl Card {
    pub fn new(
        item: FeedItem,
        double_tap_window: Duration,
        heart_burst: Duration,
        stall_window: Duration,
    ) -> Self {
        Self {
            item,
            gestures: GestureRouter::new(double_tap_window),
            heart_burst,
            heart_until: None,
            stall_window,
        }
    }

    pub fn item(&self) -> &FeedItem {
        &self.item
    }

    pub fn id(&self) -> &ItemId {
        &self.item.id
    }

    /// Route a tap. A double tap shows the heart burst and likes the item
    /// unless it is already liked.
    pub fn on_tap(&mut self, now: Instant, is_liked: bool) -> Vec<CardCommand> {
        let mut commands = Vec::new();
        for gesture in self.gestures.on_tap(now) {
            match gesture {
                Gesture::SingleTap => commands.push(CardCommand::TogglePlayback),
                Gesture::DoubleTap => {
                    self.heart_until = Some(now + self.heart_burst);
                    if !is_liked {
                        commands.push(CardCommand::Like);
                    }
                }
            }
        }
        commands
    }

    /// Fire an expired single tap and let the heart burst run out.
    pub fn tick(&mut self, now: Instant) -> Vec<CardCommand> {
        if self.heart_until.is_some_and(|until| now >= until) {
            self.heart_until = None;
        }
        match self.gestures.poll(now) {
            Some(Gesture::SingleTap) => vec![CardCommand::TogglePlayback],
            _ => Vec::new(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.gestures.next_deadline(), self.heart_until) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// The card scrolled away: pending taps and the burst no longer apply.
    pub fn on_hidden(&mut self) {
        self.gestures.cancel();
        self.heart_until = None;
    }

    pub fn view(
        &self,
        now: Instant,
        playback: &PlaybackSnapshot,
        interaction: Option<&InteractionState>,
    ) -> CardView {
        let stalled_out = playback
            .stalled_for(now)
            .is_some_and(|stalled| stalled >= self.stall_window);
        let errored = playback.state.is_errored();
        let waiting = playback.state.is_waiting();

        let error_message = match &playback.state {
            PlaybackState::Errored(reason) => Some(reason.clone()),
            _ => None,
        };

        let (like_count, is_liked, like_pending, comment_count) = match interaction {
            Some(state) => (
                state.like_count,
                state.is_liked,
                state.is_loading_reaction,
                state.comment_count,
            ),
            None => (self.item.like_count, false, false, self.item.comment_count),
        };

        CardView {
            item_id: self.item.id.clone(),
            title: self.item.title.clone(),
            creator_name: self.item.author.display_name.clone(),
            status: playback.state.clone(),
            buffering_label: if waiting { playback.buffering_label } else { None },
            show_spinner: waiting && !stalled_out,
            show_reload: errored || (waiting && stalled_out),
            controls_visible: errored
                || stalled_out
                || (playback.state == PlaybackState::Paused && playback.user_paused),
            show_poster: playback.state != PlaybackState::Playing,
            poster_url: self.item.thumbnail_url.clone(),
            heart_burst: self.heart_until.is_some_and(|until| now < until),
            like_count,
            is_liked,
            like_pending,
            comment_count,
            muted: playback.muted,
            error_message,
        }
    }
}
