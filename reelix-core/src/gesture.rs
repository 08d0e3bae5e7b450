//! Single-tap / double-tap disambiguation for one card.
//!
//! A first tap arms a single-tap deadline one window away. A second tap inside
//! the window disarms it and reports a double tap instead, so the two effects
//! never both fire. Time is passed in explicitly; the host calls [`poll`] (or
//! the next [`on_tap`]) to fire an expired single tap.
//!
//! [`poll`]: GestureRouter::poll
//! [`on_tap`]: GestureRouter::on_tap

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Toggle play/pause.
    SingleTap,
    /// Like.
    DoubleTap,
}

#[derive(Debug, Clone)]
pub struct GestureRouter {
    window: Duration,
    last_tap: Option<Instant>,
    /// Deadline of the armed single tap.
    pending: Option<Instant>,
}

impl GestureRouter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_tap: None,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// When the armed single tap fires, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Register a tap at `now`. An armed single tap whose deadline already
    /// passed is flushed first.
    pub fn on_tap(&mut self, now: Instant) -> Vec<Gesture> {
        let mut fired = Vec::with_capacity(1);
        if let Some(gesture) = self.poll(now) {
            fired.push(gesture);
        }

        let is_double = self
            .last_tap
            .is_some_and(|last| now.saturating_duration_since(last) < self.window);

        if is_double {
            self.pending = None;
            self.last_tap = None;
            fired.push(Gesture::DoubleTap);
        } else {
            self.last_tap = Some(now);
            self.pending = Some(now + self.window);
        }
        fired
    }

    /// Fire the armed single tap if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Gesture> {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                Some(Gesture::SingleTap)
            }
            _ => None,
        }
    }

    /// Drop any armed tap, e.g. when the card scrolls away.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_tap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn quick_second_tap_is_a_double_tap_only() {
        let t0 = Instant::now();
        let mut router = GestureRouter::new(WINDOW);

        assert!(router.on_tap(t0).is_empty());
        assert_eq!(router.on_tap(t0 + ms(150)), vec![Gesture::DoubleTap]);
        assert_eq!(router.poll(t0 + ms(1_000)), None);
    }

    #[test]
    fn single_tap_fires_after_window() {
        let t0 = Instant::now();
        let mut router = GestureRouter::new(WINDOW);

        router.on_tap(t0);
        assert_eq!(router.poll(t0 + ms(299)), None);
        assert_eq!(router.poll(t0 + ms(300)), Some(Gesture::SingleTap));
        assert_eq!(router.poll(t0 + ms(400)), None);
    }

    #[test]
    fn slow_taps_are_two_single_taps() {
        let t0 = Instant::now();
        let mut router = GestureRouter::new(WINDOW);

        router.on_tap(t0);
        assert_eq!(router.on_tap(t0 + ms(500)), vec![Gesture::SingleTap]);
        assert_eq!(router.poll(t0 + ms(800)), Some(Gesture::SingleTap));
    }

    #[test]
    fn third_tap_after_double_starts_over() {
        let t0 = Instant::now();
        let mut router = GestureRouter::new(WINDOW);

        router.on_tap(t0);
        router.on_tap(t0 + ms(100));
        assert!(router.on_tap(t0 + ms(200)).is_empty());
        assert!(router.is_armed());
    }

    #[test]
    fn cancel_discards_pending_tap() {
        let t0 = Instant::now();
        let mut router = GestureRouter::new(WINDOW);
        router.on_tap(t0);
        router.cancel();
        assert_eq!(router.poll(t0 + ms(500)), None);
    }
}
