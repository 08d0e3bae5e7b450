#[path = "support/mod.rs"]
mod support;

use std::time::Duration;

use reelix_contracts::{
    client::{ClientError, MockFeedClient},
    media::MediaStatus,
};
use reelix_core::{
    CardCommand, FeedController, LikeOutcome, NoticeKind, PageOutcome, PlaybackState, ShortsFeed,
    infra::testing::{InteractionCall, MediaCall, StubInteractionClient, fixtures},
};
use reelix_model::{FeedSort, ReactionKind};
use std::sync::Arc;
use support::{catalog, full, id, rig, token};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn first_page_activates_the_first_item() {
    let mut r = rig(catalog(5), 3);
    assert_eq!(r.feed.load_first_page(r.t0).await, PageOutcome::Replaced { count: 3 });

    assert_eq!(r.feed.active_id(), Some(&id(1)));
    assert_eq!(r.feed.should_play_count(), 1);
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Loading);
    assert!(r.media.playing().contains(&id(1)));
}

#[tokio::test]
async fn at_most_one_item_ever_plays_while_swiping() {
    let mut r = rig(catalog(8), 8);
    r.feed.load_first_page(r.t0).await;

    for index in [1, 2, 3, 2, 5, 6, 7, 0] {
        r.feed.on_viewable_items_changed(&full(index), r.t0);
        r.media.emit_ready(&id(index as u32 + 1));
        r.feed.pump_media_events(r.t0);
        assert!(r.feed.should_play_count() <= 1);
        assert!(r.media.playing().len() <= 1);
    }
    assert_eq!(r.media.max_concurrent_playing(), 1);
}

#[tokio::test]
async fn switching_pauses_the_previous_item_first() {
    let mut r = rig(catalog(3), 3);
    r.feed.load_first_page(r.t0).await;
    r.media.clear_calls();

    r.feed.on_viewable_items_changed(&full(1), r.t0);

    let calls = r.media.calls();
    let paused = calls.iter().position(|c| c == &MediaCall::Pause(id(1))).unwrap();
    let played = calls.iter().position(|c| c == &MediaCall::Play(id(2))).unwrap();
    assert!(paused < played);
}

#[tokio::test]
async fn reporting_the_same_item_twice_changes_nothing() {
    let mut r = rig(catalog(3), 3);
    r.feed.load_first_page(r.t0).await;
    let first = r.feed.on_viewable_items_changed(&full(1), r.t0);
    assert_eq!(first.activated, Some(id(2)));

    let calls = r.media.calls();
    let snapshot = r.feed.playback_snapshot(&id(2));
    let second = r.feed.on_viewable_items_changed(&full(1), r.t0);

    assert_eq!(second.activated, None);
    assert_eq!(r.media.calls(), calls);
    assert_eq!(r.feed.playback_snapshot(&id(2)), snapshot);
}

#[tokio::test]
async fn mid_scroll_batch_selects_the_item_meeting_the_threshold() {
    let mut r = rig(catalog(3), 3);
    r.feed.load_first_page(r.t0).await;
    r.feed.on_viewable_items_changed(&full(0), r.t0);

    let outcome = r
        .feed
        .on_viewable_items_changed(&[token(0, 0.30), token(1, 0.85)], r.t0);
    assert_eq!(outcome.activated, Some(id(2)));
    assert_eq!(r.feed.active_id(), Some(&id(2)));
}

#[tokio::test]
async fn stale_buffering_event_from_previous_item_is_ignored() {
    let mut r = rig(catalog(3), 3);
    r.feed.load_first_page(r.t0).await;
    r.media.emit_ready(&id(1));
    r.feed.pump_media_events(r.t0);
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Playing);

    r.feed.on_viewable_items_changed(&full(1), r.t0);
    r.media.emit(&id(1), MediaStatus::LoadStart);
    assert_eq!(r.feed.pump_media_events(r.t0), 0);
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Paused);
}

#[tokio::test]
async fn double_tap_within_window_likes_without_toggling() {
    let mut r = rig(catalog(2), 2);
    r.feed.load_first_page(r.t0).await;
    r.media.emit_ready(&id(1));
    r.feed.pump_media_events(r.t0);

    assert!(r.feed.tap(&id(1), r.t0).unwrap().commands.is_empty());
    let second = r.feed.tap(&id(1), r.t0 + ms(150)).unwrap();
    assert_eq!(second.commands, vec![CardCommand::Like]);
    assert!(r.feed.interaction_state(&id(1)).unwrap().is_liked);
    let like = second.like.expect("double tap starts a like");
    assert!(matches!(like.settle().await, LikeOutcome::Committed(_)));
    assert!(r.feed.tick(r.t0 + ms(1_000)).is_empty());

    let reactions: Vec<_> = r
        .api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, InteractionCall::PostReaction(..)))
        .collect();
    assert_eq!(reactions, vec![InteractionCall::PostReaction(id(1), ReactionKind::Like)]);
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Playing);
    assert!(r.feed.card_view(&id(1), r.t0 + ms(200)).unwrap().heart_burst);
}

#[tokio::test]
async fn taps_further_apart_than_the_window_are_two_toggles() {
    let mut r = rig(catalog(2), 2);
    r.feed.load_first_page(r.t0).await;
    r.media.emit_ready(&id(1));
    r.feed.pump_media_events(r.t0);

    // First tap's timer fires before the second tap lands.
    r.feed.tap(&id(1), r.t0).unwrap();
    let fired = r.feed.tick(r.t0 + ms(300));
    assert_eq!(fired, vec![(id(1), CardCommand::TogglePlayback)]);
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Paused);

    assert!(r.feed.tap(&id(1), r.t0 + ms(500)).unwrap().commands.is_empty());
    assert_eq!(
        r.feed.tick(r.t0 + ms(800)),
        vec![(id(1), CardCommand::TogglePlayback)]
    );
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Playing);
    assert!(
        r.api
            .calls()
            .iter()
            .all(|call| !matches!(call, InteractionCall::PostReaction(..)))
    );
}

#[tokio::test]
async fn next_page_after_end_makes_no_request() {
    let mut client = MockFeedClient::new();
    client
        .expect_fetch_shorts_page()
        .times(1)
        .returning(|_, _, _| Ok(fixtures::feed_items(1, 2)));

    let feed = FeedController::new(Arc::new(client), 5, FeedSort::Latest);
    feed.load_first_page().await;
    let before = feed.snapshot();
    assert!(!before.has_more);

    assert_eq!(feed.load_next_page().await, PageOutcome::Skipped);
    assert_eq!(feed.snapshot().items, before.items);
}

#[tokio::test]
async fn near_end_triggers_load_more() {
    let mut r = rig(catalog(10), 5);
    r.feed.load_first_page(r.t0).await;

    assert!(!r.feed.on_viewable_items_changed(&full(1), r.t0).near_end);
    let outcome = r.feed.on_viewable_items_changed(&full(3), r.t0);
    assert!(outcome.near_end);

    assert_eq!(r.feed.load_next_page(r.t0).await, PageOutcome::Appended { added: 5 });
    assert_eq!(r.feed.page_state().items.len(), 10);
}

#[tokio::test]
async fn failed_like_rolls_back_exactly() {
    let mut r = rig(catalog(2), 2);
    r.feed.load_first_page(r.t0).await;
    let before = r.feed.interaction_state(&id(1)).unwrap();

    r.api.fail_next(ClientError::Network("offline".into()));
    let outcome = r.feed.like(&id(1)).await.unwrap();
    assert!(matches!(outcome, LikeOutcome::RolledBack { .. }));

    let after = r.feed.interaction_state(&id(1)).unwrap();
    assert_eq!(after.is_liked, before.is_liked);
    assert_eq!(after.like_count, before.like_count);
    assert_eq!(r.feed.drain_notices()[0].kind, NoticeKind::Transient);
    // Playback is untouched by the failure.
    assert_eq!(r.feed.should_play_count(), 1);
}

#[tokio::test]
async fn page_failure_keeps_items_and_offers_retry() {
    let mut r = rig(catalog(6), 3);
    r.feed.load_first_page(r.t0).await;

    r.pages.fail_next(ClientError::Server {
        status: Some(502),
        message: "bad gateway".into(),
    });
    assert!(matches!(r.feed.load_next_page(r.t0).await, PageOutcome::Failed(_)));
    assert_eq!(r.feed.page_state().items.len(), 3);
    assert_eq!(r.feed.drain_notices()[0].kind, NoticeKind::Retry);

    assert_eq!(r.feed.retry(r.t0).await, PageOutcome::Appended { added: 3 });
    assert_eq!(r.feed.active_id(), Some(&id(1)));
}

#[tokio::test]
async fn refresh_keeps_surviving_active_item() {
    let mut r = rig(catalog(4), 4);
    r.feed.load_first_page(r.t0).await;
    r.feed.on_viewable_items_changed(&full(2), r.t0);

    r.pages.set_catalog(vec![
        fixtures::feed_item(9),
        fixtures::feed_item(3),
        fixtures::feed_item(4),
    ]);
    r.feed.refresh(r.t0).await;
    assert_eq!(r.feed.active_id(), Some(&id(3)));
    assert!(r.feed.instantiated_media().iter().all(|m| *m != id(1)));
}

#[tokio::test]
async fn refresh_falls_back_to_first_item_when_active_is_gone() {
    let mut r = rig(catalog(4), 4);
    r.feed.load_first_page(r.t0).await;
    r.feed.on_viewable_items_changed(&full(1), r.t0);

    r.pages.set_catalog(fixtures::feed_items(20, 3));
    r.feed.refresh(r.t0).await;

    assert_eq!(r.feed.active_id(), Some(&id(20)));
    assert!(r.media.calls_for(&id(2)).contains(&MediaCall::Unload(id(2))));
    assert!(r.feed.interaction_state(&id(2)).is_none());
}

#[tokio::test]
async fn errored_item_reloads_with_a_fresh_instance() {
    let mut r = rig(catalog(2), 2);
    r.feed.load_first_page(r.t0).await;
    r.media.emit(&id(1), MediaStatus::Error("decode".into()));
    r.feed.pump_media_events(r.t0);

    let view = r.feed.card_view(&id(1), r.t0).unwrap();
    assert!(view.show_reload);

    assert!(r.feed.reload(&id(1), r.t0));
    let creates = r
        .media
        .calls_for(&id(1))
        .into_iter()
        .filter(|call| matches!(call, MediaCall::Create { .. }))
        .count();
    assert_eq!(creates, 2);
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Loading);
}

#[tokio::test]
async fn blocking_a_creator_removes_their_items_and_media() {
    let mut r = rig(
        vec![
            fixtures::feed_item_by(1, 1),
            fixtures::feed_item_by(2, 2),
            fixtures::feed_item_by(3, 1),
        ],
        3,
    );
    r.feed.load_first_page(r.t0).await;

    let removed = r
        .feed
        .block_creator(&fixtures::creator(1).id, "spam", r.t0)
        .await
        .unwrap();
    assert_eq!(removed, vec![id(1), id(3)]);
    assert_eq!(r.feed.active_id(), Some(&id(2)));
    assert!(r.media.calls_for(&id(1)).contains(&MediaCall::Unload(id(1))));
}

#[tokio::test]
async fn shutdown_releases_everything() {
    let mut r = rig(catalog(3), 3);
    r.feed.load_first_page(r.t0).await;
    r.feed.on_viewable_items_changed(&full(1), r.t0);

    r.feed.shutdown();
    assert!(r.feed.instantiated_media().is_empty());
    assert!(r.media.playing().is_empty());
    assert_eq!(r.feed.should_play_count(), 0);
}

#[tokio::test]
async fn background_and_foreground_respect_user_pause() {
    let mut r = rig(catalog(1), 1);
    r.feed.load_first_page(r.t0).await;
    r.media.emit_ready(&id(1));
    r.feed.pump_media_events(r.t0);

    r.feed.suspend();
    assert!(r.media.playing().is_empty());
    r.feed.resume(r.t0);
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Playing);

    r.feed.tap(&id(1), r.t0).unwrap();
    r.feed.tick(r.t0 + ms(400));
    r.feed.suspend();
    r.feed.resume(r.t0 + ms(500));
    assert_eq!(r.feed.playback_state(&id(1)), PlaybackState::Paused);
}

#[tokio::test]
async fn headless_feed_reaches_playing() {
    let media = reelix_core::HeadlessMediaFactory::new();
    let mut feed = ShortsFeed::new(
        support::config(3),
        Arc::new(reelix_core::infra::testing::StubFeedClient::with_catalog(catalog(3))),
        Arc::new(StubInteractionClient::new()),
        Arc::new(media),
        reelix_core::AuthSession::new(),
    );
    let now = std::time::Instant::now();
    feed.load_first_page(now).await;
    feed.pump_media_events(now);
    assert_eq!(feed.playback_state(&id(1)), PlaybackState::Playing);
}

#[tokio::test]
async fn swiping_away_during_a_slow_like_leaves_it_stale() {
    let mut r = rig(catalog(8), 8);
    r.feed.load_first_page(r.t0).await;
    r.api.set_delay(ms(200));

    let pending = r.feed.start_like(&id(1)).unwrap().expect("nothing in flight");
    let like = tokio::spawn(pending.settle());
    while !r.api.calls().contains(&InteractionCall::PostReaction(id(1), ReactionKind::Like)) {
        tokio::task::yield_now().await;
    }

    // The feed keeps taking input while the request is out.
    for index in 1..=5 {
        r.feed.on_viewable_items_changed(&full(index), r.t0);
    }
    assert_eq!(r.feed.active_id(), Some(&id(6)));
    assert!(r.feed.interaction_state(&id(1)).is_none());

    assert_eq!(like.await.unwrap(), LikeOutcome::Stale);
    assert!(r.feed.drain_notices().is_empty());
}

#[tokio::test]
async fn page_fetch_runs_while_the_feed_keeps_scrolling() {
    let mut r = rig(catalog(6), 3);
    r.feed.load_first_page(r.t0).await;
    r.pages.set_delay(ms(50));

    let pending = r.feed.begin_next_page().expect("more pages");
    assert!(r.feed.begin_next_page().is_none());
    let fetch = tokio::spawn(pending.run());

    r.feed.on_viewable_items_changed(&full(1), r.t0);
    r.feed.on_viewable_items_changed(&full(2), r.t0);
    assert_eq!(r.feed.active_id(), Some(&id(3)));

    let outcome = fetch.await.unwrap();
    assert_eq!(outcome, PageOutcome::Appended { added: 3 });
    assert!(r.feed.apply_page(&outcome, r.t0).is_none());
    assert_eq!(r.feed.page_state().items.len(), 6);
    assert_eq!(r.feed.active_id(), Some(&id(3)));
}

#[tokio::test]
async fn double_tap_on_an_item_already_liked_sends_nothing() {
    let mut r = rig(catalog(3), 3);
    r.api.seed_likes(&id(2), 40, true);
    r.feed.load_first_page(r.t0).await;

    let outcome = r.feed.on_viewable_items_changed(&full(1), r.t0);
    let sync = outcome.reaction_sync.expect("item 2 is not seeded yet");
    assert_eq!(sync.item_id(), &id(2));
    assert_eq!(sync.run().await, Ok(Some(true)));
    assert!(r.feed.interaction_state(&id(2)).unwrap().is_liked);

    r.feed.tap(&id(2), r.t0).unwrap();
    let tap = r.feed.tap(&id(2), r.t0 + ms(150)).unwrap();
    assert!(tap.commands.is_empty());
    assert!(tap.like.is_none());
    assert!(
        r.api
            .calls()
            .iter()
            .all(|call| !matches!(call, InteractionCall::PostReaction(..)))
    );
    assert!(r.feed.card_view(&id(2), r.t0 + ms(160)).unwrap().heart_burst);
}

#[tokio::test]
async fn first_page_seeds_the_active_item_when_signed_in() {
    let mut r = rig(catalog(2), 2);
    r.api.seed_likes(&id(1), 5, true);
    r.feed.load_first_page(r.t0).await;

    assert!(r.feed.interaction_state(&id(1)).unwrap().is_liked);
    assert_eq!(
        r.api.calls(),
        vec![InteractionCall::FetchReactionState(id(1))]
    );
}
