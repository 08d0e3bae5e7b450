//! Subcommand implementations.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use reelix_contracts::client::{FeedClient, InteractionClient};
use reelix_core::{
    AuthSession, CardView, ClientConfig, HeadlessMediaFactory, HttpApiClient,
    PageOutcome, ReactionSync, ShortsFeed, ViewabilityOutcome, ViewableToken,
};
use reelix_model::{AuthToken, FeedSort, ItemId};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long to let media events settle after each swipe.
const SETTLE: Duration = Duration::from_millis(50);

pub async fn feed(config: &ClientConfig, page: u32, sort: FeedSort) -> anyhow::Result<()> {
    let api = HttpApiClient::new(&config.api).context("failed to build api client")?;
    let items = api
        .fetch_shorts_page(page, config.feed.page_size, sort)
        .await
        .with_context(|| format!("failed to fetch page {page}"))?;

    if items.is_empty() {
        println!("page {page} is empty");
        return Ok(());
    }

    for item in &items {
        println!(
            "{:<24} {:<32} by {:<20} {:>6} likes {:>5} comments",
            item.id, item.title, item.author.display_name, item.like_count, item.comment_count
        );
    }
    if (items.len() as u32) < config.feed.page_size {
        println!("-- end of feed --");
    }
    Ok(())
}

pub async fn comments(config: &ClientConfig, item: &str, page: u32) -> anyhow::Result<()> {
    let api = HttpApiClient::new(&config.api).context("failed to build api client")?;
    let id = ItemId::new(item);
    let page = api
        .fetch_comments(&id, page, config.feed.comments_page_size)
        .await
        .with_context(|| format!("failed to fetch comments for {id}"))?;

    println!("page {} of {}", page.page, page.total_pages);
    for comment in &page.items {
        println!(
            "[{}] {}: {} ({} likes)",
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.author.display_name,
            comment.text,
            comment.like_count
        );
    }
    Ok(())
}

pub async fn simulate(
    config: ClientConfig,
    token: Option<String>,
    swipes: usize,
) -> anyhow::Result<()> {
    let api = Arc::new(HttpApiClient::new(&config.api).context("failed to build api client")?);
    let session = match token {
        Some(token) => AuthSession::signed_in(AuthToken::new(token)),
        None => AuthSession::new(),
    };
    let feed_client: Arc<dyn FeedClient> = api.clone();
    let interaction_client: Arc<dyn InteractionClient> = api;

    let mut shorts = ShortsFeed::new(
        config.feed,
        feed_client,
        interaction_client,
        Arc::new(HeadlessMediaFactory),
        session,
    );

    match shorts.load_first_page(Instant::now()).await {
        PageOutcome::Replaced { count } => info!(count, "first page loaded"),
        PageOutcome::Failed(err) => anyhow::bail!("first page failed: {err}"),
        other => anyhow::bail!("first page not applied: {other:?}"),
    }

    // The next page loads on its own task while swiping continues.
    let mut next_page: Option<JoinHandle<PageOutcome>> = None;
    let mut index = 0;
    for _ in 0..=swipes {
        if let Some(handle) = next_page.take_if(|handle| handle.is_finished()) {
            apply_next_page(&mut shorts, handle.await.context("page task failed")?).await;
        }
        let Some(item) = shorts.controller().item_at(index) else {
            break;
        };
        let ViewabilityOutcome {
            near_end,
            reaction_sync,
            ..
        } = shorts.on_viewable_items_changed(
            &[ViewableToken::new(item.id, index, 1.0)],
            Instant::now(),
        );
        if let Some(sync) = reaction_sync {
            seed_reaction(sync).await;
        }

        tokio::time::sleep(SETTLE).await;
        shorts.pump_media_events(Instant::now());

        if let Some(id) = shorts.active_id().cloned()
            && let Some(view) = shorts.card_view(&id, Instant::now())
        {
            print_card(index, &view);
        }

        if near_end
            && next_page.is_none()
            && let Some(pending) = shorts.begin_next_page()
        {
            next_page = Some(tokio::spawn(pending.run()));
        }

        for notice in shorts.drain_notices() {
            warn!(scope = ?notice.scope, kind = ?notice.kind, "{}", notice.message);
        }

        if index + 1 >= shorts.controller().len()
            && let Some(handle) = next_page.take()
        {
            apply_next_page(&mut shorts, handle.await.context("page task failed")?).await;
        }
        if index + 1 >= shorts.controller().len() {
            println!("-- end of feed --");
            break;
        }
        index += 1;
    }

    shorts.shutdown();
    Ok(())
}

async fn apply_next_page(shorts: &mut ShortsFeed, outcome: PageOutcome) {
    match &outcome {
        PageOutcome::Appended { added } => info!(added, "loaded next page"),
        PageOutcome::Failed(err) => warn!(error = %err, "next page failed"),
        _ => {}
    }
    if let Some(sync) = shorts.apply_page(&outcome, Instant::now()) {
        seed_reaction(sync).await;
    }
}

async fn seed_reaction(sync: ReactionSync) {
    let id = sync.item_id().clone();
    if let Err(err) = sync.run().await {
        warn!(item_id = %id, error = %err, "could not load reaction state");
    }
}

fn print_card(index: usize, view: &CardView) {
    let status = match &view.buffering_label {
        Some(label) => format!("{:?} ({label})", view.status),
        None => format!("{:?}", view.status),
    };
    println!(
        "#{index:<3} {:<24} {:<32} {:<20} {:<24} {:>6} likes{}",
        view.item_id,
        view.title,
        view.creator_name,
        status,
        view.like_count,
        if view.is_liked { " (liked)" } else { "" }
    );
}
