//! Reporting content and blocking creators.

use std::sync::Arc;

use reelix_contracts::client::InteractionClient;
use reelix_model::{CreatorId, ReportReason, ReportTarget};

use crate::{
    error::{FeedError, FeedResult},
    infra::constants::interaction::MAX_REPORT_DETAILS_CHARS,
    notices::{Notice, NoticeBoard, NoticeScope},
    session::AuthSession,
};

#[derive(Clone)]
pub struct ModerationService {
    client: Arc<dyn InteractionClient>,
    session: AuthSession,
    notices: NoticeBoard,
}

impl std::fmt::Debug for ModerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationService")
            .field("signed_in", &self.session.is_signed_in())
            .finish()
    }
}

fn scope_of(target: &ReportTarget) -> NoticeScope {
    match target {
        ReportTarget::Item(id) => NoticeScope::Item(id.clone()),
        ReportTarget::Comment(id) => NoticeScope::Comment(id.clone()),
    }
}

/// Client-side checks for a report's free text.
pub fn validate_report(reason: ReportReason, free_text: &str) -> FeedResult<&str> {
    let details = free_text.trim();
    if reason.requires_details() && details.is_empty() {
        return Err(FeedError::Validation(format!(
            "reason '{}' needs a description",
            reason.code()
        )));
    }
    if details.chars().count() > MAX_REPORT_DETAILS_CHARS {
        return Err(FeedError::Validation(format!(
            "details exceed {MAX_REPORT_DETAILS_CHARS} characters"
        )));
    }
    Ok(details)
}

impl ModerationService {
    pub fn new(
        client: Arc<dyn InteractionClient>,
        session: AuthSession,
        notices: NoticeBoard,
    ) -> Self {
        Self {
            client,
            session,
            notices,
        }
    }

    pub async fn report(
        &self,
        target: &ReportTarget,
        reason: ReportReason,
        free_text: &str,
    ) -> FeedResult<()> {
        let details = validate_report(reason, free_text)?;
        let scope = scope_of(target);
        let token = self.token(scope.clone())?;

        let result = self
            .client
            .report_content(target, reason, details, &token)
            .await
            .map_err(FeedError::from);

        match result {
            Ok(()) => {
                tracing::info!(report_target = ?target, reason = reason.code(), "content reported");
                Ok(())
            }
            Err(err) => {
                self.fail(scope, &err);
                Err(err)
            }
        }
    }

    /// Block a creator server-side. Removing their items is up to the caller.
    pub async fn block_creator(&self, creator_id: &CreatorId, reason: &str) -> FeedResult<()> {
        let scope = NoticeScope::Creator(creator_id.clone());
        let token = self.token(scope.clone())?;

        let result = self
            .client
            .block_creator(creator_id, reason.trim(), &token)
            .await
            .map_err(FeedError::from);

        match result {
            Ok(()) => {
                tracing::info!(creator_id = %creator_id, "creator blocked");
                Ok(())
            }
            Err(err) => {
                self.fail(scope, &err);
                Err(err)
            }
        }
    }

    fn token(&self, scope: NoticeScope) -> FeedResult<reelix_model::AuthToken> {
        self.session.token().inspect_err(|err| {
            self.notices.push(Notice::interaction(scope, err));
        })
    }

    fn fail(&self, scope: NoticeScope, err: &FeedError) {
        tracing::warn!(scope = ?scope, error = %err, "moderation request failed");
        if err.requires_sign_in() {
            self.session.sign_out();
        }
        self.notices.push(Notice::interaction(scope, err));
    }
}
