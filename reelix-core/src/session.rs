use std::sync::Arc;

use parking_lot::RwLock;
use reelix_model::AuthToken;

use crate::error::{FeedError, FeedResult};

/// Bearer token shared by every component that talks to authenticated
/// endpoints. Cleared as soon as the server answers 401.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    token: Arc<RwLock<Option<AuthToken>>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(token: AuthToken) -> Self {
        let session = Self::default();
        session.sign_in(token);
        session
    }

    pub fn sign_in(&self, token: AuthToken) {
        *self.token.write() = Some(token);
    }

    pub fn sign_out(&self) {
        if self.token.write().take().is_some() {
            tracing::info!("session cleared");
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.read().is_some()
    }

    /// Current token, or `AuthRequired` when signed out.
    pub fn token(&self) -> FeedResult<AuthToken> {
        self.token.read().clone().ok_or(FeedError::AuthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_token() {
        let session = AuthSession::new();
        let other = session.clone();
        assert_eq!(other.token(), Err(FeedError::AuthRequired));

        session.sign_in(AuthToken::new("abc"));
        assert_eq!(other.token().unwrap().access_token, "abc");

        other.sign_out();
        assert!(!session.is_signed_in());
    }
}
