use reelix_contracts::client::ClientError;
use reelix_contracts::media::MediaFault;
use thiserror::Error;

/// Failure taxonomy for the feed engine.
///
/// Nothing here is fatal: every variant is scoped to one page, one item or one
/// interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// No connectivity or the request timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered 401; the user has to sign in again.
    #[error("Sign in required")]
    AuthRequired,

    /// 5xx, unexpected status or an undecodable payload.
    #[error("Server error: {0}")]
    Server(String),

    /// Decoder or stream failure for a single item.
    #[error("Playback error: {0}")]
    Playback(String),

    /// Rejected client-side before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl FeedError {
    /// Whether offering a retry makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FeedError::Network(_) | FeedError::Server(_) | FeedError::Playback(_)
        )
    }

    pub fn requires_sign_in(&self) -> bool {
        matches!(self, FeedError::AuthRequired)
    }
}

impl From<ClientError> for FeedError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(msg) => FeedError::Network(msg),
            ClientError::Unauthorized => FeedError::AuthRequired,
            ClientError::Server { status, message } => match status {
                Some(code) => FeedError::Server(format!("{code}: {message}")),
                None => FeedError::Server(message),
            },
            ClientError::InvalidPayload(msg) => {
                FeedError::Server(format!("invalid payload: {msg}"))
            }
            ClientError::Cancelled => {
                FeedError::Network("request cancelled".to_string())
            }
        }
    }
}

impl From<MediaFault> for FeedError {
    fn from(fault: MediaFault) -> Self {
        FeedError::Playback(fault.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
