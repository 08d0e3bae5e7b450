//! Wire envelope and request bodies for the REST API.

use crate::reactions::ReactionKind;
use crate::moderation::{ReportReason, ReportTarget};

/// Standard response envelope: `{ status, data?, error?, message? }`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApiResponse<T> {
    pub status: String,
    // No `default` here: it would demand `T: Default`. A missing `Option`
    // field already decodes as `None`.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub data: Option<T>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub error: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error),
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionRequest {
    pub kind: ReactionKind,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostCommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportRequest {
    pub target_type: String,
    pub target_id: String,
    pub reason: ReportReason,
    pub details: String,
}

impl ReportRequest {
    pub fn new(
        target: &ReportTarget,
        reason: ReportReason,
        details: impl Into<String>,
    ) -> Self {
        Self {
            target_type: target.kind().to_string(),
            target_id: target.id().to_string(),
            reason,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockCreatorRequest {
    pub reason: String,
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::reactions::ReactionCounts;
    use serde::de::DeserializeOwned;

    fn decode<T: DeserializeOwned>(json: &str) -> ApiResponse<T> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn envelope_decodes_for_any_payload_type() {
        let ok: ApiResponse<ReactionCounts> =
            decode(r#"{"status":"success","data":{"likes":4,"dislikes":0}}"#);
        assert_eq!(ok.data, Some(ReactionCounts { likes: 4, dislikes: 0 }));

        let empty: ApiResponse<ReactionCounts> = decode(r#"{"status":"success"}"#);
        assert!(empty.data.is_none());
        assert!(empty.error.is_none());

        let failed: ApiResponse<ReactionCounts> =
            decode(r#"{"status":"error","error":"nope"}"#);
        assert_eq!(failed.error.as_deref(), Some("nope"));
    }
}
