use crate::error::ModelError;
use crate::ids::{CommentId, ItemId};
use std::str::FromStr;

/// Content a report is filed against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportTarget {
    Item(ItemId),
    Comment(CommentId),
}

impl ReportTarget {
    /// Discriminator sent as `target_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportTarget::Item(_) => "video",
            ReportTarget::Comment(_) => "comment",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ReportTarget::Item(id) => id.as_str(),
            ReportTarget::Comment(id) => id.as_str(),
        }
    }
}

/// Reason code attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReportReason {
    Spam,
    Harassment,
    HateSpeech,
    Violence,
    SexualContent,
    Misinformation,
    Other,
}

impl ReportReason {
    pub const ALL: [Self; 7] = [
        Self::Spam,
        Self::Harassment,
        Self::HateSpeech,
        Self::Violence,
        Self::SexualContent,
        Self::Misinformation,
        Self::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ReportReason::Spam => "spam",
            ReportReason::Harassment => "harassment",
            ReportReason::HateSpeech => "hate_speech",
            ReportReason::Violence => "violence",
            ReportReason::SexualContent => "sexual_content",
            ReportReason::Misinformation => "misinformation",
            ReportReason::Other => "other",
        }
    }

    /// `Other` is meaningless without an explanation.
    pub fn requires_details(self) -> bool {
        matches!(self, ReportReason::Other)
    }
}

impl FromStr for ReportReason {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reason| reason.code() == s)
            .ok_or_else(|| ModelError::UnknownReportReason(s.to_string()))
    }
}
