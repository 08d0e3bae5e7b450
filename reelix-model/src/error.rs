use std::fmt::{self, Display};

/// Errors produced by model constructors and parsing routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownSort(String),
    UnknownReportReason(String),
    UnknownReactionKind(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownSort(raw) => {
                write!(f, "unknown feed sort: {raw}")
            }
            ModelError::UnknownReportReason(raw) => {
                write!(f, "unknown report reason: {raw}")
            }
            ModelError::UnknownReactionKind(raw) => {
                write!(f, "unknown reaction kind: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
