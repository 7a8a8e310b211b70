//! Error types for facade operations

use dom::DomError;
use thiserror::Error;

use crate::config::MissingChildKind;

pub type Result<T> = std::result::Result<T, ObjectifyError>;

#[derive(Debug, Error)]
pub enum ObjectifyError {
    /// Attribute-style navigation found no matching child
    #[error("{kind}: {name}")]
    MissingChild { kind: MissingChildKind, name: String },

    #[error("Index out of range: {index} (group has {len} members)")]
    OutOfRange { index: isize, len: usize },

    #[error("Cannot modify structural member '{member}'")]
    ForbiddenMutation { member: String },

    #[error("Invalid value for '{member}': expected {expected}")]
    InvalidValue {
        member: String,
        expected: &'static str,
    },

    #[error("Parent facade wraps a different tree")]
    ForeignTree,

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

impl ObjectifyError {
    pub fn is_missing_child(&self) -> bool {
        matches!(self, ObjectifyError::MissingChild { .. })
    }

    /// Name carried by a missing-child error
    pub fn missing_name(&self) -> Option<&str> {
        match self {
            ObjectifyError::MissingChild { name, .. } => Some(name),
            _ => None,
        }
    }
}
