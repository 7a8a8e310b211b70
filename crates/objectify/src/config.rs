//! Facade configuration

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ObjectifyError;

/// Error kind raised when a named child does not exist
///
/// Set once on a root and inherited by every node navigated from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingChildKind {
    #[default]
    NoSuchAttribute,
    NoSuchKey,
    /// Caller-defined label, reported verbatim
    Custom(String),
}

impl MissingChildKind {
    /// Build the error for a failed lookup of `name`
    pub fn error(&self, name: &str) -> ObjectifyError {
        ObjectifyError::MissingChild {
            kind: self.clone(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for MissingChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingChildKind::NoSuchAttribute => write!(f, "no such child"),
            MissingChildKind::NoSuchKey => write!(f, "no such key"),
            MissingChildKind::Custom(label) => write!(f, "{}", label),
        }
    }
}

/// Root facade configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectifyConfig {
    #[serde(default)]
    pub missing_child: MissingChildKind,
}
