//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Node {child} is not a child of node {parent}")]
    NotAChild { parent: u32, child: u32 },

    #[error("Child index out of bounds: {index} (node has {len} children)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Attaching node {child} under node {parent} would create a cycle")]
    WouldCreateCycle { parent: u32, child: u32 },

    #[error("No root node set")]
    NoRoot,

    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid JSON tree: {0}")]
    InvalidJson(String),

    #[error("Maximum nesting depth exceeded: {current} > {max}")]
    MaxDepthExceeded { current: usize, max: usize },

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
