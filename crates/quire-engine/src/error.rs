use quire_config::ConfigError;
use thiserror::Error;

use crate::catalog::BlockType;

/// Errors returned by the strict host-facing entry points.
///
/// Parsing never returns these; it recovers and records a [`Diagnostic`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A locally recovered problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("malformed input repaired: {detail}")]
    MalformedInput { detail: String },

    #[error("document was empty; inserted a default block")]
    EmptyDocument,

    #[error("unknown block type {name:?}; using wrapper")]
    UnknownBlockType { name: String },

    #[error("<{tag}> matches {chosen} and {others:?}; using {chosen}")]
    AmbiguousType {
        tag: String,
        chosen: BlockType,
        others: Vec<BlockType>,
    },

    #[error("offset {requested} is past the end; clamped to {clamped}")]
    OffsetOutOfRange { requested: usize, clamped: usize },
}

impl Diagnostic {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::warn!("malformed input repaired: {detail}");
        Diagnostic::MalformedInput { detail }
    }
}
