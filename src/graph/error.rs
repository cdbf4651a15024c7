//! Error taxonomy shared by the store, the index engine and the bulk loader

use super::types::{ElementId, ElementKind};
use thiserror::Error;

/// Which invariant an error reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, duplicate, unknown or wrongly shaped identifiers
    Identifier,
    /// Writes to `id` or (for edges) `label`
    ReservedProperty,
    /// Bulk loader scope rules
    Scope,
    /// Transaction open/commit discipline
    Transaction,
    /// Store capabilities and configuration values
    Configuration,
    /// Malformed arguments such as empty labels or keys
    Argument,
}

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("identifier error: an identifier is required")]
    MissingId,

    #[error("identifier error: vertex {0} already exists")]
    VertexAlreadyExists(ElementId),

    #[error("identifier error: edge {0} already exists")]
    EdgeAlreadyExists(ElementId),

    #[error("identifier error: vertex {0} not found")]
    VertexNotFound(ElementId),

    #[error("identifier error: edge {0} not found")]
    EdgeNotFound(ElementId),

    #[error("identifier error: expected a {expected} identifier, got {id}")]
    UnsupportedIdType { expected: &'static str, id: ElementId },

    #[error("reserved property: '{0}' cannot be used as a property key")]
    ReservedProperty(String),

    #[error("invalid argument: property key must not be empty")]
    EmptyPropertyKey,

    #[error("invalid argument: edge label must not be empty")]
    EmptyLabel,

    #[error("invalid argument: cannot encode value of type {type_name}: {reason}")]
    Serialization { type_name: String, reason: String },

    #[error("scope error: edge {0} is no longer in scope")]
    EdgeOutOfScope(ElementId),

    #[error("scope error: vertex {0} was not created by this loader")]
    ForeignVertex(ElementId),

    #[error("scope error: {0} is not supported during loading")]
    UnsupportedDuringLoading(&'static str),

    #[error("transaction error: a transaction is already open")]
    TransactionAlreadyOpen,

    #[error("transaction error: no transaction is open")]
    NoOpenTransaction,

    #[error("transaction error: loading can only conclude successfully")]
    RollbackNotSupported,

    #[error("transaction error: loading has already finished")]
    LoaderFinished,

    #[error("configuration error: {0} indices are not supported")]
    UnindexableKind(ElementKind),

    #[error("configuration error: index '{0}' already exists")]
    IndexAlreadyExists(String),

    #[error("configuration error: index '{name}' indexes {actual} elements, not {expected}")]
    IndexKindMismatch {
        name: String,
        expected: ElementKind,
        actual: ElementKind,
    },

    #[error("configuration error: self loops are not supported")]
    SelfLoopsNotSupported,

    #[error("configuration error: duplicate edges are not supported")]
    DuplicateEdgesNotSupported,

    #[error("configuration error: identifier space exhausted")]
    IdSpaceExhausted,

    #[error("configuration error: buffer size must be positive")]
    InvalidBufferSize,

    #[error("configuration error: {0}")]
    Config(String),
}

impl GraphError {
    /// Classify the error by the invariant it reports on
    pub fn kind(&self) -> ErrorKind {
        use GraphError::*;
        match self {
            MissingId
            | VertexAlreadyExists(_)
            | EdgeAlreadyExists(_)
            | VertexNotFound(_)
            | EdgeNotFound(_)
            | UnsupportedIdType { .. } => ErrorKind::Identifier,
            ReservedProperty(_) => ErrorKind::ReservedProperty,
            EmptyPropertyKey | EmptyLabel | Serialization { .. } => ErrorKind::Argument,
            EdgeOutOfScope(_) | ForeignVertex(_) | UnsupportedDuringLoading(_) => ErrorKind::Scope,
            TransactionAlreadyOpen | NoOpenTransaction | RollbackNotSupported | LoaderFinished => {
                ErrorKind::Transaction
            }
            UnindexableKind(_)
            | IndexAlreadyExists(_)
            | IndexKindMismatch { .. }
            | SelfLoopsNotSupported
            | DuplicateEdgesNotSupported
            | IdSpaceExhausted
            | InvalidBufferSize
            | Config(_) => ErrorKind::Configuration,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
