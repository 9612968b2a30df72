// This module defines the error type for opcompat using the thiserror crate. CompatError
// covers the lookup and conversion failures of the compatibility layer: an operation whose
// dialect-stripped name is empty, an element type with no backend counterpart, an array
// attribute whose element kind the backend cannot represent, an attribute kind the converter
// does not know, an operator with no registered fusion pattern, and malformed textual IR.
// These are registration defects rather than data errors: callers are expected to surface
// them and stop, never to retry. CompatResult<T> is the alias for Result<T, CompatError>.

//! Error types for the compatibility layer.

use thiserror::Error;

/// Main error type for op conversion and lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompatError {
    #[error("Found empty canonical name for {op}, an op pattern is probably missing")]
    EmptyCanonicalName {
        op: String,
    },

    #[error("Unknown IR type {ty}")]
    UnmappedType {
        ty: String,
    },

    #[error("Only bool/int32/int64/float/double elements are supported in array attributes, got {kind}")]
    UnsupportedArrayElement {
        kind: String,
    },

    #[error("Unknown attribute: {attr}")]
    UnknownAttribute {
        attr: String,
    },

    #[error("No OpPattern registered for {op}")]
    MissingPattern {
        op: String,
    },

    #[error("Parse error at offset {pos}: {reason}")]
    Parse {
        pos: usize,
        reason: String,
    },
}

/// Result type alias for compatibility operations.
pub type CompatResult<T> = Result<T, CompatError>;
