//! Error types for reconciliation

use thiserror::Error;

/// Errors raised by the identifier codec, the merge engine and the
/// reconciliation engine.
#[derive(Error, Debug)]
pub enum Error {
    /// An identifier component was empty or itself a path
    #[error("invalid identifier segment {segment:?}: {reason}")]
    InvalidSegment {
        segment: String,
        reason: &'static str,
    },

    /// A composite path did not have the expected shape
    #[error("malformed path {path:?}: expected {expected}")]
    MalformedPath { path: String, expected: String },

    /// A snapshot value did not match the declared attribute kind
    #[error("attribute {attribute}: expected {expected}, got {actual}")]
    SnapshotTypeMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// The remote resource does not exist
    #[error("{resource} {id:?} has not been found")]
    NotFound { resource: String, id: String },

    /// The semantic comparator was given a non-identifier value
    #[error("incomparable operand: expected {expected}, got {found}")]
    IncomparableOperand {
        expected: &'static str,
        found: &'static str,
    },

    /// An attribute name is not declared by the resource descriptor
    #[error("{resource} has no attribute named {name:?}")]
    UnknownAttribute { resource: String, name: String },

    /// A required attribute is missing from the declared configuration
    #[error("{resource}: attribute {name:?} is required")]
    MissingAttribute { resource: String, name: String },

    /// The REST collaborator failed
    #[error("remote request failed: {0}")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The remote answered with something the engine cannot use
    #[error("unexpected remote response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Wrap a collaborator error
    pub fn remote(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Remote(Box::new(err))
    }

    pub(crate) fn mismatch(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::SnapshotTypeMismatch {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether this error only affects a single attribute
    pub fn is_attribute_scoped(&self) -> bool {
        matches!(self, Self::SnapshotTypeMismatch { .. })
    }
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display_names_both_shapes() {
        let err = Error::mismatch("ports", "set of strings", "number");
        let msg = err.to_string();
        assert!(msg.contains("ports"));
        assert!(msg.contains("set of strings"));
        assert!(msg.contains("number"));
        assert!(err.is_attribute_scoped());
    }

    #[test]
    fn test_not_found_is_not_malformed() {
        let gone = Error::NotFound {
            resource: "node_breakout".to_string(),
            id: "F1/nodes/N1/breakouts/B1".to_string(),
        };
        assert!(matches!(gone, Error::NotFound { .. }));
        assert!(!gone.is_attribute_scoped());
        assert!(gone.to_string().contains("has not been found"));
    }

    #[test]
    fn test_remote_wraps_source() {
        let io = std::io::Error::other("connection reset");
        let err = Error::remote(io);
        assert!(err.to_string().contains("connection reset"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
