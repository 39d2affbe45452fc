//! # Rendering Error Types
//!
//! All errors that can occur in the batching subsystem.
//!
//! Recoverable conditions (allocation failure, caller contract
//! violations detected at a safe boundary) are returned as values.
//! Resource misuse that would otherwise render silently wrong
//! (recording before attribute locations are assigned, reading a
//! buffer that was never uploaded) panics instead.

use thiserror::Error;

/// Errors that can occur in the batching subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Staging memory reservation failed while growing a buffer.
    ///
    /// The buffer's prior contents and counters are unchanged; the
    /// caller may retry with a smaller request or abort.
    #[error("allocation failed: could not reserve {requested_elements} elements")]
    Allocation {
        /// The total element capacity that was requested.
        requested_elements: usize,
    },

    /// An instance was pushed to a sub-mesh index that does not exist.
    #[error("mesh index out of range: {index} >= {count}")]
    MeshIndexOutOfRange {
        /// The offending sub-mesh index.
        index: usize,
        /// The number of sub-meshes in the batch.
        count: usize,
    },

    /// The number of shader locations does not match the schema.
    #[error("attribute location count mismatch: schema has {expected} fields, got {provided}")]
    AttribLocationCount {
        /// Field count declared by the instance schema.
        expected: usize,
        /// Location count provided by the caller.
        provided: usize,
    },

    /// A pushed instance record does not match the schema stride.
    #[error("instance size mismatch: schema stride is {expected} bytes, record is {actual}")]
    InstanceSizeMismatch {
        /// Byte stride declared by the instance schema.
        expected: usize,
        /// Byte size of the offending record.
        actual: usize,
    },

    /// An instance schema was declared with zero fields.
    #[error("instance schema must declare at least one field")]
    EmptySchema,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_lowercase() {
        let err = RenderError::MeshIndexOutOfRange { index: 3, count: 3 };
        assert_eq!(err.to_string(), "mesh index out of range: 3 >= 3");

        let err = RenderError::InstanceSizeMismatch { expected: 76, actual: 64 };
        assert!(err.to_string().starts_with("instance size mismatch"));
    }
}
