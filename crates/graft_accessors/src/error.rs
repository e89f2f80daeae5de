//! Error types for member access.

use crate::key::{AccessorKey, TypeKey};

/// Error reading, writing, or invoking a resolved member.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The member does not exist. Only produced when a caller requires the
    /// member; plain lookups report absence as `None`.
    #[error("member not found: {0}")]
    MemberNotFound(AccessorKey),

    /// The owner passed in is not an instance of the member's owner type.
    #[error("member '{member}' belongs to {expected}, not the given owner")]
    OwnerMismatch {
        /// The member being accessed.
        member: String,
        /// The member's owner type.
        expected: TypeKey,
    },

    /// Wrong number of arguments.
    #[error("member '{member}' takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// The member being accessed.
        member: String,
        /// Declared argument count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// An argument has the wrong type.
    #[error("argument {index} of '{member}' must be {expected}")]
    ArgumentMismatch {
        /// The member being accessed.
        member: String,
        /// Zero-based argument position.
        index: usize,
        /// Declared argument type.
        expected: TypeKey,
    },

    /// A value read back from a member has a different type than requested.
    #[error("value of '{member}' is not a {requested}")]
    ValueMismatch {
        /// The member being accessed.
        member: String,
        /// The type the caller asked for.
        requested: TypeKey,
    },

    /// A field operation on a method, or the reverse.
    #[error("'{member}' is not a {expected}")]
    WrongKind {
        /// The member being accessed.
        member: String,
        /// What the operation needed ("field" or "method").
        expected: &'static str,
    },
}
