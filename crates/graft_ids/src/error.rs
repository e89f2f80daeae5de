//! Error types for identifier reservation.

/// Error reserving an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The host has not published its identifier count yet.
    #[error("cannot reserve a {namespace} identifier before the host count is known")]
    InvalidLifecycleState {
        /// Namespace the reservation was for.
        namespace: &'static str,
    },

    /// Every identifier in the namespace has been handed out.
    #[error("{namespace} identifiers exhausted")]
    Exhausted {
        /// Namespace the reservation was for.
        namespace: &'static str,
    },

    /// No namespace has been declared for the marker type.
    #[error("identifier namespace {0} was never declared")]
    UndeclaredNamespace(&'static str),
}
