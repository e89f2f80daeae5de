//! Error types for content broadcasts.

/// Error returned by a content producer. Any error type converts into it.
pub type ProducerError = Box<dyn core::error::Error + Send + Sync>;

/// Error using a content broadcast.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// The broadcast has already fired.
    #[error("content for {container} has already been merged")]
    AlreadyMerged {
        /// The container type.
        container: &'static str,
    },

    /// A producer was registered after the broadcast fired; its contribution
    /// could never land.
    #[error("cannot register producer '{producer}': content for {container} has already been merged")]
    InvalidLifecycleState {
        /// The rejected producer.
        producer: String,
        /// The container type.
        container: &'static str,
    },
}

/// A producer that failed during a merge. The merge itself still completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerFailure {
    /// The producer's registration name.
    pub producer: String,
    /// The error or panic message.
    pub message: String,
    /// `true` if the producer panicked rather than returning an error.
    pub panicked: bool,
}

impl core::fmt::Display for ProducerFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let how = if self.panicked { "panicked" } else { "failed" };
        write!(f, "content producer '{}' {how}: {}", self.producer, self.message)
    }
}
