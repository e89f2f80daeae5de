//! Content merge broadcast for Graft (Layer 2).
//!
//! Extensions contribute entries to host lists through producers that run
//! exactly once, when the host merges the list. A failing producer never
//! takes the others down with it: failures are logged, reported in the
//! [`MergeOutcome`], and the host always receives the container.

mod api;
mod broadcast;
mod error;
mod plugin;

pub use api::ContentAPI;
pub use broadcast::{ContentBroadcast, MergeOutcome};
pub use error::{ContentError, ProducerError, ProducerFailure};
pub use plugin::ContentPlugin;
