//! Identifier allocation for Graft (Layer 2).
//!
//! Extensions add entries to host lists whose entries are numbered. Each
//! list gets an [`IdentifierNamespace`] that hands out numbers directly after
//! the host's own, one at a time, without reuse.
//!
//! The host reports its count through an [`IdentifierSource`], usually a
//! [`HostCount`] latch published during host initialization. Reserving
//! before that point fails with [`IdError::InvalidLifecycleState`].

mod error;
mod namespace;
mod plugin;
mod registry;

pub use error::IdError;
pub use namespace::{HostCount, Identifier, IdentifierNamespace, IdentifierSource, SourceFn};
pub use plugin::IdsPlugin;
pub use registry::{IdentifierNamespaces, NamespaceId};
