//! # Graft Internal Library
//!
//! Re-exports the Graft crates for convenience.

/// Layer 1: plugin orchestration.
pub use graft_system;

/// Layer 2: memoized member lookup.
pub use graft_accessors;

/// Layer 2: reversible hook chains.
pub use graft_hooks;

/// Layer 2: identifier namespaces.
pub use graft_ids;

/// Layer 2: content merge broadcasts.
pub use graft_content;

/// Layer 3: logging and plugin bundles.
pub use graft_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use graft_accessors::{
        AccessError, AccessorCache, AccessorKey, AccessorsPlugin, Arguments, HostType,
        MemberHandle, MemberTable, TypeCatalog, TypeKey,
    };
    pub use graft_content::{ContentAPI, ContentError, ContentPlugin, ProducerError};
    pub use graft_core_plugins::{DefaultPlugins, MinimalPlugins, TracingPlugin};
    pub use graft_hooks::{ChainOrder, HookError, HookHandle, HookManager, HooksPlugin, Next};
    pub use graft_ids::{HostCount, IdError, Identifier, IdentifierNamespaces, IdsPlugin};
    pub use graft_system::prelude::*;
}
