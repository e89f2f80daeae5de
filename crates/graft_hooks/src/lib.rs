//! Hook lifecycle management for Graft (Layer 2).
//!
//! Extensions wrap host members with handlers instead of patching them. The
//! [`HookManager`] resolves the target through the accessor cache, keeps one
//! ordered chain per member, and runs that chain around the original on
//! every call. Every [`apply`](HookManager::apply) returns a [`HookHandle`]
//! that [`undo`](HookManager::undo) removes again, leaving any other hooks on
//! the same member in place.
//!
//! [`redirect`] uses the same machinery to keep a type-valued field and its
//! string-named companion consistent.

mod chain;
mod error;
mod manager;
mod plugin;
pub mod redirect;
mod universe;

pub use chain::{HookFn, Next};
pub use error::HookError;
pub use manager::{ChainOrder, HookHandle, HookId, HookManager, WeakHookManager};
pub use plugin::{HooksConfig, HooksPlugin};
pub use universe::{NamedType, TypeUniverses};
