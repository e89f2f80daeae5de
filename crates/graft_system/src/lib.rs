//! Plugin orchestration for Graft (Layer 1).
//!
//! `graft_system` provides the primitives every extension registry is built on:
//!
//! - [`api`] - marker trait for capability registries shared between plugins
//! - [`plugin`] - the [`Plugin`](plugin::Plugin) trait and plugin groups
//! - [`resource`] - typed storage for plugin state
//! - [`server`] - the [`Server`](server::Server) that drives the plugin lifecycle
//!
//! # Architecture
//!
//! - **Layer 1** (`graft_system`): plugin orchestration (this crate)
//! - **Layer 2** (`graft_accessors`, `graft_hooks`, `graft_ids`, `graft_content`):
//!   the extension point registries
//! - **Layer 3** (`graft_core_plugins` and user plugins): logging, bundles, and
//!   the extensions themselves
//!
//! # Example
//!
//! ```
//! use graft_system::plugin::Plugin;
//! use graft_system::resource::GlobalResource;
//! use graft_system::server::Server;
//!
//! #[derive(Default)]
//! struct ModSettings { verbose: bool }
//! impl GlobalResource for ModSettings {}
//!
//! struct SettingsPlugin;
//!
//! impl Plugin for SettingsPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(ModSettings::default());
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(SettingsPlugin).run();
//! assert!(server.contains_global::<ModSettings>());
//! ```

pub mod api;
pub mod plugin;
pub mod resource;
pub mod server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::api::*;
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::server::*;
}
