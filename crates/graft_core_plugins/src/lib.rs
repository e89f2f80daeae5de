//! Ready-made plugin bundles for Graft (Layer 3).
//!
//! - [`TracingPlugin`] - logging for the registries' diagnostics
//! - [`DefaultPlugins`] - tracing plus every extension point registry
//! - [`MinimalPlugins`] - the registries without tracing
//!
//! # Example
//!
//! ```no_run
//! use graft_core_plugins::DefaultPlugins;
//! use graft_system::plugin::PluginGroup;
//! use graft_system::server::Server;
//!
//! let mut server = Server::new();
//! server.add_plugins(DefaultPlugins.build());
//! server.finish();
//! // ... host initialization: publish counts, merge content ...
//! server.cleanup();
//! ```
//!
//! Individual registries can be configured before they are added:
//!
//! ```
//! use graft_core_plugins::{DefaultPlugins, TracingPlugin};
//! use graft_hooks::{ChainOrder, HooksPlugin};
//! use graft_system::plugin::PluginGroup;
//! use graft_system::server::Server;
//!
//! let mut server = Server::new();
//! server.add_plugins(
//!     DefaultPlugins
//!         .build()
//!         .disable::<TracingPlugin>()
//!         .disable::<HooksPlugin>()
//!         .add(HooksPlugin::default().with_order(ChainOrder::FirstAppliedOutermost)),
//! );
//! server.finish();
//! ```

mod tracing_plugin;

pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

use graft_accessors::AccessorsPlugin;
use graft_content::ContentPlugin;
use graft_hooks::HooksPlugin;
use graft_ids::IdsPlugin;
use graft_system::plugin::{PluginGroup, PluginGroupBuilder};

/// Tracing plus every extension point registry.
///
/// Includes:
/// - [`TracingPlugin`]
/// - [`AccessorsPlugin`]
/// - [`HooksPlugin`]
/// - [`IdsPlugin`]
/// - [`ContentPlugin`]
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        MinimalPlugins
            .build()
            .add_before::<_, AccessorsPlugin>(TracingPlugin::default())
    }
}

/// The extension point registries without tracing, for tests and hosts that
/// install their own subscriber.
pub struct MinimalPlugins;

impl PluginGroup for MinimalPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(AccessorsPlugin::default())
            .add(HooksPlugin::default())
            .add(IdsPlugin::default())
            .add(ContentPlugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_accessors::AccessorCache;
    use graft_content::ContentAPI;
    use graft_hooks::{HookManager, HooksConfig};
    use graft_ids::IdentifierNamespaces;
    use graft_system::server::Server;

    #[test]
    fn default_plugins_builds() {
        let builder = DefaultPlugins.build();
        assert_eq!(builder.len(), 5);
        assert!(builder.contains::<TracingPlugin>());
    }

    #[test]
    fn minimal_plugins_builds() {
        let builder = MinimalPlugins.build();
        assert_eq!(builder.len(), 4);
        assert!(!builder.contains::<TracingPlugin>());
    }

    #[test]
    fn server_with_minimal_plugins() {
        let mut server = Server::new();
        server.add_plugins(MinimalPlugins.build());
        server.finish();

        assert!(server.contains_api::<AccessorCache>());
        assert!(server.contains_api::<HookManager>());
        assert!(server.contains_api::<IdentifierNamespaces>());
        assert!(server.contains_api::<ContentAPI>());
        assert!(server.contains_global::<HooksConfig>());

        server.cleanup();
        assert!(server.api::<HookManager>().unwrap().is_torn_down());
    }
}
