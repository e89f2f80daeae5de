//! Provides the [`HookManager`] API.

use graft_accessors::{AccessorCache, AccessorsPlugin, TypeCatalog};
use graft_system::plugin::{Plugin, PluginId};
use graft_system::resource::GlobalResource;
use graft_system::server::Server;

use crate::manager::{ChainOrder, HookManager};
use crate::redirect::StateTypeSlot;

/// Hook configuration, readable by other plugins as a global resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HooksConfig {
    /// Precedence between hooks on the same member.
    pub order: ChainOrder,
}

impl GlobalResource for HooksConfig {}

/// Plugin that provides the [`HookManager`].
///
/// # Lifecycle
///
/// 1. **`build()`**: registers [`StateTypeSlot`] with the type catalog and
///    publishes [`HooksConfig`].
/// 2. **`ready()`**: once [`AccessorsPlugin`] has frozen the catalog, inserts
///    the [`HookManager`] API. Plugins that depend on `HooksPlugin` apply
///    their hooks in their own `ready()`.
/// 3. **`cleanup()`**: tears the manager down, undoing any hook its owner
///    forgot to remove. Dependents clean up first, so well-behaved plugins
///    have already undone theirs.
///
/// ```
/// use graft_accessors::AccessorsPlugin;
/// use graft_hooks::{ChainOrder, HookManager, HooksPlugin};
/// use graft_system::server::Server;
///
/// let mut server = Server::new();
/// server
///     .add_plugins(AccessorsPlugin::default())
///     .add_plugins(HooksPlugin::default().with_order(ChainOrder::FirstAppliedOutermost));
/// server.finish();
///
/// let hooks = server.api::<HookManager>().unwrap();
/// assert_eq!(hooks.order(), ChainOrder::FirstAppliedOutermost);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct HooksPlugin {
    order: ChainOrder,
}

impl HooksPlugin {
    /// Sets the precedence between hooks on the same member.
    #[must_use]
    pub fn with_order(mut self, order: ChainOrder) -> Self {
        self.order = order;
        self
    }
}

impl Plugin for HooksPlugin {
    fn build(&self, server: &mut Server) {
        if let Some(mut catalog) = server.get_resource_mut::<TypeCatalog>() {
            catalog.register::<StateTypeSlot>();
        }
        server.insert_global(HooksConfig { order: self.order });
    }

    fn ready(&self, server: &mut Server) {
        let Some(cache) = server.api::<AccessorCache>().cloned() else {
            tracing::error!("accessor cache missing; hook manager not installed");
            return;
        };
        server.insert_api(HookManager::new(cache, self.order));
        tracing::debug!(order = ?self.order, "hook manager ready");
    }

    fn cleanup(&self, server: &mut Server) {
        if let Some(hooks) = server.api::<HookManager>() {
            let leftover = hooks.teardown();
            tracing::info!(leftover, "hook manager torn down");
        }
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<AccessorsPlugin>()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_accessors::AccessorKey;

    fn server() -> Server {
        let mut server = Server::new();
        server
            .add_plugins(AccessorsPlugin::default())
            .add_plugins(HooksPlugin::default());
        server.finish();
        server
    }

    #[test]
    fn manager_and_config_are_installed() {
        let server = server();
        assert!(server.contains_api::<HookManager>());
        assert_eq!(
            *server.get_global::<HooksConfig>().unwrap(),
            HooksConfig::default()
        );
    }

    #[test]
    fn slot_type_is_hookable() {
        let server = server();
        let hooks = server.api::<HookManager>().unwrap();
        let handle = hooks
            .apply(
                &AccessorKey::of::<StateTypeSlot>("type_name"),
                "noop",
                |owner, args, next| next.call(owner, args),
            )
            .unwrap();
        assert!(hooks.undo(&handle));
    }

    #[test]
    fn cleanup_tears_down() {
        let mut server = server();
        let hooks = server.api::<HookManager>().unwrap().clone();
        hooks
            .apply(
                &AccessorKey::of::<StateTypeSlot>("state_type"),
                "forgotten",
                |owner, args, next| next.call(owner, args),
            )
            .unwrap();

        server.cleanup();

        assert!(hooks.is_torn_down());
        assert_eq!(hooks.hook_count(), 0);
    }
}
