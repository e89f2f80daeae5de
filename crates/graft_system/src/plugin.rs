//! Plugins: the unit of extension.
//!
//! Every extension, including the registries themselves, is delivered as a
//! plugin. A plugin sets up state in [`Plugin::build`], wires itself to other
//! plugins in [`Plugin::ready`], and undoes whatever it installed on the host
//! in [`Plugin::cleanup`].
//!
//! # Example
//!
//! ```
//! use graft_system::plugin::{Plugin, PluginId};
//! use graft_system::server::Server;
//!
//! struct CatalogPlugin;
//!
//! impl Plugin for CatalogPlugin {
//!     fn build(&self, _server: &mut Server) {}
//! }
//!
//! struct ExtraSkinsPlugin {
//!     skins: Vec<String>,
//! }
//!
//! struct ExtraSkins(Vec<String>);
//!
//! impl Plugin for ExtraSkinsPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_resource(ExtraSkins(self.skins.clone()));
//!     }
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<CatalogPlugin>()]
//!     }
//! }
//!
//! Server::new()
//!     .add_plugins(CatalogPlugin)
//!     .add_plugins(ExtraSkinsPlugin { skins: vec!["Mastery".into()] })
//!     .run();
//! ```

use core::any::TypeId;

use crate::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Type identity of a plugin, used for dependencies and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates the `PluginId` of plugin type `P`.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the plugin's type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of extension managed by the [`Server`].
///
/// The server drives every plugin through the same stages:
///
/// 1. **Build** - [`build()`](Self::build), in dependency order. Insert APIs
///    and resources, register host types, queue content producers.
/// 2. **Ready** - [`ready()`](Self::ready), in dependency order. Registries
///    are frozen by their owners here; dependents apply hooks and reserve
///    identifiers once the registries they depend on are ready.
/// 3. **Cleanup** - [`cleanup()`](Self::cleanup), in reverse dependency order.
///    Undo every hook applied during ready.
pub trait Plugin: Send + Sync + 'static {
    /// Sets up the plugin. Called once, in dependency order.
    fn build(&self, server: &mut Server);

    /// Called after every plugin has been built.
    fn ready(&self, _server: &mut Server) {}

    /// Called on shutdown, dependents before their dependencies.
    fn cleanup(&self, _server: &mut Server) {}

    /// Returns the plugin's name for diagnostics. Defaults to the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Plugins that must be built before this one.
    ///
    /// The server panics in [`Server::finish`] if one of them is missing.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Whether adding this plugin type twice is an error. Defaults to `true`.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Anything [`Server::add_plugins`] accepts: a single [`Plugin`] or a
/// [`PluginGroupBuilder`].
pub trait Plugins {
    /// Adds these plugins to the server.
    fn add_to_server(self, server: &mut Server);
}

impl<P: Plugin> Plugins for P {
    fn add_to_server(self, server: &mut Server) {
        // Capture the id while the concrete type is still known.
        let id = PluginId::of::<P>();
        server.add_plugin_boxed(id, Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_server(self, server: &mut Server) {
        for boxed in self.plugins {
            server.add_plugin_boxed(boxed.id, boxed.plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A bundle of plugins added together, customizable before insertion.
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin that remembers its [`PluginId`].
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

impl BoxedPlugin {
    pub(crate) fn name(&self) -> &str {
        self.plugin.name()
    }
}

/// Ordered, editable list of plugins produced by a [`PluginGroup`].
///
/// ```ignore
/// DefaultPlugins
///     .build()
///     .disable::<TracingPlugin>()
///     .add_after::<_, HooksPlugin>(MyHooksPlugin)
/// ```
#[derive(Default)]
pub struct PluginGroupBuilder {
    pub(crate) plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Appends a plugin.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        });
        self
    }

    /// Inserts a plugin before `Target`, or at the front if `Target` is absent.
    #[must_use]
    pub fn add_before<P: Plugin, Target: Plugin>(mut self, plugin: P) -> Self {
        let position = self.position_of::<Target>().unwrap_or(0);
        self.plugins.insert(
            position,
            BoxedPlugin {
                id: PluginId::of::<P>(),
                plugin: Box::new(plugin),
            },
        );
        self
    }

    /// Inserts a plugin after `Target`, or at the end if `Target` is absent.
    #[must_use]
    pub fn add_after<P: Plugin, Target: Plugin>(mut self, plugin: P) -> Self {
        let position = self
            .position_of::<Target>()
            .map_or(self.plugins.len(), |i| i + 1);
        self.plugins.insert(
            position,
            BoxedPlugin {
                id: PluginId::of::<P>(),
                plugin: Box::new(plugin),
            },
        );
        self
    }

    /// Removes every plugin of type `P`. No-op if none is present.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let id = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != id);
        self
    }

    /// Returns `true` if a plugin of type `P` is in the group.
    #[must_use]
    pub fn contains<P: Plugin>(&self) -> bool {
        self.position_of::<P>().is_some()
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn position_of<P: Plugin>(&self) -> Option<usize> {
        let id = PluginId::of::<P>();
        self.plugins.iter().position(|p| p.id == id)
    }
}
