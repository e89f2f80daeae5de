//! Plugin orchestration.
//!
//! The [`Server`] owns every plugin together with the state they share:
//! APIs (capability registries such as the accessor cache or the hook
//! manager), global resources (read-only configuration), and mutable
//! resources (registries still being filled during build).
//!
//! # Lifecycle
//!
//! 1. **Dependency resolution** - plugins are topologically sorted
//! 2. **Build** - `plugin.build()` in dependency order
//! 3. **Ready** - `plugin.ready()` in dependency order
//! 4. **Cleanup** - `plugin.cleanup()` in reverse order, on [`Server::cleanup`]
//!
//! The host initialization sequence calls [`Server::finish`] once before it
//! starts consuming extension content and [`Server::cleanup`] on shutdown.

use crate::api::API;
use crate::plugin::{Plugin, PluginId, Plugins};
use crate::resource::{GlobalResource, Resource, ResourceRef, ResourceRefMut, Resources};
use core::any::TypeId;
use hashbrown::{HashMap, HashSet};

/// Type-erased API storage.
type BoxedAPI = Box<dyn core::any::Any + Send + Sync>;

/// Build progress, advancing `NotStarted` → `Building` → `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    /// `finish()` is running; plugins added now are built immediately.
    Building,
    Built,
}

/// Runtime that orchestrates plugins and their shared registries.
///
/// ```
/// use graft_system::plugin::Plugin;
/// use graft_system::server::Server;
///
/// struct NoopPlugin;
/// impl Plugin for NoopPlugin {
///     fn build(&self, _server: &mut Server) {}
/// }
///
/// let mut server = Server::new();
/// server.add_plugins(NoopPlugin).run();
/// assert!(server.is_built());
/// server.cleanup();
/// ```
pub struct Server {
    /// Read-only, server-lifetime resources.
    global: Resources,

    /// Mutable resources, mostly registries during their build phase.
    resources: Resources,

    /// Capability registries, see [`API`].
    apis: HashMap<TypeId, BoxedAPI>,

    /// Plugins waiting for `finish()`.
    pending_plugins: Vec<PluginEntry>,

    /// Built plugins in dependency order.
    built_plugins: Vec<PluginEntry>,

    /// Ids of every plugin added so far.
    plugin_ids: HashSet<PluginId>,

    build_state: BuildState,
}

struct PluginEntry {
    id: PluginId,
    plugin: Box<dyn Plugin>,
    /// Cached for error messages.
    name: String,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Creates an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Resources::new(),
            resources: Resources::new(),
            apis: HashMap::new(),
            pending_plugins: Vec::new(),
            built_plugins: Vec::new(),
            plugin_ids: HashSet::new(),
            build_state: BuildState::NotStarted,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a plugin or a plugin group.
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_server(self);
        self
    }

    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{}' is unique and was already added.\n\
                 If you intended to add this plugin multiple times, \
                 set `is_unique()` to return `false`.",
                name
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry { id, plugin, name };

        // Plugins added from inside build() are built on the spot.
        if self.build_state == BuildState::Building {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        } else {
            self.pending_plugins.push(entry);
        }
    }

    /// Returns `true` if a plugin of type `P` was added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a mutable resource, returning the value it replaced.
    pub fn insert_resource<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.resources.insert(resource)
    }

    /// Returns `true` if a mutable resource of type `R` exists.
    #[must_use]
    pub fn contains_resource<R: Resource>(&self) -> bool {
        self.resources.contains::<R>()
    }

    /// Borrows a mutable resource immutably.
    #[must_use]
    pub fn get_resource<R: Resource>(&self) -> Option<ResourceRef<'_, R>> {
        self.resources.get::<R>().ok()
    }

    /// Borrows a mutable resource mutably.
    ///
    /// Returns `None` if the resource is absent or already borrowed.
    #[must_use]
    pub fn get_resource_mut<R: Resource>(&self) -> Option<ResourceRefMut<'_, R>> {
        self.resources.get_mut::<R>().ok()
    }

    /// Removes a mutable resource and returns it.
    pub fn remove_resource<R: Resource>(&mut self) -> Option<R> {
        self.resources.remove::<R>()
    }

    /// Inserts a read-only global resource, returning the value it replaced.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.global.insert(resource)
    }

    /// Returns `true` if a global resource of type `R` exists.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.global.contains::<R>()
    }

    /// Borrows a global resource.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<ResourceRef<'_, R>> {
        self.global.get::<R>().ok()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // APIs
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts an API, returning the one it replaced.
    pub fn insert_api<A: API>(&mut self, api: A) -> Option<A> {
        let boxed: BoxedAPI = Box::new(api);
        self.apis
            .insert(TypeId::of::<A>(), boxed)
            .and_then(|old| old.downcast::<A>().ok())
            .map(|b| *b)
    }

    /// Returns the API of type `A`, if installed.
    ///
    /// ```ignore
    /// let hooks = server.api::<HookManager>()
    ///     .expect("HooksPlugin must be added first");
    /// ```
    #[must_use]
    pub fn api<A: API>(&self) -> Option<&A> {
        self.apis
            .get(&TypeId::of::<A>())
            .and_then(|boxed| boxed.downcast_ref::<A>())
    }

    /// Returns `true` if an API of type `A` is installed.
    #[must_use]
    pub fn contains_api<A: API>(&self) -> bool {
        self.apis.contains_key(&TypeId::of::<A>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns `true` once [`finish()`](Self::finish) has returned.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.build_state == BuildState::Built
    }

    /// Sorts, builds, and readies every pending plugin.
    ///
    /// # Panics
    ///
    /// - If a dependency was never added
    /// - If plugin dependencies form a cycle
    /// - If called twice
    pub fn finish(&mut self) {
        if self.build_state != BuildState::NotStarted {
            panic!("Server::finish() was already called. Cannot build twice.");
        }

        let sorted = self.sort_plugins_by_dependencies();

        self.build_state = BuildState::Building;
        for entry in sorted {
            tracing::trace!(plugin = %entry.name, "building plugin");
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        }

        // Detach the list so ready() can borrow the server mutably. Plugins
        // added during ready() are built immediately and appended afterwards.
        let plugins = core::mem::take(&mut self.built_plugins);
        for entry in &plugins {
            tracing::trace!(plugin = %entry.name, "readying plugin");
            entry.plugin.ready(self);
        }
        let late = core::mem::replace(&mut self.built_plugins, plugins);
        self.built_plugins.extend(late);

        self.build_state = BuildState::Built;
        tracing::debug!(plugins = self.built_plugins.len(), "server built");
    }

    /// Alias of [`finish()`](Self::finish).
    pub fn run(&mut self) {
        self.finish();
    }

    /// Calls `cleanup()` on every built plugin in reverse dependency order.
    pub fn cleanup(&mut self) {
        let plugins = core::mem::take(&mut self.built_plugins);
        for entry in plugins.iter().rev() {
            tracing::trace!(plugin = %entry.name, "cleaning up plugin");
            entry.plugin.cleanup(self);
        }
        let late = core::mem::replace(&mut self.built_plugins, plugins);
        self.built_plugins.extend(late);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dependency Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Orders pending plugins so every dependency precedes its dependents.
    ///
    /// Kahn's algorithm; ties keep insertion order.
    fn sort_plugins_by_dependencies(&mut self) -> Vec<PluginEntry> {
        let pending = core::mem::take(&mut self.pending_plugins);
        let n = pending.len();

        let index_of: HashMap<PluginId, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i))
            .collect();

        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in pending.iter().enumerate() {
            for dep in entry.plugin.dependencies() {
                if let Some(&dep_idx) = index_of.get(&dep) {
                    dependents[dep_idx].push(i);
                    in_degree[i] += 1;
                } else if !self.built_plugins.iter().any(|p| p.id == dep) {
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.\n\
                         Add {} before {}, or use a plugin group that includes it.",
                        entry.name,
                        dep.type_name(),
                        dep.type_name(),
                        entry.name
                    );
                }
            }
        }

        let mut ready: std::collections::VecDeque<usize> =
            (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(idx) = ready.pop_front() {
            order.push(idx);
            for &dependent in &dependents[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        if order.len() != n {
            let in_cycle: Vec<&str> = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| pending[i].name.as_str())
                .collect();
            panic!(
                "Circular dependency detected among plugins: {:?}\n\
                 Break the cycle by extracting shared functionality into a separate plugin.",
                in_cycle
            );
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}
