//! Provides the [`AccessorCache`] API.

use graft_system::plugin::Plugin;
use graft_system::server::Server;

use crate::cache::AccessorCache;
use crate::catalog::TypeCatalog;
use crate::member::HostType;

/// Plugin that provides the [`AccessorCache`] for member lookup.
///
/// # Lifecycle
///
/// 1. **`build()` phase**: a [`TypeCatalog`] is inserted as a mutable
///    resource. Types passed to [`with_type`](Self::with_type) are registered
///    immediately; dependent plugins register their own host types through
///    [`Server::get_resource_mut`].
/// 2. **`ready()` phase**: the catalog is removed, frozen, and installed as
///    the [`AccessorCache`] API.
///
/// ```
/// use graft_accessors::{AccessorCache, AccessorsPlugin, HostType, MemberTable};
/// use graft_system::server::Server;
///
/// struct Door { open: bool }
///
/// impl HostType for Door {
///     fn describe(members: &mut MemberTable<Self>) {
///         members.field("open", |d| &d.open, |d| &mut d.open);
///     }
/// }
///
/// let mut server = Server::new();
/// server.add_plugins(AccessorsPlugin::default().with_type::<Door>());
/// server.finish();
///
/// let cache = server.api::<AccessorCache>().unwrap();
/// assert!(cache.resolve_in::<Door>("open").is_some());
/// ```
#[derive(Default)]
pub struct AccessorsPlugin {
    registrations: Vec<fn(&mut TypeCatalog) -> bool>,
}

impl AccessorsPlugin {
    /// Registers host type `T` when the plugin builds.
    #[must_use]
    pub fn with_type<T: HostType>(mut self) -> Self {
        self.registrations.push(TypeCatalog::register::<T>);
        self
    }
}

impl Plugin for AccessorsPlugin {
    fn build(&self, server: &mut Server) {
        let mut catalog = TypeCatalog::new();
        for register in &self.registrations {
            register(&mut catalog);
        }
        server.insert_resource(catalog);
    }

    fn ready(&self, server: &mut Server) {
        let Some(catalog) = server.remove_resource::<TypeCatalog>() else {
            tracing::warn!("type catalog was removed before ready; accessor cache starts empty");
            server.insert_api(AccessorCache::new(TypeCatalog::new()));
            return;
        };
        tracing::debug!(host_types = catalog.len(), "accessor cache ready");
        server.insert_api(AccessorCache::new(catalog));
    }
}
