//! Provides the [`IdentifierNamespaces`] API.

use graft_system::plugin::Plugin;
use graft_system::server::Server;

use crate::namespace::IdentifierSource;
use crate::registry::IdentifierNamespaces;

type Declaration = Box<dyn Fn(&IdentifierNamespaces) + Send + Sync>;

/// Plugin that provides [`IdentifierNamespaces`].
///
/// The API is inserted during `build()` so that dependent plugins can
/// declare their own namespaces while they build. Reservations only succeed
/// once the host has published its counts.
///
/// ```
/// use graft_ids::{HostCount, IdentifierNamespaces, IdsPlugin};
/// use graft_system::server::Server;
///
/// struct Buffs;
///
/// let host_buffs = HostCount::new();
/// let mut server = Server::new();
/// server.add_plugins(IdsPlugin::default().with_namespace::<Buffs>(host_buffs.clone()));
/// server.finish();
///
/// host_buffs.publish(50);
/// let ids = server.api::<IdentifierNamespaces>().unwrap();
/// assert_eq!(ids.reserve::<Buffs>().unwrap().value(), 51);
/// ```
#[derive(Default)]
pub struct IdsPlugin {
    declarations: Vec<Declaration>,
}

impl IdsPlugin {
    /// Declares namespace `N` when the plugin builds.
    #[must_use]
    pub fn with_namespace<N: 'static>(mut self, source: impl IdentifierSource + Clone) -> Self {
        self.declarations.push(Box::new(move |namespaces: &IdentifierNamespaces| {
            namespaces.declare::<N>(source.clone());
        }));
        self
    }
}

impl Plugin for IdsPlugin {
    fn build(&self, server: &mut Server) {
        let namespaces = IdentifierNamespaces::new();
        for declare in &self.declarations {
            declare(&namespaces);
        }
        tracing::debug!(namespaces = namespaces.len(), "identifier namespaces ready");
        server.insert_api(namespaces);
    }
}
