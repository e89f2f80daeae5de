//! Named identifier namespaces shared between plugins.

use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use graft_system::api::API;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::IdError;
use crate::namespace::{Identifier, IdentifierNamespace, IdentifierSource};

/// Identifies a namespace by a marker type.
///
/// ```
/// use graft_ids::NamespaceId;
///
/// struct Buffs;
/// assert_eq!(NamespaceId::of::<Buffs>().name(), "Buffs");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespaceId {
    type_id: TypeId,
    name: &'static str,
}

impl NamespaceId {
    /// The id of marker type `N`.
    #[must_use]
    pub fn of<N: 'static>() -> Self {
        let full = core::any::type_name::<N>();
        let base = full.split('<').next().unwrap_or(full);
        Self {
            type_id: TypeId::of::<N>(),
            name: base.rsplit("::").next().unwrap_or(base),
        }
    }

    /// Short name of the marker type, without module path or generic
    /// arguments. Used for diagnostics only.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// All identifier namespaces, keyed by marker type.
///
/// Extensions reserve identifiers for one host list (buffs, items, ...)
/// through that list's namespace.
#[derive(Default)]
pub struct IdentifierNamespaces {
    namespaces: RwLock<HashMap<NamespaceId, Arc<IdentifierNamespace>>>,
}

impl API for IdentifierNamespaces {}

impl IdentifierNamespaces {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares namespace `N`, seeded from `source`.
    ///
    /// Declaring an existing namespace again keeps the original (and its
    /// reservations) and ignores `source`.
    pub fn declare<N: 'static>(&self, source: impl IdentifierSource) -> Arc<IdentifierNamespace> {
        let id = NamespaceId::of::<N>();
        let mut namespaces = self.namespaces.write();
        if let Some(existing) = namespaces.get(&id) {
            tracing::warn!(namespace = %id, "identifier namespace declared twice; keeping the first");
            return Arc::clone(existing);
        }
        let namespace = Arc::new(IdentifierNamespace::new(id.name(), source));
        namespaces.insert(id, Arc::clone(&namespace));
        tracing::debug!(namespace = %id, "identifier namespace declared");
        namespace
    }

    /// Returns namespace `N`, if declared.
    #[must_use]
    pub fn namespace<N: 'static>(&self) -> Option<Arc<IdentifierNamespace>> {
        self.namespaces.read().get(&NamespaceId::of::<N>()).cloned()
    }

    /// Reserves the next identifier in namespace `N`.
    ///
    /// # Errors
    ///
    /// [`IdError::UndeclaredNamespace`] if `N` was never declared, otherwise
    /// see [`IdentifierNamespace::reserve`].
    pub fn reserve<N: 'static>(&self) -> Result<Identifier, IdError> {
        let namespace = self
            .namespace::<N>()
            .ok_or(IdError::UndeclaredNamespace(NamespaceId::of::<N>().name()))?;
        namespace.reserve()
    }

    /// Number of declared namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.read().len()
    }

    /// Returns `true` if no namespace is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for IdentifierNamespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.namespaces.read().keys().map(NamespaceId::name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::HostCount;

    struct Buffs;
    struct Items;
    struct Tag<T>(core::marker::PhantomData<T>);

    #[test]
    fn generic_markers_keep_their_base_name() {
        let tagged = NamespaceId::of::<Tag<Items>>();
        assert_eq!(tagged.name(), "Tag");
        assert_eq!(NamespaceId::of::<Tag<Tag<Buffs>>>().name(), "Tag");
        assert_ne!(tagged, NamespaceId::of::<Tag<Buffs>>());
        assert_eq!(NamespaceId::of::<Items>().name(), "Items");
    }

    #[test]
    fn namespaces_count_independently() {
        let registry = IdentifierNamespaces::new();
        registry.declare::<Buffs>(HostCount::published(50));
        registry.declare::<Items>(HostCount::published(10));

        assert_eq!(registry.reserve::<Buffs>().unwrap().value(), 51);
        assert_eq!(registry.reserve::<Items>().unwrap().value(), 11);
        assert_eq!(registry.reserve::<Buffs>().unwrap().value(), 52);
    }

    #[test]
    fn redeclaring_keeps_first_namespace() {
        let registry = IdentifierNamespaces::new();
        let first = registry.declare::<Buffs>(HostCount::published(5));
        first.reserve().unwrap();

        let second = registry.declare::<Buffs>(HostCount::published(500));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.reserve::<Buffs>().unwrap().value(), 7);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn undeclared_namespace_is_an_error() {
        let registry = IdentifierNamespaces::new();
        assert_eq!(
            registry.reserve::<Items>(),
            Err(IdError::UndeclaredNamespace("Items"))
        );
    }
}
