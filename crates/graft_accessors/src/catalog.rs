//! Reflective member lookup over registered host types.

use core::any::TypeId;

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::key::{AccessorKey, TypeKey};
use crate::member::{HostType, MemberHandle, MemberTable};

/// Performs the actual (uncached) member lookup for an [`AccessorKey`].
///
/// [`AccessorCache`](crate::AccessorCache) calls the resolver at most once
/// per distinct key.
pub trait MemberResolver: Send + Sync + 'static {
    /// Looks up the member described by `key`, or `None` if it does not exist.
    fn resolve(&self, key: &AccessorKey) -> Option<MemberHandle>;
}

/// Registry of host types and their declared members.
///
/// Filled during plugin build, then frozen into an
/// [`AccessorCache`](crate::AccessorCache).
#[derive(Default)]
pub struct TypeCatalog {
    types: HashMap<TypeId, RegisteredType>,
}

struct RegisteredType {
    key: TypeKey,
    /// Overloads per member name, in declaration order.
    members: IndexMap<String, Vec<MemberHandle>>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` and its declared members.
    ///
    /// Returns `false` (and keeps the existing description) if `T` was
    /// already registered.
    pub fn register<T: HostType>(&mut self) -> bool {
        let key = TypeKey::of::<T>();
        if self.types.contains_key(&key.type_id()) {
            tracing::debug!(host_type = key.type_name(), "host type already registered");
            return false;
        }

        let mut table = MemberTable::<T>::new();
        T::describe(&mut table);

        let mut members: IndexMap<String, Vec<MemberHandle>> = IndexMap::new();
        for member in table.into_members() {
            members.entry(member.name().to_string()).or_default().push(member);
        }

        tracing::trace!(
            host_type = key.type_name(),
            members = members.len(),
            "registered host type"
        );
        self.types.insert(key.type_id(), RegisteredType { key, members });
        true
    }

    /// Returns `true` if `T` is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.types.contains_key(&TypeId::of::<T>())
    }

    /// Registered host types, in no particular order.
    pub fn types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.types.values().map(|registered| registered.key)
    }

    /// Member names of `owner`, in declaration order.
    #[must_use]
    pub fn member_names(&self, owner: TypeKey) -> Vec<&str> {
        self.types
            .get(&owner.type_id())
            .map(|registered| registered.members.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of registered host types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no host type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl MemberResolver for TypeCatalog {
    fn resolve(&self, key: &AccessorKey) -> Option<MemberHandle> {
        let overloads = self
            .types
            .get(&key.owner().type_id())?
            .members
            .get(key.member())?;

        match key.arguments() {
            None => overloads.first().cloned(),
            Some(signature) => overloads
                .iter()
                .find(|member| member.arguments() == signature)
                .cloned(),
        }
    }
}

impl core::fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.types.values().map(|registered| registered.key.type_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Projectile {
        speed: f32,
    }

    impl HostType for Projectile {
        fn describe(members: &mut MemberTable<Self>) {
            members
                .field("speed", |p| &p.speed, |p| &mut p.speed)
                .method1("boost", |p: &mut Self, by: f32| p.speed += by)
                .method1("boost", |p: &mut Self, by: u32| p.speed += by as f32)
                .method0("stop", |p: &mut Self| p.speed = 0.0);
        }
    }

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        assert!(catalog.register::<Projectile>());
        catalog
    }

    #[test]
    fn registering_twice_keeps_first_description() {
        let mut catalog = catalog();
        assert!(!catalog.register::<Projectile>());
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.member_names(TypeKey::of::<Projectile>()),
            vec!["speed", "boost", "stop"]
        );
    }

    #[test]
    fn unsigned_key_picks_first_overload() {
        let catalog = catalog();
        let boost = catalog
            .resolve(&AccessorKey::of::<Projectile>("boost"))
            .unwrap();
        assert_eq!(boost.arguments(), &[TypeKey::of::<f32>()]);
    }

    #[test]
    fn signature_selects_overload() {
        let catalog = catalog();
        let key = AccessorKey::of::<Projectile>("boost").with_arguments([TypeKey::of::<u32>()]);
        let boost = catalog.resolve(&key).unwrap();

        let mut projectile = Projectile { speed: 1.0 };
        boost
            .invoke(&mut projectile, crate::Arguments::new().with(2_u32))
            .unwrap();
        assert_eq!(projectile.speed, 3.0);

        let missing = AccessorKey::of::<Projectile>("boost").with_arguments([TypeKey::of::<i8>()]);
        assert!(catalog.resolve(&missing).is_none());
    }

    #[test]
    fn unknown_owner_or_member_is_none() {
        let catalog = catalog();
        assert!(catalog.resolve(&AccessorKey::of::<Projectile>("Speed")).is_none());
        assert!(catalog.resolve(&AccessorKey::of::<String>("len")).is_none());
    }
}
