//! Typed storage for plugin state.
//!
//! The [`Server`](crate::server::Server) keeps two [`Resources`] containers:
//!
//! | Container | Marker | Written by | Typical contents |
//! |-----------|--------|------------|------------------|
//! | global | [`GlobalResource`] | the owning plugin, once | configuration, frozen registries |
//! | mutable | none | any plugin during build | registries still being filled |
//!
//! The usual pattern is two-phase: a plugin inserts a mutable registry in
//! `build()`, dependents fill it in their own `build()`, and the owner moves
//! it somewhere read-only in `ready()`.

use core::any::{Any, TypeId};
use hashbrown::HashMap;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Anything that can be stored in a [`Resources`] container.
///
/// Implemented for every `Send + Sync + 'static` type.
pub trait Resource: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Resource for T {}

/// Marker for read-only resources that live for the whole server lifetime.
///
/// # Example
///
/// ```
/// use graft_system::resource::GlobalResource;
///
/// struct HostInfo { build: &'static str }
/// impl GlobalResource for HostInfo {}
/// ```
pub trait GlobalResource: Resource {}

/// Errors returned when a resource cannot be borrowed.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// No resource of the requested type is stored.
    #[error("resource not found: {0}")]
    NotFound(&'static str),

    /// The resource is held by a conflicting borrow.
    #[error("resource already borrowed: {0}")]
    BorrowConflict(&'static str),
}

type BoxedResource = Box<dyn Any + Send + Sync>;

/// Shared read guard over a stored resource.
pub type ResourceRef<'a, T> = MappedRwLockReadGuard<'a, T>;

/// Exclusive write guard over a stored resource.
pub type ResourceRefMut<'a, T> = MappedRwLockWriteGuard<'a, T>;

/// Type-keyed container, one value per type.
///
/// Each entry sits behind its own [`RwLock`], so different resources can be
/// borrowed independently. Borrows never block: a conflicting borrow fails
/// with [`ResourceError::BorrowConflict`].
#[derive(Default)]
pub struct Resources {
    storage: HashMap<TypeId, RwLock<BoxedResource>>,
}

impl Resources {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }

    /// Stores `resource`, returning the value it replaced.
    pub fn insert<T: Resource>(&mut self, resource: T) -> Option<T> {
        self.storage
            .insert(TypeId::of::<T>(), RwLock::new(Box::new(resource)))
            .and_then(|old| old.into_inner().downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns `true` if a resource of type `T` is stored.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.storage.contains_key(&TypeId::of::<T>())
    }

    /// Borrows a resource immutably.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] if absent, [`ResourceError::BorrowConflict`]
    /// if it is currently borrowed mutably.
    pub fn get<T: Resource>(&self) -> Result<ResourceRef<'_, T>, ResourceError> {
        let type_name = core::any::type_name::<T>();
        let entry = self
            .storage
            .get(&TypeId::of::<T>())
            .ok_or(ResourceError::NotFound(type_name))?;
        let guard = entry
            .try_read()
            .ok_or(ResourceError::BorrowConflict(type_name))?;

        RwLockReadGuard::try_map(guard, |boxed| boxed.downcast_ref::<T>())
            .map_err(|_| ResourceError::NotFound(type_name))
    }

    /// Borrows a resource mutably.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] if absent, [`ResourceError::BorrowConflict`]
    /// if it is currently borrowed.
    pub fn get_mut<T: Resource>(&self) -> Result<ResourceRefMut<'_, T>, ResourceError> {
        let type_name = core::any::type_name::<T>();
        let entry = self
            .storage
            .get(&TypeId::of::<T>())
            .ok_or(ResourceError::NotFound(type_name))?;
        let guard = entry
            .try_write()
            .ok_or(ResourceError::BorrowConflict(type_name))?;

        RwLockWriteGuard::try_map(guard, |boxed| boxed.downcast_mut::<T>())
            .map_err(|_| ResourceError::NotFound(type_name))
    }

    /// Removes a resource and returns it.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.storage
            .remove(&TypeId::of::<T>())
            .and_then(|entry| entry.into_inner().downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Catalog {
        entries: Vec<&'static str>,
    }

    #[derive(Debug, PartialEq)]
    struct Label(String);

    #[test]
    fn insert_and_get() {
        let mut resources = Resources::new();
        resources.insert(Catalog {
            entries: vec!["Body"],
        });

        let catalog = resources.get::<Catalog>().unwrap();
        assert_eq!(catalog.entries, vec!["Body"]);
    }

    #[test]
    fn insert_returns_replaced_value() {
        let mut resources = Resources::new();
        resources.insert(Label("first".into()));

        let old = resources.insert(Label("second".into()));
        assert_eq!(old, Some(Label("first".into())));
        assert_eq!(resources.get::<Label>().unwrap().0, "second");
    }

    #[test]
    fn get_mut_writes_through() {
        let mut resources = Resources::new();
        resources.insert(Catalog { entries: vec![] });

        resources.get_mut::<Catalog>().unwrap().entries.push("Skill");

        assert_eq!(resources.get::<Catalog>().unwrap().entries, vec!["Skill"]);
    }

    #[test]
    fn mutable_borrow_blocks_readers() {
        let mut resources = Resources::new();
        resources.insert(Label("x".into()));

        let _guard = resources.get_mut::<Label>().unwrap();
        assert!(matches!(
            resources.get::<Label>(),
            Err(ResourceError::BorrowConflict(_))
        ));
    }

    #[test]
    fn guard_release_allows_new_borrows() {
        let mut resources = Resources::new();
        resources.insert(Label("x".into()));

        {
            let _read = resources.get::<Label>().unwrap();
            assert!(resources.get_mut::<Label>().is_err());
        }
        assert!(resources.get_mut::<Label>().is_ok());
    }

    #[test]
    fn remove_and_missing() {
        let mut resources = Resources::new();
        assert!(matches!(
            resources.get::<Label>(),
            Err(ResourceError::NotFound(_))
        ));

        resources.insert(Label("gone".into()));
        assert_eq!(resources.remove::<Label>(), Some(Label("gone".into())));
        assert!(resources.remove::<Label>().is_none());
        assert!(resources.is_empty());
    }

    #[test]
    fn distinct_types_are_independent() {
        let mut resources = Resources::new();
        resources.insert(Label("a".into()));
        resources.insert(Catalog { entries: vec![] });

        let _label = resources.get_mut::<Label>().unwrap();
        assert!(resources.get::<Catalog>().is_ok());
        assert_eq!(resources.len(), 2);
    }
}
