//! Cache keys.

use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Identity of a host type.
///
/// Wraps a `TypeId` together with the type's name for diagnostics. Equality
/// and hashing use the `TypeId` alone.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Creates the `TypeKey` of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the Rust type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Structural key of one member query: owner type, member name, and an
/// optional argument signature.
///
/// `arguments: None` matches any signature (the first declared member with
/// that name wins). `Some(vec![])` matches only members taking no arguments.
/// Two keys are equal only if all three parts are equal, so the same member
/// may be cached under several keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessorKey {
    owner: TypeKey,
    member: String,
    arguments: Option<Vec<TypeKey>>,
}

impl AccessorKey {
    /// Key for `member` on `owner`, any signature.
    #[must_use]
    pub fn new(owner: TypeKey, member: impl Into<String>) -> Self {
        Self {
            owner,
            member: member.into(),
            arguments: None,
        }
    }

    /// Key for `member` on `O`, any signature.
    #[must_use]
    pub fn of<O: 'static>(member: impl Into<String>) -> Self {
        Self::new(TypeKey::of::<O>(), member)
    }

    /// Restricts the key to an exact argument signature.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<Vec<TypeKey>>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    /// Returns the owner type.
    #[must_use]
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Returns the member name.
    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Returns the argument signature, if the key carries one.
    #[must_use]
    pub fn arguments(&self) -> Option<&[TypeKey]> {
        self.arguments.as_deref()
    }
}

impl fmt::Display for AccessorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.member)?;
        if let Some(arguments) = &self.arguments {
            let names: Vec<&str> = arguments.iter().map(TypeKey::type_name).collect();
            write!(f, "({})", names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Body;

    #[test]
    fn type_identity_ignores_the_name() {
        let renamed = TypeKey {
            type_id: TypeId::of::<u8>(),
            type_name: "alias",
        };
        assert_eq!(renamed, TypeKey::of::<u8>());
        assert_ne!(renamed, TypeKey::of::<u16>());

        let set: HashSet<TypeKey> = [renamed, TypeKey::of::<u8>()].into();
        assert_eq!(set.len(), 1);
        assert_eq!(
            AccessorKey::new(renamed, "len"),
            AccessorKey::of::<u8>("len")
        );
    }

    #[test]
    fn keys_compare_structurally() {
        let a = AccessorKey::of::<Body>("heal");
        let b = AccessorKey::new(TypeKey::of::<Body>(), String::from("heal"));
        assert_eq!(a, b);

        let typed = a.clone().with_arguments([TypeKey::of::<f32>()]);
        assert_ne!(a, typed);
        assert_ne!(typed, a.clone().with_arguments([TypeKey::of::<f64>()]));
        assert_ne!(a, AccessorKey::of::<Body>("Heal"));
    }

    #[test]
    fn empty_signature_differs_from_any_signature() {
        let any = AccessorKey::of::<Body>("reset");
        let none = AccessorKey::of::<Body>("reset").with_arguments(Vec::new());

        let set: HashSet<AccessorKey> = [any.clone(), none.clone(), any.clone()].into();
        assert_eq!(set.len(), 2);
        assert_eq!(none.arguments(), Some(&[][..]));
        assert_eq!(any.arguments(), None);
    }

    #[test]
    fn display_includes_signature() {
        let key = AccessorKey::of::<Body>("heal").with_arguments([TypeKey::of::<f32>()]);
        let text = key.to_string();
        assert!(text.ends_with("Body::heal(f32)"), "{text}");
    }
}
