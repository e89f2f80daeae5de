//! Name-to-type resolution across registered type universes.

use std::collections::BTreeMap;

use graft_accessors::TypeKey;
use indexmap::IndexMap;

/// A type registered under a dotted, fully-qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    key: TypeKey,
    full_name: String,
}

impl NamedType {
    /// The registered type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The fully-qualified name, e.g. `EntityStates.Commando.FirePistol`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The segment after the last `.`, or the whole name if it has none.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, simple)| simple)
    }

    fn matches(&self, name: &str) -> bool {
        self.simple_name() == name || self.full_name == name
    }
}

/// Every type that a string name can refer to, grouped by universe
/// (the host, each loaded extension, ...).
///
/// Resolution order:
///
/// 1. The global index, by exact fully-qualified name.
/// 2. Each universe in lexicographic order of its name, and within a universe
///    in registration order, matching the simple name or the full name.
///
/// Matching is case-sensitive and the first match wins.
#[derive(Debug, Default)]
pub struct TypeUniverses {
    global: IndexMap<String, TypeKey>,
    universes: BTreeMap<String, Vec<NamedType>>,
}

impl TypeUniverses {
    /// Creates an empty set of universes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `T` to the global index under `full_name`.
    ///
    /// Returns the type previously indexed under that name, if any.
    pub fn register_global<T: 'static>(&mut self, full_name: impl Into<String>) -> Option<TypeKey> {
        self.global.insert(full_name.into(), TypeKey::of::<T>())
    }

    /// Adds `T` to `universe` under `full_name`.
    pub fn register<T: 'static>(&mut self, universe: impl Into<String>, full_name: impl Into<String>) {
        self.universes
            .entry(universe.into())
            .or_default()
            .push(NamedType {
                key: TypeKey::of::<T>(),
                full_name: full_name.into(),
            });
    }

    /// Resolves a type name. An empty name resolves to nothing.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<TypeKey> {
        if name.is_empty() {
            return None;
        }
        if let Some(key) = self.global.get(name) {
            return Some(*key);
        }
        self.universes
            .values()
            .flatten()
            .find(|named| named.matches(name))
            .map(NamedType::key)
    }

    /// Fully-qualified name of `key`, preferring the global index.
    ///
    /// A type indexed under several global names reports the one registered
    /// first.
    #[must_use]
    pub fn name_of(&self, key: TypeKey) -> Option<&str> {
        self.global
            .iter()
            .find(|(_, indexed)| **indexed == key)
            .map(|(name, _)| name.as_str())
            .or_else(|| {
                self.universes
                    .values()
                    .flatten()
                    .find(|named| named.key == key)
                    .map(NamedType::full_name)
            })
    }

    /// Names of the registered universes, in resolution order.
    pub fn universe_names(&self) -> impl Iterator<Item = &str> {
        self.universes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FirePistol;
    struct ModdedFirePistol;
    struct ChargeLaser;

    fn universes() -> TypeUniverses {
        let mut universes = TypeUniverses::new();
        universes.register::<ModdedFirePistol>("zeta_mod", "ZetaMod.States.FirePistol");
        universes.register::<FirePistol>("host", "EntityStates.Commando.FirePistol");
        universes.register::<ChargeLaser>("host", "EntityStates.Golem.ChargeLaser");
        universes
    }

    #[test]
    fn simple_name_resolves_in_universe_order() {
        let universes = universes();
        assert_eq!(universes.resolve("FirePistol"), Some(TypeKey::of::<FirePistol>()));
        assert_eq!(
            universes.resolve("ZetaMod.States.FirePistol"),
            Some(TypeKey::of::<ModdedFirePistol>())
        );
        assert_eq!(universes.universe_names().collect::<Vec<_>>(), vec!["host", "zeta_mod"]);
    }

    #[test]
    fn global_index_wins() {
        let mut universes = universes();
        universes.register_global::<ModdedFirePistol>("FirePistol");
        assert_eq!(
            universes.resolve("FirePistol"),
            Some(TypeKey::of::<ModdedFirePistol>())
        );
    }

    #[test]
    fn matching_is_case_sensitive_and_empty_is_none() {
        let universes = universes();
        assert_eq!(universes.resolve("firepistol"), None);
        assert_eq!(universes.resolve(""), None);
        assert_eq!(universes.resolve("Commando.FirePistol"), None);
    }

    #[test]
    fn reverse_lookup() {
        let universes = universes();
        assert_eq!(
            universes.name_of(TypeKey::of::<ChargeLaser>()),
            Some("EntityStates.Golem.ChargeLaser")
        );
        assert_eq!(universes.name_of(TypeKey::of::<String>()), None);
    }

    #[test]
    fn reverse_lookup_reports_the_first_global_alias() {
        let mut universes = universes();
        let aliases = [
            "EntityStates.Commando.FirePistol",
            "Legacy.FirePistol",
            "Commando.Primary",
            "WeaponsMod.Compat.FirePistol",
            "FirePistolAlias",
        ];
        for alias in aliases {
            universes.register_global::<FirePistol>(alias);
        }

        for _ in 0..8 {
            assert_eq!(
                universes.name_of(TypeKey::of::<FirePistol>()),
                Some("EntityStates.Commando.FirePistol")
            );
        }
        for alias in aliases {
            assert_eq!(universes.resolve(alias), Some(TypeKey::of::<FirePistol>()));
        }
    }
}
