//! Keeps a type-valued field and its string-named companion in sync.
//!
//! Hosts often expose the same setting twice: once as a type handle (the
//! canonical form) and once as a type name that is only resolved later. If
//! an extension writes the name, the handle goes stale. The redirects
//! installed here make every write to either field go through the canonical
//! setter, which then derives the name.

use core::any::Any;
use std::sync::Arc;

use graft_accessors::{
    AccessError, AccessorKey, Arguments, HostType, MemberHandle, MemberTable, TypeKey,
};

use crate::error::HookError;
use crate::manager::{HookHandle, HookManager};
use crate::universe::TypeUniverses;

/// A host slot naming the state type an entity enters, in both forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTypeSlot {
    state_type: Option<TypeKey>,
    type_name: String,
}

impl StateTypeSlot {
    /// The canonical state type.
    #[must_use]
    pub fn state_type(&self) -> Option<TypeKey> {
        self.state_type
    }

    /// The companion, string-named form.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl HostType for StateTypeSlot {
    fn describe(members: &mut MemberTable<Self>) {
        members
            .field("state_type", |s| &s.state_type, |s| &mut s.state_type)
            .field("type_name", |s| &s.type_name, |s| &mut s.type_name);
    }
}

/// The two hooks installed by [`install_state_type_redirects`].
#[derive(Debug)]
pub struct StateTypeRedirects {
    canonical: HookHandle,
    companion: HookHandle,
    state_type: MemberHandle,
    type_name: MemberHandle,
}

impl StateTypeRedirects {
    /// Writes the canonical field through its hook chain.
    ///
    /// # Errors
    ///
    /// Propagates errors from the hook chain.
    pub fn set_state_type(
        &self,
        hooks: &HookManager,
        slot: &mut StateTypeSlot,
        state_type: Option<TypeKey>,
    ) -> Result<(), AccessError> {
        hooks.set_field(&self.state_type, slot, state_type)
    }

    /// Writes the companion field through its hook chain.
    ///
    /// # Errors
    ///
    /// Propagates errors from the hook chain.
    pub fn set_type_name(
        &self,
        hooks: &HookManager,
        slot: &mut StateTypeSlot,
        type_name: impl Into<String>,
    ) -> Result<(), AccessError> {
        hooks.set_field(&self.type_name, slot, type_name.into())
    }

    /// Handles of the canonical and companion hooks.
    #[must_use]
    pub fn handles(&self) -> [&HookHandle; 2] {
        [&self.canonical, &self.companion]
    }

    /// Removes both hooks. Returns `true` if both were still applied.
    pub fn undo(self, hooks: &HookManager) -> bool {
        let companion = hooks.undo(&self.companion);
        let canonical = hooks.undo(&self.canonical);
        companion && canonical
    }
}

fn derived_name(universes: &TypeUniverses, state_type: Option<TypeKey>) -> String {
    state_type
        .map(|key| universes.name_of(key).unwrap_or(key.type_name()).to_string())
        .unwrap_or_default()
}

/// Installs the `state_type` / `type_name` redirect pair.
///
/// [`StateTypeSlot`] must be registered with the accessor catalog;
/// `HooksPlugin` does this during build.
///
/// # Errors
///
/// See [`HookManager::apply`].
pub fn install_state_type_redirects(
    hooks: &HookManager,
    universes: Arc<TypeUniverses>,
) -> Result<StateTypeRedirects, HookError> {
    let state_type_key = AccessorKey::of::<StateTypeSlot>("state_type");
    let type_name_key = AccessorKey::of::<StateTypeSlot>("type_name");

    let resolve = |key: &AccessorKey| {
        hooks
            .cache()
            .resolve(key)
            .ok_or_else(|| HookError::TargetNotFound(key.clone()))
    };
    let state_type = resolve(&state_type_key)?;
    let type_name = resolve(&type_name_key)?;

    let names = Arc::clone(&universes);
    let canonical = hooks.apply(&state_type_key, "state_type_sync", move |owner, args, next| {
        let written = next.call(owner, args)?;
        if let Some(slot) = owner.downcast_mut::<StateTypeSlot>() {
            slot.type_name = derived_name(&names, slot.state_type);
        }
        Ok(written)
    })?;

    let manager = hooks.downgrade();
    let canonical_member = state_type.clone();
    let companion = hooks.apply(&type_name_key, "type_name_redirect", move |owner: &mut dyn Any, args, next| {
        let Some(name) = args.get::<String>(0).cloned() else {
            return next.call(owner, args);
        };
        let resolved = universes.resolve(&name);
        if resolved.is_none() {
            tracing::debug!(type_name = %name, "unknown state type name; clearing slot");
        }

        match manager.upgrade() {
            Some(manager) => {
                manager.invoke_erased(&canonical_member, owner, Arguments::new().with(resolved))
            }
            None => {
                let slot = owner
                    .downcast_mut::<StateTypeSlot>()
                    .ok_or_else(|| AccessError::OwnerMismatch {
                        member: "type_name".to_string(),
                        expected: TypeKey::of::<StateTypeSlot>(),
                    })?;
                slot.state_type = resolved;
                slot.type_name = derived_name(&universes, resolved);
                Ok(Box::new(()))
            }
        }
    });

    let companion = match companion {
        Ok(handle) => handle,
        Err(err) => {
            hooks.undo(&canonical);
            return Err(err);
        }
    };

    Ok(StateTypeRedirects {
        canonical,
        companion,
        state_type,
        type_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ChainOrder;
    use graft_accessors::{AccessorCache, TypeCatalog};

    struct FirePistol;
    struct ChargeLaser;

    fn setup() -> (HookManager, StateTypeRedirects) {
        let mut catalog = TypeCatalog::new();
        catalog.register::<StateTypeSlot>();
        let hooks = HookManager::new(AccessorCache::new(catalog), ChainOrder::default());

        let mut universes = TypeUniverses::new();
        universes.register::<FirePistol>("host", "EntityStates.Commando.FirePistol");
        universes.register_global::<ChargeLaser>("EntityStates.Golem.ChargeLaser");

        let redirects = install_state_type_redirects(&hooks, Arc::new(universes)).unwrap();
        (hooks, redirects)
    }

    #[test]
    fn writing_the_handle_derives_the_name() {
        let (hooks, redirects) = setup();
        let mut slot = StateTypeSlot::default();

        redirects
            .set_state_type(&hooks, &mut slot, Some(TypeKey::of::<ChargeLaser>()))
            .unwrap();
        assert_eq!(slot.type_name(), "EntityStates.Golem.ChargeLaser");

        redirects.set_state_type(&hooks, &mut slot, None).unwrap();
        assert_eq!(slot.type_name(), "");
    }

    #[test]
    fn writing_a_known_simple_name_sets_the_handle() {
        let (hooks, redirects) = setup();
        let mut slot = StateTypeSlot::default();

        redirects.set_type_name(&hooks, &mut slot, "FirePistol").unwrap();

        assert_eq!(slot.state_type(), Some(TypeKey::of::<FirePistol>()));
        assert_eq!(slot.type_name(), "EntityStates.Commando.FirePistol");
    }

    #[test]
    fn writing_an_unknown_name_clears_the_slot() {
        let (hooks, redirects) = setup();
        let mut slot = StateTypeSlot::default();
        redirects.set_type_name(&hooks, &mut slot, "FirePistol").unwrap();

        redirects.set_type_name(&hooks, &mut slot, "NoSuchState").unwrap();

        assert_eq!(slot, StateTypeSlot::default());
    }

    #[test]
    fn undo_restores_plain_fields() {
        let (hooks, redirects) = setup();
        let type_name = hooks.cache().resolve_in::<StateTypeSlot>("type_name").unwrap();
        assert!(redirects.undo(&hooks));
        assert_eq!(hooks.hook_count(), 0);

        let mut slot = StateTypeSlot::default();
        hooks
            .set_field(&type_name, &mut slot, String::from("FirePistol"))
            .unwrap();
        assert_eq!(slot.type_name(), "FirePistol");
        assert_eq!(slot.state_type(), None);
    }

    #[test]
    fn missing_slot_type_is_reported() {
        let hooks = HookManager::new(AccessorCache::new(TypeCatalog::new()), ChainOrder::default());
        let err = install_state_type_redirects(&hooks, Arc::new(TypeUniverses::new())).unwrap_err();
        assert!(matches!(err, HookError::TargetNotFound(_)));
    }
}
