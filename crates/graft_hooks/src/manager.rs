//! Hook application, removal, and chained invocation.
//!
//! The [`HookManager`] keeps, per hooked member, an ordered list of bindings.
//! Every invocation snapshots that list and runs it as a chain ending in the
//! original member, so applying or undoing a hook never needs to relink
//! neighbors explicitly.
//!
//! # Example
//!
//! ```
//! use graft_accessors::{AccessorCache, AccessorKey, Arguments, HostType, MemberTable, TypeCatalog};
//! use graft_hooks::{ChainOrder, HookManager};
//!
//! struct Turret { damage: f32 }
//!
//! impl HostType for Turret {
//!     fn describe(members: &mut MemberTable<Self>) {
//!         members.method0("fire", |t: &mut Self| t.damage);
//!     }
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register::<Turret>();
//! let hooks = HookManager::new(AccessorCache::new(catalog), ChainOrder::default());
//!
//! let fire = AccessorKey::of::<Turret>("fire");
//! let handle = hooks
//!     .apply(&fire, "double_damage", |owner, args, next| {
//!         let damage = next.call(owner, args)?;
//!         let damage = *damage.downcast::<f32>().unwrap_or_else(|_| Box::new(0.0));
//!         Ok(Box::new(damage * 2.0))
//!     })
//!     .unwrap();
//!
//! let mut turret = Turret { damage: 4.0 };
//! let member = hooks.cache().resolve(&fire).unwrap();
//! let damage: f32 = hooks.call(&member, &mut turret, Arguments::new()).unwrap();
//! assert_eq!(damage, 8.0);
//!
//! assert!(hooks.undo(&handle));
//! let damage: f32 = hooks.call(&member, &mut turret, Arguments::new()).unwrap();
//! assert_eq!(damage, 4.0);
//! ```

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use graft_accessors::{
    AccessError, AccessorCache, AccessorKey, Arguments, Dispatcher, MemberHandle, MemberKind,
    Original, Value,
};
use graft_system::api::API;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::chain::{HookFn, Next};
use crate::error::HookError;

// ─────────────────────────────────────────────────────────────────────────────
// ChainOrder
// ─────────────────────────────────────────────────────────────────────────────

/// Precedence between hooks applied to the same member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainOrder {
    /// The most recently applied hook runs first and wraps all earlier ones.
    #[default]
    LastAppliedOutermost,
    /// The earliest applied hook runs first and wraps all later ones.
    FirstAppliedOutermost,
}

// ─────────────────────────────────────────────────────────────────────────────
// HookHandle
// ─────────────────────────────────────────────────────────────────────────────

/// Unique id of an applied hook. Never reused within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook#{}", self.0)
    }
}

/// Receipt for an applied hook, needed to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookHandle {
    id: HookId,
    target: AccessorKey,
    name: String,
}

impl HookHandle {
    /// The hook's id.
    #[must_use]
    pub fn id(&self) -> HookId {
        self.id
    }

    /// The fully specified key of the hooked member.
    #[must_use]
    pub fn target(&self) -> &AccessorKey {
        &self.target
    }

    /// The name given when the hook was applied.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookManager
// ─────────────────────────────────────────────────────────────────────────────

struct Binding {
    id: HookId,
    name: String,
    handler: Arc<HookFn>,
}

struct Chain {
    /// Bindings in application order.
    bindings: Vec<Binding>,
}

struct ManagerInner {
    cache: AccessorCache,
    order: ChainOrder,
    /// Keyed by the member's fully specified key, so every way of naming the
    /// member shares one chain.
    chains: RwLock<HashMap<AccessorKey, Chain>>,
    next_id: AtomicU64,
    torn_down: AtomicBool,
}

/// Registry of active hooks.
///
/// The first hook applied to a member routes that member through this
/// manager, so every later invocation of it runs the chain, whether it
/// goes through the manager or straight through the [`MemberHandle`].
/// A member belongs to one live manager at a time.
///
/// Clones share state. Hook handlers that need to reach the manager should
/// capture a [`WeakHookManager`] from [`downgrade`](Self::downgrade).
///
/// # Thread Safety
///
/// Apply and undo take a write lock. Invocation copies the chain under a read
/// lock and runs it with no lock held, so handlers may invoke other hooked
/// members (or the same one) re-entrantly.
#[derive(Clone)]
pub struct HookManager {
    inner: Arc<ManagerInner>,
}

impl API for HookManager {}

impl HookManager {
    /// Creates a manager resolving targets through `cache`.
    #[must_use]
    pub fn new(cache: AccessorCache, order: ChainOrder) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                cache,
                order,
                chains: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    /// The accessor cache used to resolve targets.
    #[must_use]
    pub fn cache(&self) -> &AccessorCache {
        &self.inner.cache
    }

    /// The configured precedence.
    #[must_use]
    pub fn order(&self) -> ChainOrder {
        self.inner.order
    }

    /// Returns a handle that does not keep the manager alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakHookManager {
        WeakHookManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Wraps the member named by `target` with `handler`.
    ///
    /// # Errors
    ///
    /// - [`HookError::TargetNotFound`] if the member does not exist.
    /// - [`HookError::ForeignRoute`] if another live manager hooks the member.
    /// - [`HookError::InvalidLifecycleState`] after [`teardown`](Self::teardown).
    pub fn apply<F>(
        &self,
        target: &AccessorKey,
        name: impl Into<String>,
        handler: F,
    ) -> Result<HookHandle, HookError>
    where
        F: Fn(&mut dyn Any, Arguments, Next<'_>) -> Result<Value, AccessError>
            + Send
            + Sync
            + 'static,
    {
        let member = self
            .inner
            .cache
            .resolve(target)
            .ok_or_else(|| HookError::TargetNotFound(target.clone()))?;

        let name = name.into();
        let key = member.key();

        let dispatcher: Weak<dyn Dispatcher> = Arc::downgrade(&self.inner) as Weak<ManagerInner>;
        if !member.route_through(&dispatcher) {
            return Err(HookError::ForeignRoute(key));
        }

        // Checked under the lock so a concurrent teardown cannot miss this hook.
        let mut chains = self.inner.chains.write();
        if self.inner.torn_down.load(Ordering::Acquire) {
            return Err(HookError::InvalidLifecycleState {
                operation: "apply hook",
            });
        }
        let id = HookId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let chain = chains
            .entry(key.clone())
            .or_insert_with(|| Chain { bindings: Vec::new() });
        chain.bindings.push(Binding {
            id,
            name: name.clone(),
            handler: Arc::new(handler),
        });

        tracing::debug!(hook = %name, %id, target = %key, depth = chain.bindings.len(), "hook applied");

        Ok(HookHandle {
            id,
            target: key,
            name,
        })
    }

    /// Removes exactly the hook identified by `handle`.
    ///
    /// Returns `false` if it was already removed. Calls already in flight keep
    /// running the chain they started with.
    pub fn undo(&self, handle: &HookHandle) -> bool {
        let mut chains = self.inner.chains.write();
        let Some(chain) = chains.get_mut(&handle.target) else {
            return false;
        };
        let Some(position) = chain.bindings.iter().position(|b| b.id == handle.id) else {
            return false;
        };

        chain.bindings.remove(position);
        if chain.bindings.is_empty() {
            chains.remove(&handle.target);
        }
        tracing::debug!(hook = %handle.name, id = %handle.id, target = %handle.target, "hook undone");
        true
    }

    /// Invokes `member` on `owner` through its hook chain.
    ///
    /// Same as [`MemberHandle::invoke_erased`]: the chain that runs is the
    /// one of the manager the member is routed through.
    ///
    /// # Errors
    ///
    /// Whatever the handlers or the original member return.
    pub fn invoke_erased(
        &self,
        member: &MemberHandle,
        owner: &mut dyn Any,
        args: Arguments,
    ) -> Result<Value, AccessError> {
        member.invoke_erased(owner, args)
    }

    /// Invokes `member` on a typed owner and downcasts the result to `R`.
    ///
    /// # Errors
    ///
    /// See [`invoke_erased`](Self::invoke_erased); additionally
    /// [`AccessError::ValueMismatch`] if the chain does not produce an `R`.
    pub fn call<O: 'static, R: 'static>(
        &self,
        member: &MemberHandle,
        owner: &mut O,
        args: Arguments,
    ) -> Result<R, AccessError> {
        let value = self.invoke_erased(member, owner, args)?;
        member.downcast_value(value)
    }

    /// Writes a field through its hook chain.
    ///
    /// # Errors
    ///
    /// [`AccessError::WrongKind`] if `member` is a method, otherwise see
    /// [`invoke_erased`](Self::invoke_erased).
    pub fn set_field<O: 'static, T: Send + 'static>(
        &self,
        member: &MemberHandle,
        owner: &mut O,
        value: T,
    ) -> Result<(), AccessError> {
        if member.kind() != MemberKind::Field {
            return Err(AccessError::WrongKind {
                member: member.name().to_string(),
                expected: "field",
            });
        }
        self.invoke_erased(member, owner, Arguments::new().with(value))
            .map(drop)
    }

    /// Reads a field. Reads are not interceptable; only writes run hooks.
    ///
    /// # Errors
    ///
    /// See [`MemberHandle::get`].
    pub fn get_field<O: 'static, T: 'static>(
        &self,
        member: &MemberHandle,
        owner: &O,
    ) -> Result<T, AccessError> {
        member.get(owner)
    }

    /// Undoes every remaining hook and stops accepting new ones.
    ///
    /// Returns how many hooks were still applied. Calling it again returns 0.
    pub fn teardown(&self) -> usize {
        let drained: Vec<(AccessorKey, Chain)> = {
            let mut chains = self.inner.chains.write();
            self.inner.torn_down.store(true, Ordering::Release);
            chains.drain().collect()
        };

        let mut leftover = 0;
        for (target, chain) in drained {
            for binding in chain.bindings {
                tracing::warn!(hook = %binding.name, id = %binding.id, target = %target, "hook still applied at teardown");
                leftover += 1;
            }
        }
        if leftover > 0 {
            tracing::warn!(count = leftover, "undid hooks left over at teardown");
        }
        leftover
    }

    /// Returns `true` once [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }

    /// Total number of applied hooks.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.inner
            .chains
            .read()
            .values()
            .map(|chain| chain.bindings.len())
            .sum()
    }

    /// Names of the hooks on `member`, outermost first.
    #[must_use]
    pub fn hook_names(&self, member: &MemberHandle) -> Vec<String> {
        let chains = self.inner.chains.read();
        let Some(chain) = chains.get(&member.key()) else {
            return Vec::new();
        };
        let names = chain.bindings.iter().map(|b| b.name.clone());
        match self.inner.order {
            ChainOrder::LastAppliedOutermost => names.rev().collect(),
            ChainOrder::FirstAppliedOutermost => names.collect(),
        }
    }

}

impl ManagerInner {
    /// Handlers of `member`'s chain, outermost first.
    fn snapshot(&self, member: &MemberHandle) -> Vec<Arc<HookFn>> {
        let chains = self.chains.read();
        let Some(chain) = chains.get(&member.key()) else {
            return Vec::new();
        };
        let handlers = chain.bindings.iter().map(|b| Arc::clone(&b.handler));
        match self.order {
            ChainOrder::LastAppliedOutermost => handlers.rev().collect(),
            ChainOrder::FirstAppliedOutermost => handlers.collect(),
        }
    }
}

impl Dispatcher for ManagerInner {
    fn dispatch(
        &self,
        original: Original<'_>,
        owner: &mut dyn Any,
        args: Arguments,
    ) -> Result<Value, AccessError> {
        // The snapshot's read lock is released before any handler runs.
        let handlers = self.snapshot(original.member());
        Next::new(&handlers, original).call(owner, args)
    }
}

impl fmt::Debug for HookManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookManager")
            .field("order", &self.inner.order)
            .field("hooks", &self.hook_count())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

/// Non-owning reference to a [`HookManager`].
#[derive(Clone)]
pub struct WeakHookManager {
    inner: Weak<ManagerInner>,
}

impl WeakHookManager {
    /// Returns the manager if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<HookManager> {
        self.inner.upgrade().map(|inner| HookManager { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_accessors::{HostType, MemberTable, TypeCatalog, TypeKey};

    #[derive(Default)]
    struct Counter {
        value: i64,
    }

    impl HostType for Counter {
        fn describe(members: &mut MemberTable<Self>) {
            members
                .field("value", |c| &c.value, |c| &mut c.value)
                .method1("add", |c: &mut Self, by: i64| {
                    c.value += by;
                    c.value
                });
        }
    }

    fn manager(order: ChainOrder) -> HookManager {
        let mut catalog = TypeCatalog::new();
        catalog.register::<Counter>();
        HookManager::new(AccessorCache::new(catalog), order)
    }

    fn add(hooks: &HookManager) -> MemberHandle {
        hooks.cache().resolve_in::<Counter>("add").unwrap()
    }

    fn scaling(
        factor: i64,
    ) -> impl Fn(&mut dyn Any, Arguments, Next<'_>) -> Result<Value, AccessError> + Send + Sync + 'static
    {
        move |owner: &mut dyn Any, mut args: Arguments, next: Next<'_>| {
            if let Some(by) = args.get_mut::<i64>(0) {
                *by *= factor;
            }
            next.call(owner, args)
        }
    }

    #[test]
    fn missing_target_is_rejected() {
        let hooks = manager(ChainOrder::default());
        let key = AccessorKey::of::<Counter>("subtract");
        let err = hooks.apply(&key, "nope", scaling(2)).unwrap_err();
        assert_eq!(err, HookError::TargetNotFound(key));
        assert_eq!(hooks.hook_count(), 0);
    }

    #[test]
    fn hook_rewrites_arguments() {
        let hooks = manager(ChainOrder::default());
        let member = add(&hooks);
        hooks.apply(&AccessorKey::of::<Counter>("add"), "triple", scaling(3)).unwrap();

        let mut counter = Counter::default();
        let value: i64 = hooks.call(&member, &mut counter, Arguments::new().with(2_i64)).unwrap();
        assert_eq!(value, 6);
    }

    #[test]
    fn differently_named_keys_share_one_chain() {
        let hooks = manager(ChainOrder::default());
        let loose = AccessorKey::of::<Counter>("add");
        let exact = AccessorKey::of::<Counter>("add").with_arguments([TypeKey::of::<i64>()]);

        let first = hooks.apply(&loose, "a", scaling(2)).unwrap();
        let second = hooks.apply(&exact, "b", scaling(5)).unwrap();
        assert_eq!(first.target(), second.target());
        assert_eq!(hooks.hook_names(&add(&hooks)), vec!["b", "a"]);
    }

    #[test]
    fn order_policy_controls_nesting() {
        for (order, expected) in [
            (ChainOrder::LastAppliedOutermost, vec!["second", "first"]),
            (ChainOrder::FirstAppliedOutermost, vec!["first", "second"]),
        ] {
            let hooks = manager(order);
            let key = AccessorKey::of::<Counter>("add");
            hooks.apply(&key, "first", scaling(1)).unwrap();
            hooks.apply(&key, "second", scaling(1)).unwrap();
            assert_eq!(hooks.hook_names(&add(&hooks)), expected);
        }
    }

    #[test]
    fn double_undo_returns_false() {
        let hooks = manager(ChainOrder::default());
        let handle = hooks.apply(&AccessorKey::of::<Counter>("add"), "x", scaling(2)).unwrap();
        assert!(hooks.undo(&handle));
        assert!(!hooks.undo(&handle));
        assert_eq!(hooks.hook_count(), 0);
    }

    #[test]
    fn field_writes_run_hooks_and_reads_do_not() {
        let hooks = manager(ChainOrder::default());
        let value = hooks.cache().resolve_in::<Counter>("value").unwrap();
        hooks
            .apply(&AccessorKey::of::<Counter>("value"), "clamp", |owner, mut args, next| {
                if let Some(v) = args.get_mut::<i64>(0) {
                    *v = (*v).clamp(0, 100);
                }
                next.call(owner, args)
            })
            .unwrap();

        let mut counter = Counter::default();
        hooks.set_field(&value, &mut counter, 250_i64).unwrap();
        assert_eq!(hooks.get_field::<_, i64>(&value, &counter).unwrap(), 100);

        let add = add(&hooks);
        assert!(matches!(
            hooks.set_field(&add, &mut counter, 1_i64),
            Err(AccessError::WrongKind { .. })
        ));
    }

    #[test]
    fn teardown_undoes_everything_and_blocks_apply() {
        let hooks = manager(ChainOrder::default());
        let key = AccessorKey::of::<Counter>("add");
        let handle = hooks.apply(&key, "a", scaling(2)).unwrap();
        hooks.apply(&key, "b", scaling(2)).unwrap();

        assert_eq!(hooks.teardown(), 2);
        assert_eq!(hooks.teardown(), 0);
        assert!(hooks.is_torn_down());
        assert!(!hooks.undo(&handle));
        assert!(matches!(
            hooks.apply(&key, "late", scaling(2)),
            Err(HookError::InvalidLifecycleState { .. })
        ));

        let mut counter = Counter::default();
        let value: i64 = hooks.call(&add(&hooks), &mut counter, Arguments::new().with(1_i64)).unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn handle_invocations_run_the_chain() {
        let hooks = manager(ChainOrder::default());
        let member = add(&hooks);
        hooks.apply(&AccessorKey::of::<Counter>("add"), "triple", scaling(3)).unwrap();

        let mut counter = Counter::default();
        let value: i64 = member.call(&mut counter, Arguments::new().with(2_i64)).unwrap();
        assert_eq!(value, 6);
        member.invoke(&mut counter, Arguments::new().with(1_i64)).unwrap();
        assert_eq!(counter.value, 9);
    }

    #[test]
    fn member_belongs_to_one_live_manager() {
        let hooks = manager(ChainOrder::default());
        let key = AccessorKey::of::<Counter>("add");
        hooks.apply(&key, "a", scaling(2)).unwrap();

        let rival = HookManager::new(hooks.cache().clone(), ChainOrder::default());
        assert!(matches!(
            rival.apply(&key, "b", scaling(5)),
            Err(HookError::ForeignRoute(_))
        ));
        assert_eq!(rival.hook_count(), 0);

        let cache = hooks.cache().clone();
        drop(hooks);
        let successor = HookManager::new(cache, ChainOrder::default());
        successor.apply(&key, "c", scaling(5)).unwrap();

        let mut counter = Counter::default();
        let value: i64 = successor
            .call(&add(&successor), &mut counter, Arguments::new().with(1_i64))
            .unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn weak_handle_does_not_keep_manager_alive() {
        let hooks = manager(ChainOrder::default());
        let weak = hooks.downgrade();
        assert!(weak.upgrade().is_some());
        drop(hooks);
        assert!(weak.upgrade().is_none());
    }
}
