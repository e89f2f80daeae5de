//! Typed member descriptions and resolved member handles.
//!
//! A host type opts into member lookup by implementing [`HostType`] and
//! declaring its fields and methods in a [`MemberTable`]. Lookups then hand
//! out [`MemberHandle`]s, which can read, write, or invoke the member on any
//! instance of the owner type.
//!
//! ```
//! use graft_accessors::{Arguments, HostType, MemberTable, TypeCatalog, AccessorKey, MemberResolver};
//!
//! #[derive(Default)]
//! struct CharacterBody {
//!     base_max_health: f32,
//!     health: f32,
//! }
//!
//! impl HostType for CharacterBody {
//!     fn describe(members: &mut MemberTable<Self>) {
//!         members
//!             .field("base_max_health", |b| &b.base_max_health, |b| &mut b.base_max_health)
//!             .method1("heal", |b: &mut Self, amount: f32| {
//!                 b.health = (b.health + amount).min(b.base_max_health);
//!                 b.health
//!             });
//!     }
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register::<CharacterBody>();
//!
//! let mut body = CharacterBody::default();
//! let max = catalog.resolve(&AccessorKey::of::<CharacterBody>("base_max_health")).unwrap();
//! max.set(&mut body, 110.0_f32).unwrap();
//!
//! let heal = catalog.resolve(&AccessorKey::of::<CharacterBody>("heal")).unwrap();
//! let healed: f32 = heal.call(&mut body, Arguments::new().with(25.0_f32)).unwrap();
//! assert_eq!(healed, 25.0);
//! ```

use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::AccessError;
use crate::key::{AccessorKey, TypeKey};

/// A type-erased value passed to or returned from a member.
pub type Value = Box<dyn Any + Send>;

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, type-erased argument list for a member invocation.
///
/// Hooks receive the arguments by value and may inspect or replace them
/// before delegating to the next handler.
#[derive(Default)]
pub struct Arguments {
    values: Vec<Value>,
    signature: Vec<TypeKey>,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    #[must_use]
    pub fn with<T: Send + 'static>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Appends an argument in place.
    pub fn push<T: Send + 'static>(&mut self, value: T) {
        self.values.push(Box::new(value));
        self.signature.push(TypeKey::of::<T>());
    }

    /// Returns the argument at `index` if it is a `T`.
    #[must_use]
    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Returns the argument at `index` mutably if it is a `T`.
    pub fn get_mut<T: 'static>(&mut self, index: usize) -> Option<&mut T> {
        self.values.get_mut(index)?.downcast_mut::<T>()
    }

    /// Replaces the argument at `index`, possibly with a value of another type.
    ///
    /// Returns `false` if `index` is out of range.
    pub fn replace<T: Send + 'static>(&mut self, index: usize, value: T) -> bool {
        match (self.values.get_mut(index), self.signature.get_mut(index)) {
            (Some(slot), Some(ty)) => {
                *slot = Box::new(value);
                *ty = TypeKey::of::<T>();
                true
            }
            _ => false,
        }
    }

    /// Types of the arguments, in order.
    #[must_use]
    pub fn signature(&self) -> &[TypeKey] {
        &self.signature
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.signature.iter()).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Member
// ─────────────────────────────────────────────────────────────────────────────

/// What kind of member a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A field. Invoking it writes the single argument into the field.
    Field,
    /// A method.
    Method,
}

impl MemberKind {
    fn as_str(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
        }
    }
}

/// Low-level failure inside an accessor closure, enriched by the handle.
enum Fault {
    Owner,
    Argument(usize),
}

type Reader = dyn Fn(&dyn Any) -> Option<Value> + Send + Sync;
type Invoker = dyn Fn(&mut dyn Any, Vec<Value>) -> Result<Value, Fault> + Send + Sync;

struct Member {
    owner: TypeKey,
    name: String,
    kind: MemberKind,
    arguments: Vec<TypeKey>,
    returns: TypeKey,
    read: Option<Box<Reader>>,
    invoke: Box<Invoker>,
    /// Dispatcher that every invocation is handed to, once installed.
    route: RwLock<Option<Weak<dyn Dispatcher>>>,
}

/// A resolved, directly usable reference to a host member.
///
/// Cloning is cheap. Two handles are equal when they refer to the same
/// declared member.
#[derive(Clone)]
pub struct MemberHandle(Arc<Member>);

impl MemberHandle {
    /// The type that declares this member.
    #[must_use]
    pub fn owner(&self) -> TypeKey {
        self.0.owner
    }

    /// The member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Field or method.
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        self.0.kind
    }

    /// Declared argument types. A field takes its own type as the only argument.
    #[must_use]
    pub fn arguments(&self) -> &[TypeKey] {
        &self.0.arguments
    }

    /// Type of the value an invocation returns (`()` for field writes).
    #[must_use]
    pub fn returns(&self) -> TypeKey {
        self.0.returns
    }

    /// The fully specified key of this member.
    #[must_use]
    pub fn key(&self) -> AccessorKey {
        AccessorKey::new(self.0.owner, self.0.name.clone()).with_arguments(self.0.arguments.clone())
    }

    /// Returns `true` if both handles refer to the same declared member.
    #[must_use]
    pub fn same_member(&self, other: &MemberHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Reads a field, cloning its value.
    ///
    /// # Errors
    ///
    /// [`AccessError::WrongKind`] for methods, [`AccessError::OwnerMismatch`]
    /// if `owner` is not an instance of the owner type.
    pub fn read_erased(&self, owner: &dyn Any) -> Result<Value, AccessError> {
        let read = self.0.read.as_ref().ok_or_else(|| self.wrong_kind(MemberKind::Field))?;
        read(owner).ok_or_else(|| self.fault(Fault::Owner))
    }

    /// Invokes the member: calls a method, or writes a field.
    ///
    /// If the member is routed through a [`Dispatcher`], the invocation goes
    /// to the dispatcher instead, so hooks installed there always run.
    ///
    /// # Errors
    ///
    /// Arity, argument type, and owner type are checked before the member
    /// itself runs. Dispatchers may add their own errors.
    pub fn invoke_erased(&self, owner: &mut dyn Any, args: Arguments) -> Result<Value, AccessError> {
        let dispatcher = self.0.route.read().as_ref().and_then(Weak::upgrade);
        match dispatcher {
            Some(dispatcher) => dispatcher.dispatch(Original { member: self }, owner, args),
            None => self.invoke_unrouted(owner, args),
        }
    }

    /// Routes every later invocation of this member through `dispatcher`.
    ///
    /// A member has at most one live dispatcher. Returns `false` if another
    /// dispatcher that is still alive already owns the route.
    pub fn route_through(&self, dispatcher: &Weak<dyn Dispatcher>) -> bool {
        let mut route = self.0.route.write();
        match route.as_ref() {
            Some(current) if current.strong_count() > 0 && !Weak::ptr_eq(current, dispatcher) => {
                false
            }
            _ => {
                *route = Some(Weak::clone(dispatcher));
                true
            }
        }
    }

    /// Returns `true` if invocations currently go to a live dispatcher.
    #[must_use]
    pub fn is_routed(&self) -> bool {
        self.0
            .route
            .read()
            .as_ref()
            .is_some_and(|dispatcher| dispatcher.strong_count() > 0)
    }

    fn invoke_unrouted(&self, owner: &mut dyn Any, args: Arguments) -> Result<Value, AccessError> {
        if args.len() != self.0.arguments.len() {
            return Err(AccessError::ArityMismatch {
                member: self.0.name.clone(),
                expected: self.0.arguments.len(),
                actual: args.len(),
            });
        }
        (self.0.invoke)(owner, args.into_values()).map_err(|fault| self.fault(fault))
    }

    /// Reads a field as `T`.
    ///
    /// # Errors
    ///
    /// See [`read_erased`](Self::read_erased); additionally
    /// [`AccessError::ValueMismatch`] if the field is not a `T`.
    pub fn get<O: 'static, T: 'static>(&self, owner: &O) -> Result<T, AccessError> {
        let value = self.read_erased(owner)?;
        self.downcast_value(value)
    }

    /// Writes a field, through its dispatcher if the member is routed.
    ///
    /// # Errors
    ///
    /// See [`invoke_erased`](Self::invoke_erased).
    pub fn set<O: 'static, T: Send + 'static>(&self, owner: &mut O, value: T) -> Result<(), AccessError> {
        if self.0.kind != MemberKind::Field {
            return Err(self.wrong_kind(MemberKind::Field));
        }
        self.invoke_erased(owner, Arguments::new().with(value))
            .map(drop)
    }

    /// Invokes the member on a typed owner.
    ///
    /// # Errors
    ///
    /// See [`invoke_erased`](Self::invoke_erased).
    pub fn invoke<O: 'static>(&self, owner: &mut O, args: Arguments) -> Result<Value, AccessError> {
        self.invoke_erased(owner, args)
    }

    /// Invokes a method and downcasts its return value to `R`.
    ///
    /// # Errors
    ///
    /// See [`invoke_erased`](Self::invoke_erased); additionally
    /// [`AccessError::ValueMismatch`] if the method does not return an `R`.
    pub fn call<O: 'static, R: 'static>(&self, owner: &mut O, args: Arguments) -> Result<R, AccessError> {
        if self.0.kind != MemberKind::Method {
            return Err(self.wrong_kind(MemberKind::Method));
        }
        let value = self.invoke_erased(owner, args)?;
        self.downcast_value(value)
    }

    /// Downcasts a value produced by this member.
    ///
    /// # Errors
    ///
    /// [`AccessError::ValueMismatch`] if `value` is not a `T`.
    pub fn downcast_value<T: 'static>(&self, value: Value) -> Result<T, AccessError> {
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| AccessError::ValueMismatch {
                member: self.0.name.clone(),
                requested: TypeKey::of::<T>(),
            })
    }

    fn wrong_kind(&self, expected: MemberKind) -> AccessError {
        AccessError::WrongKind {
            member: self.0.name.clone(),
            expected: expected.as_str(),
        }
    }

    fn fault(&self, fault: Fault) -> AccessError {
        match fault {
            Fault::Owner => AccessError::OwnerMismatch {
                member: self.0.name.clone(),
                expected: self.0.owner,
            },
            Fault::Argument(index) => AccessError::ArgumentMismatch {
                member: self.0.name.clone(),
                index,
                expected: self.0.arguments[index],
            },
        }
    }
}

impl PartialEq for MemberHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_member(other)
    }
}

impl Eq for MemberHandle {}

impl fmt::Debug for MemberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberHandle")
            .field("owner", &self.0.owner.type_name())
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("arguments", &self.0.arguments)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Receives every invocation of the members routed through it.
///
/// The hook manager is the dispatcher in practice: it runs the member's hook
/// chain and ends it with [`Original::call`].
pub trait Dispatcher: Send + Sync + 'static {
    /// Handles one invocation of `original.member()`.
    ///
    /// # Errors
    ///
    /// Whatever the dispatcher or the member returns.
    fn dispatch(
        &self,
        original: Original<'_>,
        owner: &mut dyn Any,
        args: Arguments,
    ) -> Result<Value, AccessError>;
}

/// Permission to run a member without its dispatcher.
///
/// Only [`MemberHandle::invoke_erased`] creates one, and only to pass it to
/// the member's dispatcher.
#[derive(Clone, Copy)]
pub struct Original<'a> {
    member: &'a MemberHandle,
}

impl<'a> Original<'a> {
    /// The member being invoked.
    #[must_use]
    pub fn member(&self) -> &'a MemberHandle {
        self.member
    }

    /// Runs the member itself.
    ///
    /// # Errors
    ///
    /// See [`MemberHandle::invoke_erased`].
    pub fn call(self, owner: &mut dyn Any, args: Arguments) -> Result<Value, AccessError> {
        self.member.invoke_unrouted(owner, args)
    }
}

impl fmt::Debug for Original<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Original").field(self.member).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HostType / MemberTable
// ─────────────────────────────────────────────────────────────────────────────

/// A host type whose members can be looked up by name.
///
/// Implementations declare members in order; when a lookup does not specify
/// an argument signature, the first declared member with the name wins.
pub trait HostType: Any + Send + Sync + Sized {
    /// Declares this type's members.
    fn describe(members: &mut MemberTable<Self>);
}

/// Builder collecting the members of host type `O`.
pub struct MemberTable<O> {
    members: Vec<MemberHandle>,
    _owner: PhantomData<fn() -> O>,
}

fn take_argument<A: 'static>(
    values: &mut std::vec::IntoIter<Value>,
    index: usize,
) -> Result<A, Fault> {
    values
        .next()
        .ok_or(Fault::Argument(index))?
        .downcast::<A>()
        .map(|boxed| *boxed)
        .map_err(|_| Fault::Argument(index))
}

impl<O: HostType> MemberTable<O> {
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
            _owner: PhantomData,
        }
    }

    pub(crate) fn into_members(self) -> Vec<MemberHandle> {
        self.members
    }

    /// Declares a field of type `T`.
    pub fn field<T, G, M>(&mut self, name: &str, get: G, get_mut: M) -> &mut Self
    where
        T: Clone + Send + 'static,
        G: Fn(&O) -> &T + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut T + Send + Sync + 'static,
    {
        let read = move |owner: &dyn Any| -> Option<Value> {
            owner
                .downcast_ref::<O>()
                .map(|owner| Box::new(get(owner).clone()) as Value)
        };
        let write = move |owner: &mut dyn Any, values: Vec<Value>| -> Result<Value, Fault> {
            let owner = owner.downcast_mut::<O>().ok_or(Fault::Owner)?;
            let value = take_argument::<T>(&mut values.into_iter(), 0)?;
            *get_mut(owner) = value;
            Ok(Box::new(()))
        };
        self.push(Member {
            owner: TypeKey::of::<O>(),
            name: name.to_string(),
            kind: MemberKind::Field,
            arguments: vec![TypeKey::of::<T>()],
            returns: TypeKey::of::<()>(),
            read: Some(Box::new(read)),
            invoke: Box::new(write),
            route: RwLock::new(None),
        })
    }

    /// Declares a method without arguments.
    pub fn method0<R, F>(&mut self, name: &str, method: F) -> &mut Self
    where
        R: Send + 'static,
        F: Fn(&mut O) -> R + Send + Sync + 'static,
    {
        let invoke = move |owner: &mut dyn Any, _values: Vec<Value>| -> Result<Value, Fault> {
            let owner = owner.downcast_mut::<O>().ok_or(Fault::Owner)?;
            Ok(Box::new(method(owner)))
        };
        self.push_method::<R>(name, Vec::new(), Box::new(invoke))
    }

    /// Declares a method taking one argument.
    pub fn method1<A, R, F>(&mut self, name: &str, method: F) -> &mut Self
    where
        A: Send + 'static,
        R: Send + 'static,
        F: Fn(&mut O, A) -> R + Send + Sync + 'static,
    {
        let invoke = move |owner: &mut dyn Any, values: Vec<Value>| -> Result<Value, Fault> {
            let owner = owner.downcast_mut::<O>().ok_or(Fault::Owner)?;
            let mut values = values.into_iter();
            let a = take_argument::<A>(&mut values, 0)?;
            Ok(Box::new(method(owner, a)))
        };
        self.push_method::<R>(name, vec![TypeKey::of::<A>()], Box::new(invoke))
    }

    /// Declares a method taking two arguments.
    pub fn method2<A, B, R, F>(&mut self, name: &str, method: F) -> &mut Self
    where
        A: Send + 'static,
        B: Send + 'static,
        R: Send + 'static,
        F: Fn(&mut O, A, B) -> R + Send + Sync + 'static,
    {
        let invoke = move |owner: &mut dyn Any, values: Vec<Value>| -> Result<Value, Fault> {
            let owner = owner.downcast_mut::<O>().ok_or(Fault::Owner)?;
            let mut values = values.into_iter();
            let a = take_argument::<A>(&mut values, 0)?;
            let b = take_argument::<B>(&mut values, 1)?;
            Ok(Box::new(method(owner, a, b)))
        };
        self.push_method::<R>(
            name,
            vec![TypeKey::of::<A>(), TypeKey::of::<B>()],
            Box::new(invoke),
        )
    }

    fn push_method<R: 'static>(
        &mut self,
        name: &str,
        arguments: Vec<TypeKey>,
        invoke: Box<Invoker>,
    ) -> &mut Self {
        self.push(Member {
            owner: TypeKey::of::<O>(),
            name: name.to_string(),
            kind: MemberKind::Method,
            arguments,
            returns: TypeKey::of::<R>(),
            read: None,
            invoke,
            route: RwLock::new(None),
        })
    }

    fn push(&mut self, member: Member) -> &mut Self {
        self.members.push(MemberHandle(Arc::new(member)));
        self
    }
}
