//! Monotonic identifiers appended after the host's own.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::IdError;

/// An identifier reserved by an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(u32);

impl Identifier {
    /// The raw value.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Identifier> for u32 {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IdentifierSource
// ─────────────────────────────────────────────────────────────────────────────

/// Reports how many identifiers the host itself uses.
pub trait IdentifierSource: Send + Sync + 'static {
    /// The host's count, or `None` if the host is not far enough along in
    /// its initialization to know it.
    fn identifier_count(&self) -> Option<u32>;
}

impl<S: IdentifierSource + ?Sized> IdentifierSource for Arc<S> {
    fn identifier_count(&self) -> Option<u32> {
        (**self).identifier_count()
    }
}

/// Write-once count published by the host.
///
/// Clones share the latch, so the host keeps one clone and hands another to
/// the namespace.
///
/// ```
/// use graft_ids::{HostCount, IdentifierNamespace};
///
/// let count = HostCount::new();
/// let buffs = IdentifierNamespace::new("buff", count.clone());
/// assert!(buffs.reserve().is_err());
///
/// count.publish(50);
/// assert_eq!(buffs.reserve().unwrap().value(), 51);
/// assert_eq!(buffs.reserve().unwrap().value(), 52);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HostCount(Arc<OnceLock<u32>>);

impl HostCount {
    /// Creates an unpublished count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an already published count.
    #[must_use]
    pub fn published(count: u32) -> Self {
        let latch = Self::new();
        latch.publish(count);
        latch
    }

    /// Publishes the host count. Only the first call has an effect; returns
    /// `false` for later ones.
    pub fn publish(&self, count: u32) -> bool {
        let published = self.0.set(count).is_ok();
        if !published {
            tracing::warn!(count, "host identifier count already published; ignoring");
        }
        published
    }

    /// The published count.
    #[must_use]
    pub fn get(&self) -> Option<u32> {
        self.0.get().copied()
    }
}

impl IdentifierSource for HostCount {
    fn identifier_count(&self) -> Option<u32> {
        self.get()
    }
}

/// Adapts a closure into an [`IdentifierSource`].
#[derive(Clone)]
pub struct SourceFn<F>(pub F);

impl<F> IdentifierSource for SourceFn<F>
where
    F: Fn() -> Option<u32> + Send + Sync + 'static,
{
    fn identifier_count(&self) -> Option<u32> {
        (self.0)()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IdentifierNamespace
// ─────────────────────────────────────────────────────────────────────────────

struct Counter {
    first: u64,
    /// Next value to hand out; exceeds `u32::MAX` once exhausted.
    next: AtomicU64,
}

/// A monotonically increasing identifier counter seeded from the host.
///
/// The first reservation reads the host count `n` and hands out `n + 1`;
/// each later reservation hands out the next value. Identifiers are never
/// reused, including across failed calls.
pub struct IdentifierNamespace {
    name: &'static str,
    source: Box<dyn IdentifierSource>,
    counter: OnceLock<Counter>,
}

impl IdentifierNamespace {
    /// Creates an unseeded namespace reading the host count from `source`.
    #[must_use]
    pub fn new(name: &'static str, source: impl IdentifierSource) -> Self {
        Self {
            name,
            source: Box::new(source),
            counter: OnceLock::new(),
        }
    }

    /// The namespace name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Reserves the next identifier.
    ///
    /// # Errors
    ///
    /// - [`IdError::InvalidLifecycleState`] if the host count is not known
    ///   yet. The namespace stays unseeded, so a later call can succeed.
    /// - [`IdError::Exhausted`] once `u32::MAX` has been handed out.
    pub fn reserve(&self) -> Result<Identifier, IdError> {
        let counter = self.counter()?;
        counter
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                (next <= u64::from(u32::MAX)).then_some(next + 1)
            })
            .ok()
            .and_then(|reserved| u32::try_from(reserved).ok())
            .map(Identifier)
            .ok_or(IdError::Exhausted {
                namespace: self.name,
            })
    }

    /// Returns `true` once the first reservation has read the host count.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.counter.get().is_some()
    }

    /// The first identifier this namespace hands out, once seeded.
    #[must_use]
    pub fn first_identifier(&self) -> Option<Identifier> {
        let first = self.counter.get()?.first;
        u32::try_from(first).ok().map(Identifier)
    }

    /// Number of identifiers reserved so far.
    #[must_use]
    pub fn reserved_count(&self) -> u64 {
        self.counter.get().map_or(0, |counter| {
            let next = counter.next.load(Ordering::Acquire);
            next.saturating_sub(counter.first)
        })
    }

    fn counter(&self) -> Result<&Counter, IdError> {
        if let Some(counter) = self.counter.get() {
            return Ok(counter);
        }

        let Some(count) = self.source.identifier_count() else {
            tracing::debug!(namespace = self.name, "identifier reservation before host count is known");
            return Err(IdError::InvalidLifecycleState {
                namespace: self.name,
            });
        };

        Ok(self.counter.get_or_init(|| {
            let first = u64::from(count) + 1;
            tracing::debug!(namespace = self.name, host_count = count, first, "identifier namespace seeded");
            Counter {
                first,
                next: AtomicU64::new(first),
            }
        }))
    }
}

impl fmt::Debug for IdentifierNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierNamespace")
            .field("name", &self.name)
            .field("first", &self.first_identifier())
            .field("reserved", &self.reserved_count())
            .finish()
    }
}
