//! One content broadcast per host container type.

use core::any::{Any, TypeId};
use std::sync::Arc;

use graft_system::api::API;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::broadcast::{ContentBroadcast, MergeOutcome};
use crate::error::{ContentError, ProducerError};

type BoxedBroadcast = Arc<dyn Any + Send + Sync>;

/// Registry of content broadcasts, keyed by container type.
///
/// Each host list (buffs, items, skills, ...) has its own container type and
/// therefore its own merge moment.
///
/// ```
/// use graft_content::ContentAPI;
///
/// struct BuffCatalog(Vec<&'static str>);
///
/// let content = ContentAPI::new();
/// content
///     .register_producer::<BuffCatalog>("zeta_mod", |catalog| {
///         catalog.0.push("ZetaShield");
///         Ok(())
///     })
///     .unwrap();
///
/// let outcome = content
///     .merge(BuffCatalog(vec!["Slow"]), |catalog| catalog.0)
///     .unwrap();
/// assert_eq!(outcome.output, vec!["Slow", "ZetaShield"]);
/// ```
#[derive(Default)]
pub struct ContentAPI {
    broadcasts: RwLock<HashMap<TypeId, BoxedBroadcast>>,
}

impl API for ContentAPI {}

impl ContentAPI {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the broadcast for container type `C`, creating it on first use.
    #[must_use]
    pub fn broadcast<C: 'static>(&self) -> Arc<ContentBroadcast<C>> {
        let id = TypeId::of::<C>();
        let existing = self.broadcasts.read().get(&id).cloned();
        let boxed = match existing {
            Some(boxed) => boxed,
            None => Arc::clone(
                self.broadcasts
                    .write()
                    .entry(id)
                    .or_insert_with(|| Arc::new(ContentBroadcast::<C>::new()) as BoxedBroadcast),
            ),
        };
        match boxed.downcast::<ContentBroadcast<C>>() {
            Ok(broadcast) => broadcast,
            // Entries are only ever inserted under their own container's TypeId.
            Err(_) => unreachable!("content broadcast stored under a foreign TypeId"),
        }
    }

    /// Registers a producer for container type `C`.
    ///
    /// # Errors
    ///
    /// See [`ContentBroadcast::register_producer`].
    pub fn register_producer<C: 'static>(
        &self,
        name: impl Into<String>,
        callback: impl FnOnce(&mut C) -> Result<(), ProducerError> + Send + 'static,
    ) -> Result<(), ContentError> {
        self.broadcast::<C>().register_producer(name, callback)
    }

    /// Merges content into `container`.
    ///
    /// # Errors
    ///
    /// See [`ContentBroadcast::merge`].
    pub fn merge<C: 'static, R>(
        &self,
        container: C,
        consume: impl FnOnce(C) -> R,
    ) -> Result<MergeOutcome<R>, ContentError> {
        self.broadcast::<C>().merge(container, consume)
    }

    /// Number of container types with a broadcast.
    #[must_use]
    pub fn len(&self) -> usize {
        self.broadcasts.read().len()
    }

    /// Returns `true` if no broadcast exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for ContentAPI {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContentAPI")
            .field("broadcasts", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Buffs(Vec<u32>);
    struct Items(Vec<u32>);

    #[test]
    fn broadcasts_are_per_container_type() {
        let content = ContentAPI::new();
        assert!(Arc::ptr_eq(&content.broadcast::<Buffs>(), &content.broadcast::<Buffs>()));

        content
            .register_producer::<Buffs>("b", |buffs| {
                buffs.0.push(1);
                Ok(())
            })
            .unwrap();
        content.merge(Buffs(Vec::new()), drop).unwrap();

        // Items still accepts producers after Buffs merged.
        content
            .register_producer::<Items>("i", |items| {
                items.0.push(2);
                Ok(())
            })
            .unwrap();
        let outcome = content.merge(Items(Vec::new()), |items| items.0).unwrap();
        assert_eq!(outcome.output, vec![2]);
        assert_eq!(content.len(), 2);
    }
}
