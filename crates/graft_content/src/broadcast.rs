//! One-shot fan-out of a host container to registered content producers.
//!
//! The host builds a container (for example the list of buff definitions),
//! hands it to [`ContentBroadcast::merge`], and every registered producer
//! appends to it exactly once before the host consumes the result.
//!
//! ```
//! use graft_content::ContentBroadcast;
//!
//! let broadcast = ContentBroadcast::<Vec<String>>::new();
//! broadcast
//!     .register_producer("zeta_mod", |buffs| {
//!         buffs.push("ZetaShield".to_string());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let host = vec!["Slow".to_string()];
//! let outcome = broadcast.merge(host, |buffs| buffs.len()).unwrap();
//! assert_eq!(outcome.output, 2);
//! assert!(outcome.is_clean());
//! ```

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::panic::{AssertUnwindSafe, catch_unwind};

use parking_lot::Mutex;

use crate::error::{ContentError, ProducerError, ProducerFailure};

type Callback<C> = Box<dyn FnOnce(&mut C) -> Result<(), ProducerError> + Send>;

struct Producer<C> {
    name: String,
    callback: Callback<C>,
}

/// Result of a merge.
#[derive(Debug)]
pub struct MergeOutcome<R> {
    /// What the host's `consume` continuation returned.
    pub output: R,
    /// Producers that returned an error or panicked, in run order.
    pub failures: Vec<ProducerFailure>,
    /// Number of producers that ran, including failed ones.
    pub producers_run: usize,
}

impl<R> MergeOutcome<R> {
    /// Returns `true` if every producer succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Collects producers for container type `C` and runs them once.
pub struct ContentBroadcast<C> {
    producers: Mutex<Vec<Producer<C>>>,
    merged: AtomicBool,
}

impl<C: 'static> Default for ContentBroadcast<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> ContentBroadcast<C> {
    /// Creates a broadcast with no producers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            producers: Mutex::new(Vec::new()),
            merged: AtomicBool::new(false),
        }
    }

    fn container_name() -> &'static str {
        core::any::type_name::<C>()
    }

    /// Registers a producer. Producers run in registration order.
    ///
    /// # Errors
    ///
    /// [`ContentError::InvalidLifecycleState`] if the merge already happened.
    pub fn register_producer<F>(&self, name: impl Into<String>, callback: F) -> Result<(), ContentError>
    where
        F: FnOnce(&mut C) -> Result<(), ProducerError> + Send + 'static,
    {
        let name = name.into();
        let mut producers = self.producers.lock();
        if self.merged.load(Ordering::Acquire) {
            tracing::warn!(producer = %name, container = Self::container_name(), "producer registered after merge");
            return Err(ContentError::InvalidLifecycleState {
                producer: name,
                container: Self::container_name(),
            });
        }
        tracing::trace!(producer = %name, container = Self::container_name(), "content producer registered");
        producers.push(Producer {
            name,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Runs every producer against `container`, then hands it to `consume`.
    ///
    /// A failing or panicking producer is logged and recorded in the
    /// outcome; the others still run and `consume` is always called.
    /// Edits a producer made to the container before failing are kept.
    ///
    /// # Errors
    ///
    /// [`ContentError::AlreadyMerged`] on every call after the first.
    pub fn merge<R>(
        &self,
        mut container: C,
        consume: impl FnOnce(C) -> R,
    ) -> Result<MergeOutcome<R>, ContentError> {
        let producers = {
            let mut producers = self.producers.lock();
            if self.merged.swap(true, Ordering::AcqRel) {
                return Err(ContentError::AlreadyMerged {
                    container: Self::container_name(),
                });
            }
            core::mem::take(&mut *producers)
        };

        let producers_run = producers.len();
        let mut failures = Vec::new();
        for Producer { name, callback } in producers {
            let failure = match catch_unwind(AssertUnwindSafe(|| callback(&mut container))) {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some((err.to_string(), false)),
                Err(payload) => Some((panic_message(payload.as_ref()), true)),
            };
            if let Some((message, panicked)) = failure {
                let failure = ProducerFailure {
                    producer: name,
                    message,
                    panicked,
                };
                tracing::error!(
                    producer = %failure.producer,
                    container = Self::container_name(),
                    panicked,
                    error = %failure.message,
                    "content producer failed"
                );
                failures.push(failure);
            }
        }

        tracing::debug!(
            container = Self::container_name(),
            producers = producers_run,
            failed = failures.len(),
            "content merged"
        );

        Ok(MergeOutcome {
            output: consume(container),
            failures,
            producers_run,
        })
    }

    /// Number of producers waiting for the merge.
    #[must_use]
    pub fn producer_count(&self) -> usize {
        self.producers.lock().len()
    }

    /// Returns `true` once [`merge`](Self::merge) has been called.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.merged.load(Ordering::Acquire)
    }
}

impl<C: 'static> fmt::Debug for ContentBroadcast<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentBroadcast")
            .field("container", &Self::container_name())
            .field("producers", &self.producer_count())
            .field("merged", &self.is_merged())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producers_run_in_registration_order() {
        let broadcast = ContentBroadcast::<Vec<u32>>::new();
        for i in 1..=3 {
            broadcast
                .register_producer(format!("p{i}"), move |list| {
                    list.push(i);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(broadcast.producer_count(), 3);

        let outcome = broadcast.merge(vec![0], |list| list).unwrap();
        assert_eq!(outcome.output, vec![0, 1, 2, 3]);
        assert_eq!(outcome.producers_run, 3);
        assert_eq!(broadcast.producer_count(), 0);
    }

    #[test]
    fn merge_with_no_producers_still_consumes() {
        let broadcast = ContentBroadcast::<Vec<u32>>::new();
        let outcome = broadcast.merge(vec![7], |list| list.len()).unwrap();
        assert_eq!(outcome.output, 1);
        assert_eq!(outcome.producers_run, 0);
    }

    #[test]
    fn second_merge_fails() {
        let broadcast = ContentBroadcast::<Vec<u32>>::new();
        broadcast.merge(Vec::new(), drop).unwrap();
        assert!(broadcast.is_merged());
        assert!(matches!(
            broadcast.merge(Vec::new(), drop),
            Err(ContentError::AlreadyMerged { .. })
        ));
    }

    #[test]
    fn late_registration_is_rejected() {
        let broadcast = ContentBroadcast::<Vec<u32>>::new();
        broadcast.merge(Vec::new(), drop).unwrap();
        let err = broadcast
            .register_producer("late", |list| {
                list.push(1);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidLifecycleState { producer, .. } if producer == "late"));
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
