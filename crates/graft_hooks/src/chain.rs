//! Chain-of-responsibility plumbing for hooked members.

use core::any::Any;
use std::sync::Arc;

use graft_accessors::{AccessError, Arguments, MemberHandle, Original, Value};

/// A hook handler.
///
/// Receives the owner instance, the call arguments, and a [`Next`] delegate
/// that runs the rest of the chain. A handler may inspect or rewrite the
/// arguments, skip the original entirely, or post-process its result.
pub type HookFn =
    dyn Fn(&mut dyn Any, Arguments, Next<'_>) -> Result<Value, AccessError> + Send + Sync;

/// Delegate to the remainder of a hook chain.
///
/// The innermost `Next` invokes the original member.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<HookFn>],
    original: Original<'a>,
}

impl<'a> Next<'a> {
    /// `chain` is ordered outermost first.
    pub(crate) fn new(chain: &'a [Arc<HookFn>], original: Original<'a>) -> Self {
        Self {
            rest: chain,
            original,
        }
    }

    /// Runs the rest of the chain.
    ///
    /// # Errors
    ///
    /// Whatever the inner handlers or the original member return.
    pub fn call(self, owner: &mut dyn Any, args: Arguments) -> Result<Value, AccessError> {
        match self.rest.split_first() {
            Some((handler, rest)) => handler(
                owner,
                args,
                Next {
                    rest,
                    original: self.original,
                },
            ),
            None => self.original.call(owner, args),
        }
    }

    /// The member this chain wraps.
    #[must_use]
    pub fn target(&self) -> &'a MemberHandle {
        self.original.member()
    }

    /// Number of handlers still to run before the original.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}
