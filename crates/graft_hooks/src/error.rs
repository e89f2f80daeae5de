//! Error types for hook application.

use graft_accessors::AccessorKey;

/// Error applying a hook.
///
/// Removing a hook never fails; [`HookManager::undo`](crate::HookManager::undo)
/// reports an already removed hook by returning `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// The target member does not exist on the host.
    #[error("hook target not found: {0}")]
    TargetNotFound(AccessorKey),

    /// The member is already hooked through another live manager.
    #[error("hook target {0} is owned by another hook manager")]
    ForeignRoute(AccessorKey),

    /// The manager no longer accepts hooks.
    #[error("cannot {operation}: hook manager has been torn down")]
    InvalidLifecycleState {
        /// The rejected operation.
        operation: &'static str,
    },
}
