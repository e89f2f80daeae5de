//! Capability registries shared between plugins.
//!
//! An API is a long-lived registry object that one plugin installs on the
//! [`Server`](crate::server::Server) and other plugins reach through
//! [`Server::api`](crate::server::Server::api). The extension point
//! registries (accessor cache, hook manager, identifier namespaces, content
//! broadcasts) are all APIs.
//!
//! APIs are handed out as `&A`, so any registration surface they offer uses
//! interior mutability:
//!
//! ```
//! use graft_system::api::API;
//! use parking_lot::Mutex;
//!
//! #[derive(Default)]
//! pub struct SoundBankAPI {
//!     banks: Mutex<Vec<String>>,
//! }
//!
//! impl API for SoundBankAPI {}
//!
//! impl SoundBankAPI {
//!     pub fn register(&self, bank: impl Into<String>) {
//!         self.banks.lock().push(bank.into());
//!     }
//! }
//! ```
//!
//! An API lives as long as the server and is never torn down by it. Plugins
//! that need a teardown step perform it in [`Plugin::cleanup`](crate::plugin::Plugin::cleanup).

/// Marker trait for capability registries stored on the server.
///
/// ```
/// use graft_system::api::API;
///
/// pub struct ProjectileCatalog;
///
/// impl API for ProjectileCatalog {}
/// ```
pub trait API: Send + Sync + 'static {}
