//! Memoized member lookup for Graft (Layer 2).
//!
//! Host types describe their fields and methods once ([`HostType`]); plugins
//! then look members up by owner type, name, and optional argument signature.
//! The [`AccessorCache`] resolves each distinct [`AccessorKey`] at most once
//! and remembers misses as well as hits.
//!
//! # Usage
//!
//! Add [`AccessorsPlugin`] to the server. Plugins that contribute host types
//! depend on it and register them during build:
//!
//! ```
//! use graft_accessors::{AccessorCache, AccessorsPlugin, HostType, MemberTable, TypeCatalog};
//! use graft_system::plugin::{Plugin, PluginId};
//! use graft_system::server::Server;
//!
//! struct Chest { gold: u32 }
//!
//! impl HostType for Chest {
//!     fn describe(members: &mut MemberTable<Self>) {
//!         members.field("gold", |c| &c.gold, |c| &mut c.gold);
//!     }
//! }
//!
//! struct ChestPlugin;
//!
//! impl Plugin for ChestPlugin {
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<AccessorsPlugin>()]
//!     }
//!
//!     fn build(&self, server: &mut Server) {
//!         if let Some(mut catalog) = server.get_resource_mut::<TypeCatalog>() {
//!             catalog.register::<Chest>();
//!         }
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(AccessorsPlugin::default()).add_plugins(ChestPlugin);
//! server.finish();
//!
//! let cache = server.api::<AccessorCache>().unwrap();
//! let gold = cache.resolve_in::<Chest>("gold").unwrap();
//!
//! let mut chest = Chest { gold: 5 };
//! gold.set(&mut chest, 12_u32).unwrap();
//! assert_eq!(chest.gold, 12);
//! ```

mod cache;
mod catalog;
mod error;
mod key;
mod member;
mod plugin;

pub use cache::AccessorCache;
pub use catalog::{MemberResolver, TypeCatalog};
pub use error::AccessError;
pub use key::{AccessorKey, TypeKey};
pub use member::{
    Arguments, Dispatcher, HostType, MemberHandle, MemberKind, MemberTable, Original, Value,
};
pub use plugin::AccessorsPlugin;
