//! Extension point registries for modding a closed host application.
//!
//! Graft lets extensions look up host members once and reuse the handle,
//! wrap host operations in reversible hooks, reserve identifiers after the
//! host's own, and contribute content to host lists at a single merge point.
//!
//! ```
//! use graft::prelude::*;
//!
//! struct Turret { damage: f32 }
//!
//! impl HostType for Turret {
//!     fn describe(members: &mut MemberTable<Self>) {
//!         members.field("damage", |t| &t.damage, |t| &mut t.damage);
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(
//!     MinimalPlugins
//!         .build()
//!         .disable::<AccessorsPlugin>()
//!         .add_before::<_, HooksPlugin>(AccessorsPlugin::default().with_type::<Turret>()),
//! );
//! server.finish();
//!
//! let hooks = server.api::<HookManager>().unwrap();
//! let damage = hooks.cache().resolve_in::<Turret>("damage").unwrap();
//! let handle = hooks
//!     .apply(&damage.key(), "cap_damage", |owner, mut args, next| {
//!         if let Some(value) = args.get_mut::<f32>(0) {
//!             *value = value.min(50.0);
//!         }
//!         next.call(owner, args)
//!     })
//!     .unwrap();
//!
//! let mut turret = Turret { damage: 10.0 };
//! hooks.set_field(&damage, &mut turret, 80.0_f32).unwrap();
//! assert_eq!(turret.damage, 50.0);
//!
//! hooks.undo(&handle);
//! server.cleanup();
//! ```

pub use graft_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use graft_internal::prelude::*;
}
