//! Provides the [`ContentAPI`].

use graft_system::plugin::Plugin;
use graft_system::server::Server;

use crate::api::ContentAPI;

/// Plugin that provides the [`ContentAPI`].
///
/// The API is inserted during `build()`; dependent plugins register their
/// producers while building or in `ready()`. The host merges each container
/// once its own list is populated.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentPlugin;

impl Plugin for ContentPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_api(ContentAPI::new());
    }
}
