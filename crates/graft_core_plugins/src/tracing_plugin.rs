//! Diagnostic logging for the registries.
//!
//! Every registry crate reports through `tracing`: cache misses, hook
//! application and teardown leftovers, namespace seeding, and producer
//! failures. [`TracingPlugin`] installs a subscriber that prints them.
//!
//! # Lifecycle
//!
//! - **`build()`** publishes the [`TracingConfig`] global so other plugins can
//!   see the configured level while they build.
//! - **`ready()`** installs the subscriber. If the host already installed one,
//!   the host's subscriber is kept.
//!
//! # Example
//!
//! ```
//! use graft_core_plugins::{TracingFormat, TracingPlugin};
//! use graft_system::server::Server;
//! use tracing::Level;
//!
//! let mut server = Server::new();
//! server.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! server.finish();
//! ```

use graft_system::plugin::Plugin;
use graft_system::resource::GlobalResource;
use graft_system::server::Server;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable, multi-line output (default).
    #[default]
    Pretty,
    /// Single-line output, suited to host consoles.
    Compact,
    /// JSON lines for log collection.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The active logging configuration, as a global resource.
///
/// Plugins can check it before doing expensive diagnostic work:
///
/// ```
/// use graft_core_plugins::TracingConfig;
/// use tracing::Level;
///
/// fn dump_hook_chains(config: &TracingConfig) -> bool {
///     config.level >= Level::DEBUG
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum level that is printed.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
}

impl GlobalResource for TracingConfig {}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Installs a `tracing-subscriber` registry for the registries' diagnostics.
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`TracingConfig`] | Global | Logging configuration |
///
/// # Environment Filter
///
/// Per-crate levels use the `EnvFilter` syntax. An invalid filter falls back
/// to the plain level:
///
/// ```
/// use graft_core_plugins::TracingPlugin;
///
/// TracingPlugin::default()
///     .with_env_filter("graft_hooks=debug,graft_content=info")
/// # ;
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
    /// Log span enter/exit.
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a plugin with the default configuration (`INFO`, pretty).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a `target=level,...` filter that replaces the plain level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|err| {
                tracing::warn!(%filter, %err, "invalid env filter; using level");
                EnvFilter::new(self.level.as_str())
            }),
            None => EnvFilter::new(self.level.as_str()),
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(TracingConfig {
            level: self.level,
            format: self.format,
        });
    }

    fn ready(&self, _server: &mut Server) {
        let env_filter = self.filter();
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init fails if the host installed a subscriber first; keep theirs.
        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            installed,
            "TracingPlugin initialized"
        );
    }

    fn cleanup(&self, _server: &mut Server) {
        tracing::info!("TracingPlugin shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let plugin = TracingPlugin::default();
        assert_eq!(plugin.level, Level::INFO);
        assert_eq!(plugin.format, TracingFormat::Pretty);
        assert!(plugin.env_filter.is_none());
        assert!(!plugin.span_events);
    }

    #[test]
    fn builder_methods() {
        let plugin = TracingPlugin::new()
            .with_level(Level::TRACE)
            .with_format(TracingFormat::Json)
            .with_env_filter("graft_hooks=debug")
            .with_span_events(true);
        assert_eq!(plugin.level, Level::TRACE);
        assert_eq!(plugin.format, TracingFormat::Json);
        assert_eq!(plugin.env_filter.as_deref(), Some("graft_hooks=debug"));
        assert!(plugin.span_events);
    }

    #[test]
    fn invalid_filter_falls_back_to_level() {
        let plugin = TracingPlugin::new()
            .with_level(Level::WARN)
            .with_env_filter("graft_hooks=loud");
        assert_eq!(
            plugin.filter().max_level_hint(),
            Some(tracing::level_filters::LevelFilter::WARN)
        );
    }

    #[test]
    fn publishes_config() {
        let mut server = Server::new();
        server.add_plugins(TracingPlugin::default().with_level(Level::DEBUG));
        server.finish();

        let config = server.get_global::<TracingConfig>().unwrap();
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, TracingFormat::Pretty);
    }
}
