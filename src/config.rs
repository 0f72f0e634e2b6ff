//! Resolved bridge configuration.
//!
//! Configuration-file discovery and merging happen outside this crate; the
//! bridge consumes one resolved [`BridgeConfig`] record. [`BridgeConfig::
//! resolve`] fills the conventional locations for embedders that do not have
//! their own configuration layer.

use std::collections::HashMap;
use std::path::PathBuf;

use directories::BaseDirs;

/// Conventional name of the source asset root under the project and home
/// directories.
pub const ASSET_ROOT_DIR: &str = ".claude";

/// Resolved configuration for one plugin instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Project-scoped asset root, e.g. `<cwd>/.claude`.
    pub project_dir: PathBuf,
    /// User-scoped asset root, e.g. `~/.claude`.
    pub user_dir: PathBuf,
    /// Host directory receiving synchronized agent documents.
    pub host_agent_dir: PathBuf,
    /// Host directory receiving synchronized command documents.
    pub host_command_dir: PathBuf,
    /// Session identifier forwarded to hook commands.
    pub session_id: String,
    /// Overrides routing a source lifecycle event name to a host event
    /// channel, for embedders that want finer-grained mapping than the
    /// built-in collapse of session-end-like events.
    pub event_overrides: HashMap<String, String>,
    /// Whether the watch/reload coordinator is started.
    pub watch_enabled: bool,
}

impl BridgeConfig {
    /// Build a configuration from explicit roots and host directories.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        user_dir: impl Into<PathBuf>,
        host_agent_dir: impl Into<PathBuf>,
        host_command_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            user_dir: user_dir.into(),
            host_agent_dir: host_agent_dir.into(),
            host_command_dir: host_command_dir.into(),
            session_id: "main".to_string(),
            event_overrides: HashMap::new(),
            watch_enabled: true,
        }
    }

    /// Resolve conventional defaults relative to a working directory:
    /// `<cwd>/.claude` and `~/.claude` as discovery roots, and
    /// `<cwd>/.bridge/{agents,commands}` as the host asset directories.
    pub fn resolve(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let user_dir = BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(ASSET_ROOT_DIR))
            .unwrap_or_else(|| cwd.join(ASSET_ROOT_DIR));
        let bridge = cwd.join(".bridge");

        Self::new(
            cwd.join(ASSET_ROOT_DIR),
            user_dir,
            bridge.join("agents"),
            bridge.join("commands"),
        )
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_event_override(
        mut self,
        source_event: impl Into<String>,
        host_channel: impl Into<String>,
    ) -> Self {
        self.event_overrides
            .insert(source_event.into(), host_channel.into());
        self
    }

    pub fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// The discovery roots in precedence order.
    pub fn discovery_roots(&self) -> Vec<PathBuf> {
        vec![self.project_dir.clone(), self.user_dir.clone()]
    }
}
