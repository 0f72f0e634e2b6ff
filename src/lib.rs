//! # claude-bridge
//!
//! Bridges Claude Code extension assets (skills, agents, commands, and
//! lifecycle hooks) into a host agent runtime, so the host behaves as if the
//! assets were native to it.
//!
//! The crate scans the project-scoped and user-scoped asset roots, converts
//! each asset kind into the host's construct, and keeps the converted output
//! consistent with the source files as they change at runtime:
//!
//! - `SKILL.md` capability descriptors become invocable tool definitions
//! - agent and command markdown documents are rewritten into the host's
//!   on-disk schema and synchronized into the host's own directories
//! - declarative hook rules become live process-spawning handlers with
//!   blocking semantics on the pre-tool-use phase
//! - a filesystem watcher re-runs exactly the affected converter when source
//!   files change
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use claude_bridge::{BridgeConfig, BridgePlugin};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), claude_bridge::Error> {
//!     let config = BridgeConfig::resolve(std::env::current_dir()?);
//!     let plugin = BridgePlugin::initialize(config).await?;
//!
//!     for (name, tool) in plugin.tools().await {
//!         println!("{}: {}", name, tool.description);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod discovery;
pub mod document;
pub mod hooks;
pub mod plugin;
pub mod skills;
pub mod sync;
pub mod watch;

// Re-exports for convenience
pub use config::BridgeConfig;
pub use discovery::{
    AssetDiscoverer, AssetKind, AssetScope, AssetSummary, DiscoveredAsset, FsAssetDiscoverer,
};
pub use document::{Preamble, StructuredDocument, parse_comma_separated};
pub use hooks::{
    HookDispatcher, HookRule, HookVerdict, HookedInvocation, InvocationPhase, Matcher,
    PreHookOutcome, SourceEvent, ToolCallContext,
};
pub use plugin::BridgePlugin;
pub use skills::{SkillAsset, ToolDefinition, tool_allowed};
pub use sync::{SyncOutcome, Synchronizer};
pub use watch::{KindReloader, ReloadCoordinator};

/// Error type for claude-bridge operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to parse an asset document or settings file.
    #[error("Parse error: {0}")]
    Parse(String),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Synchronizing an asset into the host directories failed.
    #[error("Sync error: {0}")]
    Sync(String),

    /// Filesystem watcher could not be started.
    #[error("Watcher error: {0}")]
    Watch(String),
}

/// Result type alias for claude-bridge operations.
pub type Result<T> = std::result::Result<T, Error>;
