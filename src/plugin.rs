//! Plugin assembly and the host integration contract.
//!
//! [`BridgePlugin::initialize`] runs discovery, converts each present asset
//! kind, and optionally starts the watch/reload coordinator. The host drives
//! the result through the contract surface: the converted tool map, the two
//! phase-bound handlers ([`BridgePlugin::on_tool_before`],
//! [`BridgePlugin::on_tool_after`]), and the generic event handler
//! ([`BridgePlugin::on_event`]). Enforcing any declared tool-access
//! restriction stays with the host.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::BridgeConfig;
use crate::discovery::{AssetDiscoverer, AssetKind, AssetSummary, FsAssetDiscoverer};
use crate::hooks::{self, HookDispatcher, PreHookOutcome, ToolCallContext};
use crate::skills::{self, ToolDefinition};
use crate::sync::Synchronizer;
use crate::watch::{KindReloader, ReloadCoordinator};

/// The mutable state owned by one plugin instance. Each piece is replaced by
/// single assignment at the end of a successful reload, so readers in flight
/// observe either the fully-old or fully-new value, never a partial one.
struct PluginState {
    config: BridgeConfig,
    discoverer: FsAssetDiscoverer,
    synchronizer: Synchronizer,
    tools: RwLock<Arc<BTreeMap<String, ToolDefinition>>>,
    dispatcher: RwLock<Arc<HookDispatcher>>,
}

impl PluginState {
    async fn reload_skills(&self) {
        let assets = self.discoverer.discover(AssetKind::Skill).await;
        let tools = skills::convert(&assets).await;
        tracing::info!(count = tools.len(), "skill tool map rebuilt");
        *self.tools.write().await = Arc::new(tools);
    }

    async fn reload_sync(&self, kind: AssetKind) {
        let assets = self.discoverer.discover(kind).await;
        match self.synchronizer.sync(&assets).await {
            Ok(outcome) => {
                tracing::info!(
                    %kind,
                    synchronized = ?outcome.synchronized,
                    "assets synchronized into host directories"
                );
            }
            Err(e) => {
                tracing::warn!(%kind, %e, "synchronization failed, previous output kept");
            }
        }
    }

    async fn reload_hooks(&self) {
        match self.build_dispatcher().await {
            Ok(dispatcher) => {
                let (before, after, channels) = dispatcher.rule_counts();
                tracing::info!(before, after, channels, "hook dispatch table rebuilt");
                *self.dispatcher.write().await = Arc::new(dispatcher);
            }
            Err(e) => {
                tracing::warn!(%e, "hooks reload failed, previous dispatch table kept");
            }
        }
    }

    /// Parse every discovered settings document (project rules first) and
    /// build the dispatch table. Any failure is all-or-nothing: the caller
    /// keeps the previous table.
    async fn build_dispatcher(&self) -> crate::Result<HookDispatcher> {
        let mut rules = Vec::new();
        for asset in self.discoverer.discover(AssetKind::Hook).await {
            let content = tokio::fs::read_to_string(&asset.path).await?;
            rules.extend(hooks::parse_hooks_settings(&content)?);
        }
        Ok(HookDispatcher::build(rules, &self.config.event_overrides))
    }
}

#[async_trait]
impl KindReloader for PluginState {
    async fn reload(&self, kind: AssetKind) {
        match kind {
            AssetKind::Skill => self.reload_skills().await,
            AssetKind::Agent | AssetKind::Command => self.reload_sync(kind).await,
            AssetKind::Hook => self.reload_hooks().await,
        }
    }
}

/// One running bridge instance.
pub struct BridgePlugin {
    state: Arc<PluginState>,
    summary: AssetSummary,
    coordinator: Option<ReloadCoordinator>,
}

impl BridgePlugin {
    /// Discover the asset roots, convert every present kind, and start the
    /// reload coordinator when watching is enabled. Initialization never
    /// fails on individual asset problems (those degrade to warnings), only
    /// on an unusable environment.
    pub async fn initialize(config: BridgeConfig) -> crate::Result<Self> {
        let discoverer = FsAssetDiscoverer::new(&config.project_dir, &config.user_dir);
        let synchronizer = Synchronizer::new(&config.host_agent_dir, &config.host_command_dir);
        let state = Arc::new(PluginState {
            config,
            discoverer,
            synchronizer,
            tools: RwLock::new(Arc::new(BTreeMap::new())),
            dispatcher: RwLock::new(Arc::new(HookDispatcher::default())),
        });

        // The summary gates converter startup for absent kinds; converters
        // handle empty input anyway, so this is purely an optimization.
        let summary = state.discoverer.summary().await;
        if summary.has_skills {
            state.reload(AssetKind::Skill).await;
        }
        if summary.has_agents {
            state.reload(AssetKind::Agent).await;
        }
        if summary.has_commands {
            state.reload(AssetKind::Command).await;
        }
        if summary.has_hooks {
            state.reload(AssetKind::Hook).await;
        }

        let coordinator = if state.config.watch_enabled {
            match ReloadCoordinator::start(state.config.discovery_roots(), state.clone()) {
                Ok(coordinator) => Some(coordinator),
                Err(e) => {
                    tracing::warn!(%e, "watcher unavailable, hot reload disabled");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            state,
            summary,
            coordinator,
        })
    }

    /// Presence summary captured at initialization.
    pub fn summary(&self) -> AssetSummary {
        self.summary
    }

    /// Snapshot of the converted tool map.
    pub async fn tools(&self) -> BTreeMap<String, ToolDefinition> {
        self.state.tools.read().await.as_ref().clone()
    }

    /// Invoke a converted tool by name, returning its rendered document.
    pub async fn invoke_tool(&self, name: &str) -> Option<String> {
        self.state.tools.read().await.get(name).map(ToolDefinition::invoke)
    }

    /// Pre-invocation handler: evaluate the blocking hook phase for a tool
    /// call the host is about to make.
    pub async fn on_tool_before(
        &self,
        tool_name: &str,
        tool_input: serde_json::Value,
    ) -> PreHookOutcome {
        let dispatcher = self.state.dispatcher.read().await.clone();
        let ctx = ToolCallContext::new(
            tool_name,
            tool_input,
            self.state.config.session_id.as_str(),
        );
        dispatcher.evaluate_pre(&ctx).await
    }

    /// Post-invocation handler: informational hooks after a tool completed.
    pub async fn on_tool_after(&self, tool_name: &str, tool_input: serde_json::Value) {
        let dispatcher = self.state.dispatcher.read().await.clone();
        let ctx = ToolCallContext::new(
            tool_name,
            tool_input,
            self.state.config.session_id.as_str(),
        );
        dispatcher.evaluate_post(&ctx).await;
    }

    /// Generic event handler for host event channels (e.g. `idle`).
    pub async fn on_event(&self, channel: &str) {
        let dispatcher = self.state.dispatcher.read().await.clone();
        dispatcher
            .dispatch_event(channel, &self.state.config.session_id)
            .await;
    }

    /// Re-run the pipeline for one asset kind, replacing that kind's state.
    /// The coordinator calls this on filesystem changes; hosts without
    /// watching can call it directly.
    pub async fn reload(&self, kind: AssetKind) {
        self.state.reload(kind).await;
    }

    /// Stop the reload coordinator. In-flight reloads run to completion.
    pub fn shutdown(&self) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn test_config(root: &Path) -> BridgeConfig {
        BridgeConfig::new(
            root.join("project/.claude"),
            root.join("user/.claude"),
            root.join("host/agents"),
            root.join("host/commands"),
        )
        .with_watch(false)
    }

    fn seed_fixture(root: &Path) {
        let project = root.join("project/.claude");
        let user = root.join("user/.claude");

        write(
            &project.join("skills/pdf-tools/SKILL.md"),
            "---\nname: pdf-tools\ndescription: Work with PDFs\nallowed-tools: Read, Bash\n---\nExtract text first.\n",
        );
        write(&project.join("skills/pdf-tools/scripts/extract.py"), "print()");
        write(
            &user.join("skills/notes/SKILL.md"),
            "---\nname: notes\ndescription: Take notes\n---\nWrite things down.\n",
        );
        write(
            &project.join("agents/reviewer.md"),
            "---\ndescription: Reviews code\nallowed-tools: Read, Grep\npermission-mode: plan\n---\nYou review code.\n",
        );
        write(
            &user.join("commands/deploy.md"),
            "---\ndescription: Deploy\nargument-hint: <env>\n---\nDeploy to ${ARGUMENTS}.\n",
        );
        write(
            &project.join("settings.json"),
            r#"{"hooks": {"PreToolUse": [{"matcher": "Edit|Write", "hooks": [{"type": "command", "command": "exit 2"}]}], "Stop": [{"hooks": [{"type": "command", "command": "exit 0"}]}]}}"#,
        );
    }

    #[tokio::test]
    async fn test_initialize_builds_all_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        seed_fixture(tmp.path());

        let plugin = BridgePlugin::initialize(test_config(tmp.path())).await.unwrap();

        let summary = plugin.summary();
        assert!(summary.has_skills && summary.has_agents && summary.has_commands);
        assert!(summary.has_hooks);

        let tools = plugin.tools().await;
        assert!(tools.contains_key("skills_pdf_tools"));
        assert!(tools.contains_key("skills_notes"));

        let output = plugin.invoke_tool("skills_pdf_tools").await.unwrap();
        assert!(output.contains("Extract text first."));
        assert!(output.contains("extract.py"));

        let agent =
            std::fs::read_to_string(tmp.path().join("host/agents/reviewer.md")).unwrap();
        assert!(agent.contains("tools: Read, Grep"));
        assert!(!agent.contains("permission-mode"));

        let command =
            std::fs::read_to_string(tmp.path().join("host/commands/deploy.md")).unwrap();
        assert!(command.contains("Deploy to $ARGUMENTS."));
    }

    #[tokio::test]
    async fn test_hook_handlers_block_and_allow() {
        let tmp = tempfile::tempdir().unwrap();
        seed_fixture(tmp.path());

        let plugin = BridgePlugin::initialize(test_config(tmp.path())).await.unwrap();

        let blocked = plugin
            .on_tool_before("Edit", serde_json::json!({"path": "x"}))
            .await;
        assert!(matches!(blocked, PreHookOutcome::Blocked { .. }));

        let allowed = plugin
            .on_tool_before("Read", serde_json::json!({"path": "x"}))
            .await;
        assert_eq!(allowed, PreHookOutcome::Proceed);

        // Post and event handlers are informational; they must not panic.
        plugin.on_tool_after("Edit", serde_json::json!({})).await;
        plugin.on_event(hooks::IDLE_CHANNEL).await;
    }

    #[tokio::test]
    async fn test_reload_replaces_tool_map() {
        let tmp = tempfile::tempdir().unwrap();
        seed_fixture(tmp.path());

        let plugin = BridgePlugin::initialize(test_config(tmp.path())).await.unwrap();
        assert_eq!(plugin.tools().await.len(), 2);

        write(
            &tmp.path().join("project/.claude/skills/charts/SKILL.md"),
            "---\nname: charts\ndescription: Draw charts\n---\nUse the palette.\n",
        );
        plugin.reload(AssetKind::Skill).await;

        let tools = plugin.tools().await;
        assert_eq!(tools.len(), 3);
        assert!(tools.contains_key("skills_charts"));
    }

    #[tokio::test]
    async fn test_failed_hooks_reload_keeps_previous_table() {
        let tmp = tempfile::tempdir().unwrap();
        seed_fixture(tmp.path());

        let plugin = BridgePlugin::initialize(test_config(tmp.path())).await.unwrap();

        // Corrupt the settings document, then reload: the previous table
        // must stay in effect.
        write(&tmp.path().join("project/.claude/settings.json"), "{not json");
        plugin.reload(AssetKind::Hook).await;

        let outcome = plugin
            .on_tool_before("Write", serde_json::json!({}))
            .await;
        assert!(matches!(outcome, PreHookOutcome::Blocked { .. }));
    }

    #[tokio::test]
    async fn test_empty_roots_initialize_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let plugin = BridgePlugin::initialize(test_config(tmp.path())).await.unwrap();

        assert!(!plugin.summary().any());
        assert!(plugin.tools().await.is_empty());
        assert_eq!(
            plugin.on_tool_before("Edit", serde_json::json!({})).await,
            PreHookOutcome::Proceed
        );
    }
}
