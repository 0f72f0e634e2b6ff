//! Asset discovery across the project-scoped and user-scoped roots.
//!
//! Each root contains kind-specific subtrees (`skills/`, `agents/`,
//! `commands/`) and a single settings document holding the lifecycle-hooks
//! declaration. A name present under the project root shadows the same name
//! under the user root.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::document;

/// Subtree holding capability descriptors, one directory per skill.
pub const SKILLS_DIR: &str = "skills";
/// Subtree holding persona descriptors, one markdown file per agent.
pub const AGENTS_DIR: &str = "agents";
/// Subtree holding command templates, one markdown file per command.
pub const COMMANDS_DIR: &str = "commands";
/// Settings document carrying the lifecycle-hooks declaration.
pub const SETTINGS_FILE: &str = "settings.json";
/// Primary descriptor file inside a skill directory.
pub const SKILL_FILE: &str = "SKILL.md";

/// The closed set of source asset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Skill,
    Agent,
    Command,
    Hook,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Skill,
        AssetKind::Agent,
        AssetKind::Command,
        AssetKind::Hook,
    ];

    /// The kind-specific subtree under a discovery root, or `None` for hooks
    /// (declared in the settings document, not a subtree).
    pub fn subtree(&self) -> Option<&'static str> {
        match self {
            AssetKind::Skill => Some(SKILLS_DIR),
            AssetKind::Agent => Some(AGENTS_DIR),
            AssetKind::Command => Some(COMMANDS_DIR),
            AssetKind::Hook => None,
        }
    }

    /// Place a changed path into the asset kind whose subtree it falls
    /// under, relative to any of `roots`. Paths outside every root, or at a
    /// root's top level other than the settings document, classify to `None`.
    pub fn classify(roots: &[PathBuf], path: &Path) -> Option<AssetKind> {
        for root in roots {
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let first = rel
                .components()
                .next()
                .and_then(|c| c.as_os_str().to_str());
            return match first {
                Some(SKILLS_DIR) => Some(AssetKind::Skill),
                Some(AGENTS_DIR) => Some(AssetKind::Agent),
                Some(COMMANDS_DIR) => Some(AssetKind::Command),
                Some(SETTINGS_FILE) => Some(AssetKind::Hook),
                _ => None,
            };
        }
        None
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Skill => write!(f, "skill"),
            AssetKind::Agent => write!(f, "agent"),
            AssetKind::Command => write!(f, "command"),
            AssetKind::Hook => write!(f, "hook"),
        }
    }
}

/// Which root an asset was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetScope {
    /// Project-scoped root; shadows the user root on name collisions.
    Project,
    /// User-scoped root; fallback when the project root has no such name.
    User,
}

/// One discovered asset record. For skills `path` is the skill directory;
/// for agents and commands it is the markdown file; for hooks the settings
/// document.
#[derive(Debug, Clone)]
pub struct DiscoveredAsset {
    pub name: String,
    pub path: PathBuf,
    pub scope: AssetScope,
    pub kind: AssetKind,
}

/// Presence summary used to skip initializing converters for absent kinds.
/// Purely an optimization; converters handle empty input themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetSummary {
    pub has_skills: bool,
    pub has_agents: bool,
    pub has_commands: bool,
    pub has_hooks: bool,
}

impl AssetSummary {
    pub fn any(&self) -> bool {
        self.has_skills || self.has_agents || self.has_commands || self.has_hooks
    }
}

/// Discovers assets of a given kind from the configured roots.
#[async_trait]
pub trait AssetDiscoverer: Send + Sync {
    /// Return ordered asset records for one kind: project scope first, then
    /// user scope, each sorted by name, with project names shadowing user
    /// names.
    async fn discover(&self, kind: AssetKind) -> Vec<DiscoveredAsset>;

    /// Presence summary across all kinds.
    async fn summary(&self) -> AssetSummary;
}

/// Default filesystem-based discoverer over the two roots.
pub struct FsAssetDiscoverer {
    /// (root, scope) pairs in precedence order.
    roots: Vec<(PathBuf, AssetScope)>,
}

impl FsAssetDiscoverer {
    pub fn new(project_dir: impl Into<PathBuf>, user_dir: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![
                (project_dir.into(), AssetScope::Project),
                (user_dir.into(), AssetScope::User),
            ],
        }
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|(p, _)| p.clone()).collect()
    }

    /// List one root's entries for a kind, sorted by name. Missing
    /// directories contribute nothing; unreadable entries are skipped with a
    /// warning.
    async fn scan_root(&self, root: &Path, scope: AssetScope, kind: AssetKind) -> Vec<DiscoveredAsset> {
        let mut found = Vec::new();

        match kind {
            AssetKind::Hook => {
                let settings = root.join(SETTINGS_FILE);
                if settings.is_file() {
                    found.push(DiscoveredAsset {
                        name: document::base_name(&settings),
                        path: settings,
                        scope,
                        kind,
                    });
                }
                return found;
            }
            AssetKind::Skill | AssetKind::Agent | AssetKind::Command => {}
        }

        let dir = match kind.subtree() {
            Some(subtree) => root.join(subtree),
            None => return found,
        };
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => return found,
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), %e, "failed to read directory entry");
                    break;
                }
            };
            let path = entry.path();

            match kind {
                AssetKind::Skill => {
                    if path.is_dir() && path.join(SKILL_FILE).is_file() {
                        let name = path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or_default()
                            .to_string();
                        found.push(DiscoveredAsset { name, path, scope, kind });
                    }
                }
                AssetKind::Agent | AssetKind::Command => {
                    if path.is_file() && path.extension().is_some_and(|e| e == "md") {
                        let name = document::base_name(&path);
                        found.push(DiscoveredAsset { name, path, scope, kind });
                    }
                }
                AssetKind::Hook => unreachable!("handled above"),
            }
        }

        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }
}

#[async_trait]
impl AssetDiscoverer for FsAssetDiscoverer {
    async fn discover(&self, kind: AssetKind) -> Vec<DiscoveredAsset> {
        let mut assets: Vec<DiscoveredAsset> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for (root, scope) in &self.roots {
            for asset in self.scan_root(root, *scope, kind).await {
                // Hooks from both roots merge; named kinds shadow by name.
                if kind != AssetKind::Hook && !seen.insert(asset.name.clone()) {
                    tracing::debug!(
                        name = %asset.name,
                        %kind,
                        "user-root asset shadowed by project root"
                    );
                    continue;
                }
                assets.push(asset);
            }
        }

        assets
    }

    async fn summary(&self) -> AssetSummary {
        AssetSummary {
            has_skills: !self.discover(AssetKind::Skill).await.is_empty(),
            has_agents: !self.discover(AssetKind::Agent).await.is_empty(),
            has_commands: !self.discover(AssetKind::Command).await.is_empty(),
            has_hooks: !self.discover(AssetKind::Hook).await.is_empty(),
        }
    }
}
