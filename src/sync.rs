//! Agent and command synchronization.
//!
//! Discovered persona descriptors and command templates are rewritten into
//! the host's on-disk schema and written into the host's own asset
//! directories under deterministic file names. Writes are whole-file
//! overwrites; re-running on an unchanged source produces byte-identical
//! output.

use std::path::{Path, PathBuf};

use crate::discovery::{AssetKind, DiscoveredAsset};
use crate::document::{self, Preamble};

/// Result of one synchronization pass.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Synchronized asset names, in discovery order.
    pub synchronized: Vec<String>,
}

/// Writes agent and command documents into the host directories.
pub struct Synchronizer {
    host_agent_dir: PathBuf,
    host_command_dir: PathBuf,
}

impl Synchronizer {
    pub fn new(host_agent_dir: impl Into<PathBuf>, host_command_dir: impl Into<PathBuf>) -> Self {
        Self {
            host_agent_dir: host_agent_dir.into(),
            host_command_dir: host_command_dir.into(),
        }
    }

    /// Synchronize one kind's discovered assets. A malformed asset is
    /// skipped with a warning; siblings still synchronize. Returns the
    /// ordered list of synchronized names for logging.
    pub async fn sync(&self, assets: &[DiscoveredAsset]) -> crate::Result<SyncOutcome> {
        let mut outcome = SyncOutcome::default();

        for asset in assets {
            let target_dir = match asset.kind {
                AssetKind::Agent => &self.host_agent_dir,
                AssetKind::Command => &self.host_command_dir,
                AssetKind::Skill | AssetKind::Hook => continue,
            };

            match self.sync_one(asset, target_dir).await {
                Ok(()) => outcome.synchronized.push(asset.name.clone()),
                Err(e) => {
                    tracing::warn!(
                        name = %asset.name,
                        kind = %asset.kind,
                        %e,
                        "skipping asset during synchronization"
                    );
                }
            }
        }

        Ok(outcome)
    }

    async fn sync_one(&self, asset: &DiscoveredAsset, target_dir: &Path) -> crate::Result<()> {
        let content = tokio::fs::read_to_string(&asset.path).await?;
        let doc = document::parse(&content);

        if doc.preamble.get("description").is_none() {
            return Err(crate::Error::Parse(format!(
                "{} has no description",
                asset.path.display()
            )));
        }

        let preamble = rewrite_preamble(asset.kind, &asset.name, &doc.preamble);
        let body = match asset.kind {
            AssetKind::Command => normalize_placeholders(&doc.body),
            _ => doc.body,
        };

        tokio::fs::create_dir_all(target_dir).await?;
        let target = target_dir.join(format!("{}.md", asset.name));
        tokio::fs::write(&target, document::serialize(&preamble, &body)).await?;

        tracing::debug!(
            name = %asset.name,
            target = %target.display(),
            "synchronized asset"
        );
        Ok(())
    }
}

/// Rewrite a source preamble into the host's field set. Keys with no host
/// equivalent are dropped; `permission-mode` gets a logged notice, never
/// a silent drop.
fn rewrite_preamble(kind: AssetKind, name: &str, source: &Preamble) -> Preamble {
    let mut out = Preamble::new();
    out.insert_opt("description", source.get("description"));
    out.insert_opt("model", source.get("model"));

    // The host spells the restriction list `tools`; sources may use either.
    let tools = if source.contains_key("tools") {
        source.list("tools")
    } else {
        source.list("allowed-tools")
    };
    out.insert_list("tools", &tools);

    if kind == AssetKind::Command {
        out.insert_opt("argument-hint", source.get("argument-hint"));
    }

    for (key, _) in source.iter() {
        match key {
            "description" | "model" | "tools" | "allowed-tools" => {}
            "argument-hint" if kind == AssetKind::Command => {}
            // The deterministic file name carries identity.
            "name" => {}
            "permission-mode" => {
                tracing::info!(
                    asset = name,
                    "dropping permission-mode: the host has no equivalent field"
                );
            }
            other => {
                tracing::debug!(asset = name, key = other, "dropping source-only key");
            }
        }
    }

    out
}

/// Normalize argument placeholders in command bodies to the host's canonical
/// `$ARGUMENTS` spelling.
fn normalize_placeholders(body: &str) -> String {
    body.replace("${ARGUMENTS}", "$ARGUMENTS")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::AssetScope;

    fn asset(path: &Path, name: &str, kind: AssetKind) -> DiscoveredAsset {
        DiscoveredAsset {
            name: name.to_string(),
            path: path.to_path_buf(),
            scope: AssetScope::Project,
            kind,
        }
    }

    fn write_source(dir: &Path, file: &str, content: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(file);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn synchronizer(root: &Path) -> Synchronizer {
        Synchronizer::new(root.join("host/agents"), root.join("host/commands"))
    }

    #[tokio::test]
    async fn test_agent_rewrite_and_deterministic_name() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(
            &tmp.path().join("src"),
            "reviewer.md",
            "---\nname: reviewer\ndescription: Reviews code\nallowed-tools: Read, Grep\nmodel: haiku\npermission-mode: plan\n---\nYou review code.\n",
        );

        let sync = synchronizer(tmp.path());
        let outcome = sync
            .sync(&[asset(&source, "reviewer", AssetKind::Agent)])
            .await
            .unwrap();

        assert_eq!(outcome.synchronized, vec!["reviewer"]);
        let written =
            std::fs::read_to_string(tmp.path().join("host/agents/reviewer.md")).unwrap();
        assert!(written.contains("description: Reviews code"));
        assert!(written.contains("tools: Read, Grep"));
        assert!(written.contains("model: haiku"));
        assert!(!written.contains("permission-mode"));
        assert!(!written.contains("allowed-tools"));
        assert!(!written.contains("name:"));
        assert!(written.contains("You review code."));
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(
            &tmp.path().join("src"),
            "deploy.md",
            "---\ndescription: Deploy the service\nargument-hint: <env>\n---\nDeploy to $1.\n",
        );
        let sync = synchronizer(tmp.path());
        let record = asset(&source, "deploy", AssetKind::Command);

        sync.sync(std::slice::from_ref(&record)).await.unwrap();
        let first = std::fs::read(tmp.path().join("host/commands/deploy.md")).unwrap();

        sync.sync(std::slice::from_ref(&record)).await.unwrap();
        let second = std::fs::read(tmp.path().join("host/commands/deploy.md")).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_command_placeholder_normalization() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(
            &tmp.path().join("src"),
            "greet.md",
            "---\ndescription: Greet someone\n---\nSay hi to ${ARGUMENTS}.\n",
        );

        let sync = synchronizer(tmp.path());
        sync.sync(&[asset(&source, "greet", AssetKind::Command)])
            .await
            .unwrap();

        let written =
            std::fs::read_to_string(tmp.path().join("host/commands/greet.md")).unwrap();
        assert!(written.contains("Say hi to $ARGUMENTS."));
        assert!(!written.contains("${ARGUMENTS}"));
    }

    #[tokio::test]
    async fn test_asset_without_description_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = write_source(&tmp.path().join("src"), "bad.md", "no preamble at all\n");
        let good = write_source(
            &tmp.path().join("src"),
            "good.md",
            "---\ndescription: fine\n---\nbody\n",
        );

        let sync = synchronizer(tmp.path());
        let outcome = sync
            .sync(&[
                asset(&bad, "bad", AssetKind::Agent),
                asset(&good, "good", AssetKind::Agent),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.synchronized, vec!["good"]);
        assert!(!tmp.path().join("host/agents/bad.md").exists());
    }
}
