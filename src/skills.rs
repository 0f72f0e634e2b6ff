//! Skill conversion: capability descriptors become invocable tools.
//!
//! Each skill directory holds a `SKILL.md` descriptor plus arbitrary
//! supporting files. Conversion produces one tool per skill whose invocation
//! returns the skill's instructions and an itemized list of supporting-file
//! paths for the caller to read on demand, keeping invocation payloads
//! bounded regardless of how many or how large the supporting files are.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::discovery::{AssetScope, DiscoveredAsset, SKILL_FILE};
use crate::document::{self, kebab_to_snake};

/// Fixed prefix for skill-derived tool names.
pub const TOOL_PREFIX: &str = "skills_";

/// A capability descriptor plus its supporting files, constructed fresh on
/// every discovery/reload pass and superseded wholesale on reload.
#[derive(Debug, Clone)]
pub struct SkillAsset {
    pub name: String,
    pub description: String,
    pub allowed_tools: Vec<String>,
    pub instructions: String,
    /// Paths relative to the skill directory, sorted for determinism.
    pub supporting_files: Vec<PathBuf>,
    pub dir: PathBuf,
    pub scope: AssetScope,
}

/// An invocable tool definition handed to the host.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    output: String,
}

impl ToolDefinition {
    /// Invoke the tool, returning the rendered skill document.
    pub fn invoke(&self) -> String {
        self.output.clone()
    }
}

/// Validate a skill name: lowercase ASCII, digits, hyphens, 1-64 chars.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
}

/// Checks a tool name against an allowed-tools restriction list.
///
/// The restriction is informational at the conversion layer; this helper
/// exists for hosts that choose to enforce it. Supports exact names and
/// scoped patterns like `Bash(git:*)` (matches the base tool `Bash`).
pub fn tool_allowed(allowed: &[String], tool_name: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }
    allowed.iter().any(|pattern| {
        let base = &pattern[..pattern.find('(').unwrap_or(pattern.len())];
        base == tool_name || pattern == tool_name
    })
}

/// Load one skill directory into a [`SkillAsset`].
pub async fn load_skill(asset: &DiscoveredAsset) -> crate::Result<SkillAsset> {
    let descriptor = asset.path.join(SKILL_FILE);
    let content = tokio::fs::read_to_string(&descriptor).await?;
    let doc = document::parse(&content);

    // Name falls back to the containing directory (already kebab-case).
    let name = doc
        .preamble
        .get("name")
        .map(String::from)
        .unwrap_or_else(|| asset.name.clone());
    if !validate_name(&name) {
        return Err(crate::Error::Parse(format!(
            "invalid skill name '{}' in {}",
            name,
            descriptor.display()
        )));
    }

    let description = doc
        .preamble
        .get("description")
        .map(String::from)
        .ok_or_else(|| {
            crate::Error::Parse(format!("{} has no description", descriptor.display()))
        })?;

    Ok(SkillAsset {
        name,
        description,
        allowed_tools: doc.preamble.list("allowed-tools"),
        instructions: doc.body,
        supporting_files: list_supporting_files(&asset.path),
        dir: asset.path.clone(),
        scope: asset.scope,
    })
}

/// Convert discovered skill directories into the tool map. A malformed skill
/// is skipped with a warning and does not abort conversion of its siblings.
pub async fn convert(assets: &[DiscoveredAsset]) -> BTreeMap<String, ToolDefinition> {
    let mut tools = BTreeMap::new();

    for asset in assets {
        let skill = match load_skill(asset).await {
            Ok(skill) => skill,
            Err(e) => {
                tracing::warn!(dir = %asset.path.display(), %e, "skipping malformed skill");
                continue;
            }
        };
        let tool = to_tool(&skill);
        tools.insert(tool.name.clone(), tool);
    }

    tools
}

/// Build the tool definition for one skill.
pub fn to_tool(skill: &SkillAsset) -> ToolDefinition {
    let name = format!("{TOOL_PREFIX}{}", kebab_to_snake(&skill.name));

    // The restriction suffix is informational: enforcing tool access is the
    // host's responsibility, disclosed here rather than implemented.
    let description = if skill.allowed_tools.is_empty() {
        skill.description.clone()
    } else {
        format!(
            "{} (allowed tools: {})",
            skill.description,
            skill.allowed_tools.join(", ")
        )
    };

    ToolDefinition {
        name,
        description,
        output: render(skill),
    }
}

/// Render the invocation payload: instructions plus the supporting-file
/// listing. File contents are never inlined.
fn render(skill: &SkillAsset) -> String {
    let mut out = skill.instructions.trim_end().to_string();

    if !skill.supporting_files.is_empty() {
        out.push_str("\n\n## Supporting files\n\n");
        out.push_str("Read these files on demand as the instructions refer to them:\n");
        for rel in &skill.supporting_files {
            out.push_str(&format!("- {}\n", skill.dir.join(rel).display()));
        }
    }

    out
}

/// Recursively list every file under the skill directory except the primary
/// descriptor, as sorted relative paths.
fn list_supporting_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(dir).ok().map(PathBuf::from))
        .filter(|rel| rel != Path::new(SKILL_FILE))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::AssetKind;

    fn skill_asset(dir: &Path, name: &str) -> DiscoveredAsset {
        DiscoveredAsset {
            name: name.to_string(),
            path: dir.to_path_buf(),
            scope: AssetScope::Project,
            kind: AssetKind::Skill,
        }
    }

    fn write_skill_dir(root: &Path, name: &str, content: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SKILL_FILE), content).unwrap();
        dir
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("my-skill"));
        assert!(validate_name("a"));
        assert!(validate_name("skill123"));
        assert!(!validate_name(""));
        assert!(!validate_name("-bad"));
        assert!(!validate_name("bad-"));
        assert!(!validate_name("Bad"));
        assert!(!validate_name("has space"));
        assert!(!validate_name("has--double"));
        assert!(!validate_name(&"a".repeat(65)));
    }

    #[test]
    fn test_tool_allowed() {
        let allowed = vec![
            "Read".to_string(),
            "Grep".to_string(),
            "Bash(git:*)".to_string(),
        ];
        assert!(tool_allowed(&allowed, "Read"));
        assert!(tool_allowed(&allowed, "Bash"));
        assert!(!tool_allowed(&allowed, "Write"));
        assert!(tool_allowed(&[], "Anything"));
    }

    #[tokio::test]
    async fn test_load_skill_with_supporting_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill_dir(
            tmp.path(),
            "pdf-tools",
            "---\nname: pdf-tools\ndescription: Work with PDFs\nallowed-tools: Read, Bash\n---\nExtract text first.\n",
        );
        std::fs::create_dir_all(dir.join("scripts")).unwrap();
        std::fs::write(dir.join("scripts/extract.py"), "print()").unwrap();
        std::fs::write(dir.join("REFERENCE.md"), "ref").unwrap();

        let skill = load_skill(&skill_asset(&dir, "pdf-tools")).await.unwrap();

        assert_eq!(skill.name, "pdf-tools");
        assert_eq!(skill.allowed_tools, vec!["Read", "Bash"]);
        assert_eq!(
            skill.supporting_files,
            vec![PathBuf::from("REFERENCE.md"), PathBuf::from("scripts/extract.py")]
        );
        assert!(skill.instructions.contains("Extract text first."));
    }

    #[tokio::test]
    async fn test_name_falls_back_to_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill_dir(
            tmp.path(),
            "release-notes",
            "---\ndescription: Draft release notes\n---\nbody\n",
        );

        let skill = load_skill(&skill_asset(&dir, "release-notes")).await.unwrap();
        assert_eq!(skill.name, "release-notes");
    }

    #[tokio::test]
    async fn test_convert_skips_malformed_sibling() {
        let tmp = tempfile::tempdir().unwrap();
        let good = write_skill_dir(
            tmp.path(),
            "good",
            "---\nname: good\ndescription: fine\n---\nbody\n",
        );
        let bad = write_skill_dir(tmp.path(), "bad", "---\nname: Bad Name\n---\nbody\n");

        let tools = convert(&[
            skill_asset(&bad, "bad"),
            skill_asset(&good, "good"),
        ])
        .await;

        assert_eq!(tools.len(), 1);
        assert!(tools.contains_key("skills_good"));
    }

    #[tokio::test]
    async fn test_tool_name_and_description() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill_dir(
            tmp.path(),
            "pdf-tools",
            "---\nname: pdf-tools\ndescription: Work with PDFs\nallowed-tools: Read, Grep\n---\nbody\n",
        );

        let tools = convert(&[skill_asset(&dir, "pdf-tools")]).await;
        let tool = tools.get("skills_pdf_tools").unwrap();

        assert_eq!(
            tool.description,
            "Work with PDFs (allowed tools: Read, Grep)"
        );
    }

    #[tokio::test]
    async fn test_invoke_lists_files_without_inlining() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill_dir(
            tmp.path(),
            "charts",
            "---\nname: charts\ndescription: Draw charts\n---\nUse the palette file.\n",
        );
        std::fs::write(dir.join("palette.md"), "SECRET-CONTENT").unwrap();

        let tools = convert(&[skill_asset(&dir, "charts")]).await;
        let output = tools.get("skills_charts").unwrap().invoke();

        assert!(output.contains("Use the palette file."));
        assert!(output.contains("palette.md"));
        assert!(!output.contains("SECRET-CONTENT"));
    }
}
