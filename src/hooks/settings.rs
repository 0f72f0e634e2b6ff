//! Parsing of the lifecycle-hooks declaration in the settings document.
//!
//! The `hooks` section groups rules by source lifecycle event name; each
//! rule holds an optional matcher and one or more command actions:
//!
//! ```json
//! {
//!   "hooks": {
//!     "PreToolUse": [
//!       {"matcher": "Edit|Write", "hooks": [{"type": "command", "command": "lint.sh"}]}
//!     ]
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use super::matcher::Matcher;

/// Source lifecycle events this bridge dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEvent {
    /// Before a tool is executed; commands may block.
    PreToolUse,
    /// After a tool executed; commands are informational.
    PostToolUse,
    /// The agent finished responding.
    Stop,
    /// A subagent finished.
    SubagentStop,
    /// The session ended.
    SessionEnd,
}

impl SourceEvent {
    pub const ALL: [SourceEvent; 5] = [
        SourceEvent::PreToolUse,
        SourceEvent::PostToolUse,
        SourceEvent::Stop,
        SourceEvent::SubagentStop,
        SourceEvent::SessionEnd,
    ];

    /// Parse a PascalCase event name from the settings document.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PreToolUse" => Some(SourceEvent::PreToolUse),
            "PostToolUse" => Some(SourceEvent::PostToolUse),
            "Stop" => Some(SourceEvent::Stop),
            "SubagentStop" => Some(SourceEvent::SubagentStop),
            "SessionEnd" => Some(SourceEvent::SessionEnd),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceEvent::PreToolUse => "PreToolUse",
            SourceEvent::PostToolUse => "PostToolUse",
            SourceEvent::Stop => "Stop",
            SourceEvent::SubagentStop => "SubagentStop",
            SourceEvent::SessionEnd => "SessionEnd",
        }
    }
}

impl std::fmt::Display for SourceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed hook rule: an event, a matcher, and the ordered shell command
/// lines to run when the matcher applies.
#[derive(Debug, Clone)]
pub struct HookRule {
    pub event: SourceEvent,
    pub matcher: Matcher,
    pub command_lines: Vec<String>,
}

#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default)]
    hooks: HashMap<String, Vec<RawRule>>,
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(default)]
    matcher: Option<String>,
    #[serde(default)]
    hooks: Vec<RawAction>,
}

#[derive(Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    action_type: String,
    #[serde(default)]
    command: Option<String>,
}

/// Parse the hooks declaration out of one settings document. Rules keep
/// their in-file order within each event group. Unknown event names and
/// non-command actions are skipped with a notice.
pub fn parse_hooks_settings(content: &str) -> crate::Result<Vec<HookRule>> {
    let settings: SettingsFile = serde_json::from_str(content)?;

    let mut rules = Vec::new();
    // Stable event order keeps repeated parses deterministic even though the
    // JSON object itself is unordered across events.
    for event in SourceEvent::ALL {
        let Some(raw_rules) = settings.hooks.get(event.name()) else {
            continue;
        };
        for raw in raw_rules {
            let command_lines: Vec<String> = raw
                .hooks
                .iter()
                .filter_map(|action| {
                    if action.action_type == "command" {
                        action.command.clone()
                    } else {
                        tracing::debug!(
                            %event,
                            action_type = %action.action_type,
                            "skipping non-command hook action"
                        );
                        None
                    }
                })
                .collect();

            if command_lines.is_empty() {
                continue;
            }
            rules.push(HookRule {
                event,
                matcher: Matcher::parse(raw.matcher.as_deref()),
                command_lines,
            });
        }
    }

    for name in settings.hooks.keys() {
        if SourceEvent::from_name(name).is_none() {
            tracing::info!(event = %name, "hook event has no host mapping, skipping");
        }
    }

    Ok(rules)
}
