//! Matcher-indexed hook dispatch and the per-invocation state machine.
//!
//! Rules are keyed by the two host phases (pre- and post-invocation of a
//! tool call) plus named event channels. Within a phase, rules are evaluated
//! in declaration order; every matching rule's commands run, and the pre
//! phase short-circuits on the first blocking result. Post hooks cannot
//! block; their exit codes are informational only.

use std::collections::HashMap;

use super::command::{HookPayload, HookVerdict, run_command};
use super::settings::{HookRule, SourceEvent};
use super::IDLE_CHANNEL;

/// Context of one tool invocation, forwarded to hook commands.
#[derive(Debug, Clone)]
pub struct ToolCallContext {
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    pub session_id: String,
}

impl ToolCallContext {
    pub fn new(
        tool_name: impl Into<String>,
        tool_input: serde_json::Value,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_input,
            session_id: session_id.into(),
        }
    }
}

/// Outcome of evaluating the pre-invocation phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreHookOutcome {
    /// All matching commands allowed; the tool may execute.
    Proceed,
    /// A command blocked; the tool must not execute.
    Blocked { reason: String },
}

/// Dispatch table built from the parsed hook rules.
#[derive(Debug, Default)]
pub struct HookDispatcher {
    /// Pre-invocation rules, in declaration order.
    before: Vec<HookRule>,
    /// Post-invocation rules, in declaration order.
    after: Vec<HookRule>,
    /// Rules routed to named host event channels.
    channels: HashMap<String, Vec<HookRule>>,
}

impl HookDispatcher {
    /// Build the table. `PreToolUse` and `PostToolUse` bind to the two host
    /// phases; the session-end-like events collapse onto the [`IDLE_CHANNEL`]
    /// unless an override routes the event elsewhere.
    pub fn build(rules: Vec<HookRule>, event_overrides: &HashMap<String, String>) -> Self {
        let mut dispatcher = Self::default();

        for rule in rules {
            if let Some(channel) = event_overrides.get(rule.event.name()) {
                dispatcher
                    .channels
                    .entry(channel.clone())
                    .or_default()
                    .push(rule);
                continue;
            }
            match rule.event {
                SourceEvent::PreToolUse => dispatcher.before.push(rule),
                SourceEvent::PostToolUse => dispatcher.after.push(rule),
                SourceEvent::Stop | SourceEvent::SubagentStop | SourceEvent::SessionEnd => {
                    dispatcher
                        .channels
                        .entry(IDLE_CHANNEL.to_string())
                        .or_default()
                        .push(rule);
                }
            }
        }

        dispatcher
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty() && self.channels.is_empty()
    }

    /// Number of rules bound per surface, for logging.
    pub fn rule_counts(&self) -> (usize, usize, usize) {
        (
            self.before.len(),
            self.after.len(),
            self.channels.values().map(Vec::len).sum(),
        )
    }

    /// Evaluate the pre-invocation phase: every matching rule's commands, in
    /// declaration order, short-circuiting on the first block.
    pub async fn evaluate_pre(&self, ctx: &ToolCallContext) -> PreHookOutcome {
        for rule in &self.before {
            if !rule.matcher.matches(&ctx.tool_name) {
                continue;
            }
            let payload = HookPayload::for_tool(
                SourceEvent::PreToolUse.name(),
                &ctx.tool_name,
                ctx.tool_input.clone(),
                &ctx.session_id,
            );
            for command_line in &rule.command_lines {
                match run_command(command_line, &payload).await {
                    HookVerdict::Allow | HookVerdict::Warn { .. } => {}
                    HookVerdict::Block { reason } => {
                        tracing::info!(
                            tool = %ctx.tool_name,
                            command = %command_line,
                            "pre-invocation hook blocked the tool call"
                        );
                        return PreHookOutcome::Blocked { reason };
                    }
                }
            }
        }
        PreHookOutcome::Proceed
    }

    /// Evaluate the post-invocation phase. Exit codes are informational: a
    /// status-2 result is logged, never propagated as a block.
    pub async fn evaluate_post(&self, ctx: &ToolCallContext) {
        for rule in &self.after {
            if !rule.matcher.matches(&ctx.tool_name) {
                continue;
            }
            let payload = HookPayload::for_tool(
                SourceEvent::PostToolUse.name(),
                &ctx.tool_name,
                ctx.tool_input.clone(),
                &ctx.session_id,
            );
            for command_line in &rule.command_lines {
                if let HookVerdict::Block { reason } = run_command(command_line, &payload).await {
                    tracing::warn!(
                        tool = %ctx.tool_name,
                        command = %command_line,
                        reason = %reason,
                        "post-invocation hooks cannot block, continuing"
                    );
                }
            }
        }
    }

    /// Run all commands bound to a named event channel. Matchers do not
    /// apply (there is no tool to match) and exit codes are informational.
    pub async fn dispatch_event(&self, channel: &str, session_id: &str) {
        let Some(rules) = self.channels.get(channel) else {
            return;
        };
        let payload = HookPayload::for_event(channel, session_id);
        for rule in rules {
            for command_line in &rule.command_lines {
                if let HookVerdict::Block { reason } = run_command(command_line, &payload).await {
                    tracing::warn!(
                        channel,
                        command = %command_line,
                        reason = %reason,
                        "event-channel hooks cannot block, continuing"
                    );
                }
            }
        }
    }

    /// Names of the event channels with at least one bound rule.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }
}

/// Per-invocation lifecycle:
/// `Pending → EvaluatingPre → {Blocked | Proceeding} → EvaluatingPost → Done`.
/// `Blocked` is terminal: the underlying tool never executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPhase {
    Pending,
    EvaluatingPre,
    Blocked,
    Proceeding,
    EvaluatingPost,
    Done,
}

/// Drives one tool invocation through the hook phases, keeping the blocking
/// contract auditable as explicit state transitions.
#[derive(Debug)]
pub struct HookedInvocation {
    ctx: ToolCallContext,
    phase: InvocationPhase,
}

impl HookedInvocation {
    pub fn new(ctx: ToolCallContext) -> Self {
        Self {
            ctx,
            phase: InvocationPhase::Pending,
        }
    }

    pub fn phase(&self) -> InvocationPhase {
        self.phase
    }

    pub fn context(&self) -> &ToolCallContext {
        &self.ctx
    }

    /// Evaluate pre-hooks. On a block the invocation is terminal; on proceed
    /// the caller executes the tool and then calls [`Self::complete`].
    pub async fn evaluate_pre(&mut self, dispatcher: &HookDispatcher) -> PreHookOutcome {
        self.phase = InvocationPhase::EvaluatingPre;
        match dispatcher.evaluate_pre(&self.ctx).await {
            PreHookOutcome::Proceed => {
                self.phase = InvocationPhase::Proceeding;
                PreHookOutcome::Proceed
            }
            PreHookOutcome::Blocked { reason } => {
                self.phase = InvocationPhase::Blocked;
                PreHookOutcome::Blocked { reason }
            }
        }
    }

    /// Evaluate post-hooks after the tool completed. A blocked invocation
    /// stays blocked; post evaluation is skipped.
    pub async fn complete(&mut self, dispatcher: &HookDispatcher) {
        if self.phase != InvocationPhase::Proceeding {
            tracing::debug!(phase = ?self.phase, "complete() outside Proceeding is a no-op");
            return;
        }
        self.phase = InvocationPhase::EvaluatingPost;
        dispatcher.evaluate_post(&self.ctx).await;
        self.phase = InvocationPhase::Done;
    }
}
