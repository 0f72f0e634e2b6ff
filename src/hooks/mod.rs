//! Hook dispatch: declarative lifecycle-event bindings become live
//! process-spawning handlers.
//!
//! Hook rules are declared in the settings document, grouped by source
//! lifecycle event. The dispatch builder keys them by the two host phases it
//! supports (pre- and post-invocation of a tool call) plus named event
//! channels for lifecycle events that only approximately correspond. A
//! pre-invocation command exiting with status 2 blocks the tool call; post
//! hooks are informational only.

mod command;
mod dispatch;
mod matcher;
mod settings;

pub use command::{HookPayload, HookVerdict, run_command};
pub use dispatch::{
    HookDispatcher, HookedInvocation, InvocationPhase, PreHookOutcome, ToolCallContext,
};
pub use matcher::Matcher;
pub use settings::{HookRule, SourceEvent, parse_hooks_settings};

/// Host event channel that the source's session-end-like events collapse
/// onto. The collapse is a lossy, documented approximation; finer routing is
/// available through `BridgeConfig::event_overrides`.
pub const IDLE_CHANNEL: &str = "idle";
