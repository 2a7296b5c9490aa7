//! Textual markers printed by a jdb-style debugger.
//!
//! The debugger has no structured protocol, so everything the harness knows
//! about its state comes from matching these strings against output lines.

/// Prompt printed when the debuggee is neither started nor suspended.
pub const SIMPLE_PROMPT: &str = "> ";

/// Thread prompt such as `main[1] ` or `main[12] > `.
///
/// Anchored to end of line because an array assignment echo (`a[89] = 10`)
/// would otherwise look like a prompt.
pub const THREAD_PROMPT_PATTERN: &str = r"[a-zA-Z0-9_-][a-zA-Z0-9_-]*\[[1-9][0-9]*\] [ >]*$";

pub const BREAKPOINT_HIT: &str = "Breakpoint hit:";

pub const APPLICATION_EXIT: &str = "The application exited";

pub const APPLICATION_DISCONNECTED: &str = "The application has been disconnected";

/// Line separator of the host platform.
pub const LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };
