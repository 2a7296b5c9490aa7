//! Drive an interactive command-line debugger as a child process.
//!
//! The debugger speaks no structured protocol: commands go in on stdin as
//! text lines and the harness decides a reply is complete by spotting a
//! prompt in the most recent output lines.
//!
//! Key components:
//! - [`output_sink::OutputSink`]: lock-guarded byte accumulator that splits
//!   output into lines and wakes the waiting controller
//! - [`pump`]: background threads copying stdout/stderr into the sink
//! - [`session::DebuggerSession`]: launch, send commands, wait for prompts,
//!   continue to exit, quit, terminate
//! - [`command::DebuggerCommand`] and [`launch::LaunchOptions`]: what to send
//!   and how to start a local debuggee

pub mod command;
pub mod error;
pub mod launch;
pub mod output_sink;
pub mod prompt;
pub mod pump;
pub mod session;

pub use command::DebuggerCommand;
pub use error::{Result, SessionError};
pub use launch::LaunchOptions;
pub use output_sink::OutputSink;
pub use session::DebuggerSession;
