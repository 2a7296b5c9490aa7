//! Line-oriented command scripts for `dh run`.
//!
//! ```text
//! # comments and blank lines are ignored
//! stop at pkg.Main:12
//! run
//! @expect Breakpoint hit:
//! print counter
//! @cont-to-exit 3
//! ```
//!
//! Directives start with `@`; any other line is sent to the debugger as is.

use anyhow::{bail, Context};
use dh_core::markers::LINE_SEPARATOR;
use dh_session::{DebuggerCommand, DebuggerSession};
use tracing::info;

use crate::transcript::Transcript;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send a command and wait for the thread prompt.
    Send(DebuggerCommand),
    /// Wait for the bare `"> "` prompt.
    WaitPrompt,
    /// `cont` until the debuggee exits, at most N times.
    ContToExit(usize),
    Quit,
    /// The previous reply must contain this text.
    Expect(String),
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Send(cmd) => write!(f, "{cmd}"),
            Step::WaitPrompt => f.write_str("@wait-prompt"),
            Step::ContToExit(n) => write!(f, "@cont-to-exit {n}"),
            Step::Quit => f.write_str("@quit"),
            Step::Expect(text) => write!(f, "@expect {text}"),
        }
    }
}

pub fn parse(text: &str) -> anyhow::Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_line(line).with_context(|| format!("script line {}", idx + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_line(line: &str) -> anyhow::Result<Step> {
    let Some(directive) = line.strip_prefix('@') else {
        return Ok(Step::Send(DebuggerCommand::new(line)));
    };
    let (name, arg) = match directive.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (directive, ""),
    };
    match name {
        "wait-prompt" => Ok(Step::WaitPrompt),
        "quit" => Ok(Step::Quit),
        "cont-to-exit" => {
            let n = if arg.is_empty() {
                1
            } else {
                arg.parse::<usize>()
                    .with_context(|| format!("invalid attempt count '{arg}'"))?
            };
            Ok(Step::ContToExit(n))
        }
        "expect" if !arg.is_empty() => Ok(Step::Expect(arg.to_string())),
        "expect" => bail!("@expect needs the text to look for"),
        "exit-ok" if !arg.is_empty() => Ok(Step::Send(DebuggerCommand::new(arg).allow_exit())),
        "simple" if !arg.is_empty() => Ok(Step::Send(
            DebuggerCommand::new(arg).allow_simple_prompt(),
        )),
        other => bail!("unknown directive '@{other}'"),
    }
}

/// Run `steps` against a session that has just been launched, recording
/// every reply in `transcript`. Stops at the first failing step.
pub fn execute(
    session: &DebuggerSession,
    steps: &[Step],
    transcript: &mut Transcript,
) -> anyhow::Result<()> {
    let banner = session.wait_for_simple_prompt();
    transcript.record("@startup", &banner);
    banner.context("debugger did not show its prompt")?;

    let mut last_reply: Vec<String> = Vec::new();
    for step in steps {
        let label = step.to_string();
        match step {
            Step::Send(cmd) => {
                let reply = session.command(cmd.clone());
                transcript.record(&label, &reply);
                last_reply = reply.with_context(|| format!("command '{cmd}' failed"))?;
                print_reply(&label, &last_reply);
            }
            Step::WaitPrompt => {
                let reply = session.wait_for_simple_prompt();
                transcript.record(&label, &reply);
                last_reply = reply.context("no simple prompt")?;
            }
            Step::ContToExit(n) => {
                let attempts = session.continue_to_exit(*n);
                transcript.record(&label, &attempts.as_ref().map(|a| vec![format!("{a} attempts")]));
                let attempts = attempts?;
                info!(attempts, "debuggee exited");
                last_reply.clear();
            }
            Step::Quit => {
                let reply = session.quit();
                transcript.record(&label, &reply);
                last_reply = reply?;
            }
            Step::Expect(text) => {
                let joined = last_reply.join(LINE_SEPARATOR);
                let ok = joined.contains(text.as_str());
                transcript.record_check(&label, ok);
                if !ok {
                    bail!("expected '{text}' in the last reply, got:\n{joined}");
                }
            }
        }
    }
    Ok(())
}

fn print_reply(label: &str, reply: &[String]) {
    println!("> {label}");
    for line in reply {
        println!("{line}");
    }
}
