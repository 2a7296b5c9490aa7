use std::ffi::OsStr;
use std::io::{self, Write as IoWrite};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use dh_core::config::SessionConfig;
use dh_core::markers::{
    APPLICATION_DISCONNECTED, APPLICATION_EXIT, LINE_SEPARATOR, SIMPLE_PROMPT,
    THREAD_PROMPT_PATTERN,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command::DebuggerCommand;
use crate::error::{Result, SessionError};
use crate::launch::LaunchOptions;
use crate::output_sink::OutputSink;
use crate::prompt::PromptMatcher;
use crate::pump;

/// Upper bound on a single status poll inside [`DebuggerSession::await_exit`].
const EXIT_POLL_STEP: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// DebuggerSession
// ---------------------------------------------------------------------------

/// A running debugger process driven through its stdin and its combined
/// stdout/stderr.
///
/// Stdout and stderr are pumped by two independent threads into one
/// [`OutputSink`], so the relative order of lines from the two streams is
/// whatever the OS delivered.
///
/// The caller is responsible for ending the process (`quit`, `terminate`);
/// a session that is dropped while the process still runs kills it.
pub struct DebuggerSession {
    id: Uuid,
    program: String,
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    sink: Arc<OutputSink>,
    config: SessionConfig,
    thread_prompt: PromptMatcher,
    _pumps: Vec<JoinHandle<u64>>,
}

impl DebuggerSession {
    /// Spawn `program` with `args` and start pumping its output.
    pub fn launch<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;
        let thread_prompt = PromptMatcher::new(THREAD_PROMPT_PATTERN)?;
        let id = Uuid::new_v4();

        let command_line = std::iter::once(program.to_string())
            .chain(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");
        info!(session = %id, command = %command_line, "launching debugger");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SessionError::LaunchFailed {
                program: program.to_string(),
                source,
            })?;

        let sink = Arc::new(OutputSink::new(LINE_SEPARATOR));
        let pumps = match start_pumps(&mut child, &sink) {
            Ok(pumps) => pumps,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::other("debugger stdin was not captured").into());
        };

        debug!(session = %id, pid = child.id(), "debugger started");

        Ok(Self {
            id,
            program: program.to_string(),
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            sink,
            config,
            thread_prompt,
            _pumps: pumps,
        })
    }

    /// Launch `tool` connected to a freshly started local debuggee.
    pub fn launch_local(tool: &str, options: &LaunchOptions, config: SessionConfig) -> Result<Self> {
        Self::launch(tool, options.connector_args().as_slice(), config)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The shared output accumulator.
    pub fn output(&self) -> &OutputSink {
        &self.sink
    }

    // -- process status --

    /// Non-blocking check whether the debugger process has exited.
    pub fn is_terminated(&self) -> bool {
        let mut child = self.lock_child();
        match child.try_wait() {
            Ok(Some(_status)) => true,
            Ok(None) => false,
            Err(e) => {
                warn!(session = %self.id, "cannot query debugger status: {e}");
                true
            }
        }
    }

    /// Exit code once the process has exited, `None` while it runs or when it
    /// was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        let mut child = self.lock_child();
        child.try_wait().ok().flatten().and_then(|status| status.code())
    }

    /// Wait up to `timeout` for the process to exit.
    ///
    /// Returns `false` when exit could not be confirmed in time.
    pub fn await_exit(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_terminated() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(EXIT_POLL_STEP.min(deadline - now));
        }
    }

    /// Kill the debugger. Best effort: an already exited process is fine.
    pub fn terminate(&self) -> Result<()> {
        let mut child = self.lock_child();
        info!(session = %self.id, "terminating debugger");
        match child.kill() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e.into()),
        }
        let _ = child.try_wait();
        Ok(())
    }

    // -- waiting for output --

    /// Wait until a line among the last `lines` lines fully matches `pattern`
    /// (or contains `"> "` when `allow_simple_prompt` is set).
    ///
    /// On a match the reply is returned and the sink is cleared. The wait is
    /// bounded by the configured silence timeout, restarted whenever new
    /// output arrives. If the process exits first, the output collected so
    /// far is returned when `allow_exit` is set; otherwise the call fails
    /// with [`SessionError::Timeout`].
    pub fn wait_for_pattern(
        &self,
        pattern: &str,
        allow_simple_prompt: bool,
        lines: usize,
        allow_exit: bool,
    ) -> Result<Vec<String>> {
        let matcher = PromptMatcher::new(pattern)?;
        self.wait_for(&matcher, allow_simple_prompt, lines, allow_exit)
    }

    /// Wait for the bare `"> "` prompt on the last line.
    pub fn wait_for_simple_prompt(&self) -> Result<Vec<String>> {
        self.wait_for_pattern(SIMPLE_PROMPT, true, 1, false)
    }

    fn wait_for(
        &self,
        matcher: &PromptMatcher,
        allow_simple_prompt: bool,
        lines: usize,
        allow_exit: bool,
    ) -> Result<Vec<String>> {
        let timeout = self.config.timeout();
        let poll_interval = self.config.poll_interval();
        let mut quiet_since = Instant::now();

        while quiet_since.elapsed() < timeout {
            if self.sink.wait_for_data(poll_interval) {
                quiet_since = Instant::now();
            }
            let reply = self.sink.snapshot();
            if matcher.matches_tail(&reply, lines, allow_simple_prompt) {
                self.log_reply(&reply);
                return Ok(self.sink.reset());
            }
            if self.is_terminated() {
                // trailing output may still be in the pipes
                self.sink.wait_for_streams_closed(poll_interval);
                let reply = self.sink.snapshot();
                self.log_reply(&reply);
                if matcher.matches_tail(&reply, lines, allow_simple_prompt) {
                    return Ok(self.sink.reset());
                }
                if !allow_exit {
                    return Err(self.timeout_error(matcher, lines, true));
                }
                debug!(session = %self.id, "debugger exited while waiting");
                return Ok(reply);
            }
        }

        self.log_reply(&self.sink.snapshot());
        Err(self.timeout_error(matcher, lines, false))
    }

    // -- commands --

    /// Send a command and wait for the next thread prompt.
    pub fn command(&self, cmd: impl Into<DebuggerCommand>) -> Result<Vec<String>> {
        let cmd = cmd.into();
        if self.is_terminated() {
            if cmd.allow_exit {
                self.sink.wait_for_streams_closed(self.config.poll_interval());
                self.sink.snapshot();
                return Ok(self.sink.reset());
            }
            return Err(SessionError::CommandToTerminated(cmd.text));
        }

        info!(session = %self.id, "> {}", cmd.text);
        self.write_line(&cmd.text)
            .map_err(|source| SessionError::WriteFailed {
                command: cmd.text.clone(),
                source,
            })?;

        self.wait_for(&self.thread_prompt, cmd.allow_simple_prompt, 1, cmd.allow_exit)
    }

    /// Send `cont` until the debuggee reports that it exited, at most
    /// `max_attempts` times. Returns the number of commands sent.
    pub fn continue_to_exit(&self, max_attempts: usize) -> Result<usize> {
        let cont = DebuggerCommand::cont().allow_exit();
        let mut attempts = 0;
        let mut exited = false;
        while attempts < max_attempts && !self.is_terminated() {
            attempts += 1;
            let reply = self.command(cont.clone())?;
            if announces_exit(&reply) {
                exited = true;
                break;
            }
        }
        if !exited && !self.is_terminated() {
            return Err(SessionError::DidNotExit {
                attempts: max_attempts,
            });
        }
        info!(session = %self.id, attempts, "debuggee exited");
        Ok(attempts)
    }

    /// Leave the debugger with `quit`.
    pub fn quit(&self) -> Result<Vec<String>> {
        self.command(DebuggerCommand::quit())
    }

    fn write_line(&self, text: &str) -> io::Result<()> {
        let mut stdin = self.stdin.lock().unwrap_or_else(|e| {
            warn!("stdin lock was poisoned, recovering");
            e.into_inner()
        });
        stdin.write_all(text.as_bytes())?;
        stdin.write_all(LINE_SEPARATOR.as_bytes())?;
        stdin.flush()
    }

    fn log_reply(&self, reply: &[String]) {
        for line in reply {
            info!(session = %self.id, "[{}] {line}", self.tool_name());
        }
    }

    fn tool_name(&self) -> &str {
        std::path::Path::new(&self.program)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.program)
    }

    fn timeout_error(&self, matcher: &PromptMatcher, lines: usize, terminated: bool) -> SessionError {
        SessionError::Timeout {
            timeout: self.config.timeout(),
            pattern: matcher.pattern().to_string(),
            lines,
            terminated,
        }
    }

    fn lock_child(&self) -> MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(|e| {
            warn!("child lock was poisoned, recovering");
            e.into_inner()
        })
    }
}

/// True when a reply carries jdb's exit or disconnect notice.
fn announces_exit(reply: &[String]) -> bool {
    reply
        .iter()
        .any(|line| line.contains(APPLICATION_EXIT) || line.contains(APPLICATION_DISCONNECTED))
}

fn start_pumps(child: &mut Child, sink: &Arc<OutputSink>) -> Result<Vec<JoinHandle<u64>>> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("debugger stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("debugger stderr was not captured"))?;
    let out = pump::spawn("stdout", stdout, Arc::clone(sink))?;
    let err = pump::spawn("stderr", stderr, Arc::clone(sink))?;
    Ok(vec![out, err])
}

impl Drop for DebuggerSession {
    fn drop(&mut self) {
        if !self.is_terminated() {
            debug!(session = %self.id, "session dropped with live debugger, killing it");
            let mut child = self.lock_child();
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl std::fmt::Debug for DebuggerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebuggerSession")
            .field("id", &self.id)
            .field("program", &self.program)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
