/// A text command for the debugger plus how its reply may end.
///
/// By default a reply must end with a thread prompt such as `main[1] ` and
/// the debugger must still be alive afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerCommand {
    pub text: String,
    /// Accept the bare `"> "` prompt as the end of the reply.
    pub allow_simple_prompt: bool,
    /// The debugger may exit while (or before) the reply is read.
    pub allow_exit: bool,
}

impl DebuggerCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            allow_simple_prompt: false,
            allow_exit: false,
        }
    }

    pub fn allow_simple_prompt(mut self) -> Self {
        self.allow_simple_prompt = true;
        self
    }

    pub fn allow_exit(mut self) -> Self {
        self.allow_exit = true;
        self
    }

    // -- catalogue --

    /// Start the debuggee, optionally with program arguments.
    pub fn run(args: &[&str]) -> Self {
        Self::new(join("run", args))
    }

    pub fn cont() -> Self {
        Self::new("cont")
    }

    pub fn quit() -> Self {
        Self::new("quit").allow_exit()
    }

    pub fn stop_at(class: &str, line: u32) -> Self {
        Self::new(format!("stop at {class}:{line}"))
    }

    pub fn stop_in(class: &str, method: &str) -> Self {
        Self::new(format!("stop in {class}.{method}"))
    }

    /// Clear a breakpoint given as `Class:line` or `Class.method`.
    pub fn clear(location: &str) -> Self {
        Self::new(format!("clear {location}"))
    }

    pub fn step() -> Self {
        Self::new("step")
    }

    pub fn next() -> Self {
        Self::new("next")
    }

    pub fn step_up() -> Self {
        Self::new("step up")
    }

    pub fn where_thread(thread: &str) -> Self {
        Self::new(format!("where {thread}"))
    }

    pub fn threads() -> Self {
        Self::new("threads")
    }

    pub fn locals() -> Self {
        Self::new("locals")
    }

    pub fn print(expr: &str) -> Self {
        Self::new(format!("print {expr}"))
    }

    pub fn eval(expr: &str) -> Self {
        Self::new(format!("eval {expr}"))
    }

    pub fn set(lhs: &str, rhs: &str) -> Self {
        Self::new(format!("set {lhs} = {rhs}"))
    }

    pub fn catch_exception(class: &str) -> Self {
        Self::new(format!("catch {class}"))
    }
}

impl From<&str> for DebuggerCommand {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for DebuggerCommand {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl std::fmt::Display for DebuggerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

fn join(verb: &str, args: &[&str]) -> String {
    std::iter::once(verb)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
