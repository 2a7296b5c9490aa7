use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use dh_core::config::{Config, SessionConfig};
use dh_session::{DebuggerSession, LaunchOptions};
use tracing::{info, warn};

use crate::script;
use crate::transcript::Transcript;

/// How long a script that did not end the debugger itself gets before the
/// process is killed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

pub struct RunOptions {
    pub script: PathBuf,
    pub tool: Option<String>,
    pub main: Option<String>,
    pub debuggee_options: Option<String>,
    pub transcript: Option<PathBuf>,
    pub poll_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub args: Vec<String>,
}

pub async fn run(config: &Config, opts: RunOptions) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&opts.script)
        .await
        .with_context(|| format!("cannot read script {}", opts.script.display()))?;
    let steps = script::parse(&text)?;

    let session_config = SessionConfig {
        poll_interval_ms: opts.poll_ms.unwrap_or(config.session.poll_interval_ms),
        timeout_ms: opts.timeout_ms.unwrap_or(config.session.timeout_ms),
    };
    session_config.validate()?;

    let tool = opts.tool.unwrap_or_else(|| config.debugger.tool.clone());
    let mut args = config.debugger.extra_args.clone();
    if let Some(main_class) = &opts.main {
        let mut launch = LaunchOptions::new(main_class.as_str());
        if let Some(vm_opts) = &opts.debuggee_options {
            launch = launch.debuggee_options(vm_opts.as_str());
        }
        args.extend(launch.connector_args());
    } else if opts.debuggee_options.is_some() {
        bail!("--debuggee-options requires --main");
    }
    args.extend(opts.args);

    let session = Arc::new(DebuggerSession::launch(&tool, args.as_slice(), session_config)?);
    let mut transcript = Transcript::new(&tool, &args);
    info!(session = %session.id(), steps = steps.len(), "running script");

    let worker = Arc::clone(&session);
    let runner = tokio::task::spawn_blocking(move || {
        let outcome = script::execute(&worker, &steps, &mut transcript);
        (transcript, outcome)
    });

    let (transcript, outcome) = tokio::select! {
        joined = runner => joined.context("script runner panicked")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, terminating debugger");
            session.terminate()?;
            bail!("interrupted");
        }
    };

    if let Some(path) = &opts.transcript {
        transcript
            .write_to(path)
            .await
            .with_context(|| format!("cannot write transcript {}", path.display()))?;
        info!(path = %path.display(), "transcript written");
    }

    let waiter = Arc::clone(&session);
    let exited = tokio::task::spawn_blocking(move || waiter.await_exit(EXIT_GRACE)).await?;
    if !exited {
        warn!("debugger still running after the script, terminating it");
        session.terminate()?;
    }

    outcome
}
