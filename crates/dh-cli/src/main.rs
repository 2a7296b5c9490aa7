mod commands;
mod script;
mod transcript;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dh_core::config::Config;

/// debug-harness CLI -- drive an interactive command-line debugger from a script.
#[derive(Parser)]
#[command(name = "dh", version, about)]
struct Cli {
    /// Config file (defaults to ~/.debug-harness/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the debugger and execute a command script against it.
    Run {
        /// Script with one debugger command or directive per line.
        #[arg(long)]
        script: PathBuf,
        /// Debugger executable (overrides `debugger.tool`).
        #[arg(long)]
        tool: Option<String>,
        /// Debuggee main class; adds local launch connector arguments.
        #[arg(long)]
        main: Option<String>,
        /// VM options for the debuggee (used with --main).
        #[arg(long, allow_hyphen_values = true)]
        debuggee_options: Option<String>,
        /// Write a JSON transcript of every step to this file.
        #[arg(long)]
        transcript: Option<PathBuf>,
        /// Override `session.poll_interval_ms`.
        #[arg(long)]
        poll_ms: Option<u64>,
        /// Override `session.timeout_ms`.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Extra debugger arguments.
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the connector arguments for a local debuggee launch.
    LaunchArgs {
        /// Debuggee main class.
        #[arg(long)]
        main: String,
        /// VM options for the debuggee.
        #[arg(long, allow_hyphen_values = true)]
        options: Option<String>,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    dh_telemetry::logging::init("dh", &config.general.log_level, config.general.log_json);

    match cli.command {
        Commands::Run {
            script,
            tool,
            main,
            debuggee_options,
            transcript,
            poll_ms,
            timeout_ms,
            args,
        } => {
            let opts = commands::run::RunOptions {
                script,
                tool,
                main,
                debuggee_options,
                transcript,
                poll_ms,
                timeout_ms,
                args,
            };
            commands::run::run(&config, opts).await?;
        }
        Commands::LaunchArgs { main, options } => {
            commands::launch_args::run(&main, options.as_deref());
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
