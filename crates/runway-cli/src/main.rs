mod cmd;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use runway_core::RunwayError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "runway",
    about = "Deployment bootstrap sequencer — run pre-flight steps, then hand the foreground to the application server",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the config file (default: ./runway.yaml if present)
    #[arg(long, global = true, env = "RUNWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the startup sequence: pre-flight steps, then the server in the foreground
    Up {
        /// Print the resolved plan without executing anything
        #[arg(long)]
        dry_run: bool,

        /// Run the pre-flight steps only, skip the server launch
        #[arg(long)]
        skip_server: bool,
    },

    /// Block until a TCP endpoint accepts connections
    Wait {
        /// Endpoint to probe, host:port
        addr: String,

        /// Delay between connect attempts, in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Give up after this many seconds
        #[arg(long, default_value = "60")]
        timeout_seconds: u64,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Scaffold a default runway.yaml in the current directory
    Init,
}

fn main() {
    let cli = Cli::parse();

    // `up` supervises a foreground server, so its own step logging is
    // on by default; everything else stays quiet unless asked.
    let default_level = match &cli.command {
        Commands::Up { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Up {
            dry_run,
            skip_server,
        } => cmd::up::run(config_path, dry_run, skip_server, cli.json),
        Commands::Wait {
            addr,
            interval_ms,
            timeout_seconds,
        } => cmd::wait::run(&addr, interval_ms, timeout_seconds),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
        Commands::Init => cmd::init::run(config_path),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<RunwayError>()
                .map(RunwayError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}
