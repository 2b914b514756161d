//! TabGuard - replay recorded browser events through the interception pipeline.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use tabguard_app::{load_trace, AppConfig, Replay};
use tabguard_core::BlockedDetails;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// TabGuard - per-tab request filtering pipeline
#[derive(Parser, Debug)]
#[command(name = "tabguard", version, about)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Also write logs to daily rotated files in the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a recorded event trace and print one verdict per line
    Replay {
        /// JSON array of lifecycle events
        #[arg(long)]
        trace: PathBuf,

        /// Config file (defaults to the platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Include the audit log in the final summary
        #[arg(long)]
        dump_log: bool,
    },

    /// Decode a blocked-page token
    DecodeToken {
        /// Value of the `details` query parameter
        token: String,
    },
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "tabguard", "TabGuard").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging. Console output goes to stderr so stdout stays JSON.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("tabguard={0},tabguard_core={0},tabguard_app={0},warn", log_level))
    });

    if args.log_file {
        if let Some(log_dir) = logs_dir() {
            if std::fs::create_dir_all(&log_dir).is_ok() {
                let file_appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .max_log_files(5)
                    .filename_prefix("tabguard")
                    .filename_suffix("log")
                    .build(&log_dir)
                    .ok();

                if let Some(appender) = file_appender {
                    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stderr))
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();

                    tracing::info!("Logging to {:?}", log_dir);
                    return Some(guard);
                }
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if args.log_file {
        tracing::warn!("File logging unavailable, using console only");
    }
    None
}

fn run_replay(trace: PathBuf, config: Option<PathBuf>, dump_log: bool) -> anyhow::Result<()> {
    let config = AppConfig::resolve(config.as_deref())?;
    let events = load_trace(&trace)?;
    tracing::info!(events = events.len(), trace = %trace.display(), "replaying trace");

    let mut replay = Replay::new(config);
    let records = replay.run(&events);
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }

    let summary = replay.summary(&records, dump_log);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn decode_token(token: &str) -> anyhow::Result<()> {
    let details = BlockedDetails::decode(token).context("not a blocked-page token")?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args);

    match args.command {
        Command::Replay {
            trace,
            config,
            dump_log,
        } => run_replay(trace, config, dump_log),
        Command::DecodeToken { token } => decode_token(&token),
    }
}
