//! MySQL Backup/Restore Tool
//!
//! Dumps selected databases into one tar.gz archive and restores such archives back
//! into a server, resolving conflicts with existing databases.

// mdump/src/main.rs
mod backup;
mod config;
mod errors;
mod utils;
mod restore;

use clap::{Args, Parser, Subcommand};
use config::{AppConfig, ConflictPolicy, ConnectionOverrides};
use errors::{AppError, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use utils::report::{ConsoleReporter, Reporter};

/// Back up and restore MySQL databases.
#[derive(Parser)]
#[command(name = "mdump")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a JSON config file (defaults to ./config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suppress progress and info messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Dump selected databases into a tar.gz archive (default)
    Backup(BackupArgs),
    /// Restore databases from a tar.gz archive
    Restore(RestoreArgs),
}

/// Connection flags shared by both commands.
#[derive(Args)]
struct ConnectionArgs {
    /// MySQL host
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// MySQL user
    #[arg(short, long)]
    user: Option<String>,

    /// Prompt for the MySQL password
    #[arg(short = 'p', long = "password")]
    prompt_password: bool,

    /// MySQL port
    #[arg(short = 'P', long)]
    port: Option<u16>,
}

#[derive(Args)]
struct BackupArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Output directory, or an archive name ending in .tar.gz, .tar or .zip
    #[arg(short, long)]
    output: Option<String>,

    /// Comma separated databases to back up without prompting
    #[arg(short, long, value_delimiter = ',')]
    databases: Option<Vec<String>>,

    /// Accept confirmations without asking
    #[arg(short = 'y', long)]
    yes: bool,
}

#[derive(Args)]
struct RestoreArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Backup archive to restore
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// What to do when a database already exists
    #[arg(long, value_enum)]
    on_conflict: Option<ConflictPolicy>,

    /// Accept confirmations without asking
    #[arg(short = 'y', long)]
    yes: bool,
}

/// Main entry point for the backup/restore tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse_from(with_default_command(std::env::args_os().collect()));
    init_tracing(cli.verbose);
    let reporter = ConsoleReporter::new(cli.quiet);

    match run_app(cli, &reporter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            reporter.warn(&format!("Operation cancelled: {}", e));
            e.exit_code()
        }
        Err(e) => {
            reporter.error(&format!("Error: {}", e));
            tracing::debug!(error = ?e, "Operation failed");
            e.exit_code()
        }
    }
}

/// Running without a subcommand, or with a flag first, means backup, so `mdump -d shop`
/// works as before.
fn with_default_command(mut args: Vec<OsString>) -> Vec<OsString> {
    const PASSTHROUGH: &[&str] = &["-h", "--help", "-V", "--version"];
    let needs_command = match args.get(1) {
        None => true,
        Some(first) => first
            .to_str()
            .is_some_and(|first| first.starts_with('-') && !PASSTHROUGH.contains(&first)),
    };
    if needs_command {
        args.insert(1.min(args.len()), OsString::from("backup"));
    }
    args
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn connection_overrides(args: &ConnectionArgs, app_config: &AppConfig) -> Result<ConnectionOverrides> {
    let password = if args.prompt_password && !app_config.has_configured_password() {
        Some(prompt_password()?)
    } else {
        None
    };
    Ok(ConnectionOverrides {
        host: args.host.clone(),
        user: args.user.clone(),
        password,
        port: args.port,
    })
}

async fn run_app<R: Reporter>(cli: Cli, reporter: &R) -> Result<()> {
    let app_config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Backup(args) => {
            let overrides = connection_overrides(&args.connection, &app_config)?;
            let backup_config =
                app_config.load_backup_config(&overrides, args.output, args.databases, args.yes)?;
            reporter.info("🚀 Starting Backup Process...");
            backup::run_backup_flow(&backup_config, reporter).await?;
        }
        Command::Restore(args) => {
            let overrides = connection_overrides(&args.connection, &app_config)?;
            let restore_config =
                app_config.load_restore_config(&overrides, args.file, args.on_conflict, args.yes)?;
            reporter.info("🔄 Starting Restore Process...");
            restore::run_restore_flow(&restore_config, reporter).await?;
        }
    }
    Ok(())
}

/// Prompts for the password without echoing it. An empty line is an empty password.
fn prompt_password() -> Result<String> {
    password_or_cancel(rpassword::prompt_password("MySQL password: "))
}

/// Closed input surfaces as `UnexpectedEof` and cancels the run.
fn password_or_cancel(read: std::io::Result<String>) -> Result<String> {
    match read {
        Ok(password) => Ok(password),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(AppError::Cancelled("input closed".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
