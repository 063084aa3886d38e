// mdump/src/backup/logic.rs
use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::backup::archive::pack_dump_files;
use crate::backup::db_dump::run_dumps;
use crate::backup::output_path::{OutputSpec, resolve_output_path};
use crate::config::{BackupConfig, ConnectionParams};
use crate::errors::{AppError, Result};
use crate::utils::client_tools::DatabaseTools;
use crate::utils::databases::user_databases;
use crate::utils::prompt::Interaction;
use crate::utils::report::{Reporter, create_table, format_megabytes};
use crate::utils::selection::{Selection, parse_selection};
use crate::utils::server::DatabaseServer;

/// What a finished backup produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    pub archive: PathBuf,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Shows the user databases as a numbered table with their approximate size.
pub async fn display_databases<S: DatabaseServer, R: Reporter>(
    server: &mut S,
    reporter: &R,
    databases: &[String],
) {
    let mut table = create_table(&["#", "Database Name", "Size"]);
    for (i, db_name) in databases.iter().enumerate() {
        let size = match server.database_size(db_name).await {
            Ok(bytes) => format_megabytes(bytes),
            Err(e) => {
                tracing::debug!(database = %db_name, error = %e, "Size query failed");
                "N/A".to_string()
            }
        };
        table.add_row(vec![(i + 1).to_string(), db_name.clone(), size]);
    }
    reporter.block(&format!("Available Databases\n{}", table));
}

/// Asks until the operator confirms a valid selection. An empty answer cancels.
pub fn select_databases<I: Interaction, R: Reporter>(
    interaction: &mut I,
    reporter: &R,
    databases: &[String],
) -> Result<Vec<String>> {
    reporter.info("\nSelect databases to backup:");
    reporter.info("Options:");
    reporter.info("- Individual numbers: 1,3,5");
    reporter.info("- Ranges: 1-3");
    reporter.info("- Combinations: 1,3-5,7");
    reporter.info("- 'all' for all databases");
    reporter.info("- Enter to exit");

    loop {
        let answer = interaction.ask("\nYour selection", "")?;
        let indices = match parse_selection(&answer, databases.len()) {
            Ok(Selection::Declined) => {
                return Err(AppError::Cancelled("No databases selected".to_string()));
            }
            Ok(Selection::Indices(indices)) => indices,
            Err(e) => {
                reporter.error(&format!("Invalid selection: {}", e));
                reporter.warn("Please try again");
                continue;
            }
        };

        let selected: Vec<String> = indices.iter().map(|i| databases[i - 1].clone()).collect();
        reporter.info("\nSelected databases:");
        for db in &selected {
            reporter.info(&format!("  • {}", db));
        }

        if interaction.confirm("\nContinue with this selection?", true)? {
            return Ok(selected);
        }
    }
}

/// Resolves which databases to back up: the configured list when there is one, otherwise
/// the operator's interactive choice.
pub async fn choose_databases<S: DatabaseServer, I: Interaction, R: Reporter>(
    server: &mut S,
    interaction: &mut I,
    reporter: &R,
    backup_config: &BackupConfig,
) -> Result<Vec<String>> {
    let available = user_databases(server.list_databases().await?);
    if available.is_empty() {
        return Err(AppError::Backup("No user databases found".to_string()));
    }

    match &backup_config.databases_to_backup {
        Some(wanted) => {
            let mut selected = Vec::new();
            for db in wanted {
                if available.contains(db) {
                    if !selected.contains(db) {
                        selected.push(db.clone());
                    }
                } else {
                    reporter.warn(&format!("Database '{}' not found on server, skipping", db));
                }
            }
            if selected.is_empty() {
                return Err(AppError::Backup("Specified databases not found".to_string()));
            }
            reporter.info(&format!("Backing up: {}", selected.join(", ")));
            Ok(selected)
        }
        None => {
            display_databases(server, reporter, &available).await;
            select_databases(interaction, reporter, &available)
        }
    }
}

/// Dumps the databases and packs the successful dumps into one archive.
pub fn create_backup<T: DatabaseTools, R: Reporter>(
    tools: &T,
    conn: &ConnectionParams,
    databases: &[String],
    spec: &OutputSpec,
    reporter: &R,
    now: &DateTime<Local>,
) -> Result<BackupOutcome> {
    let results = run_dumps(tools, conn, databases, spec, reporter)?;

    let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.succeeded);
    if ok.is_empty() {
        return Err(AppError::Backup("Could not create any backup".to_string()));
    }

    let files: Vec<PathBuf> = ok.iter().map(|r| r.file_path.clone()).collect();
    let archive = pack_dump_files(&files, spec, now)?;

    Ok(BackupOutcome {
        archive,
        succeeded: ok.into_iter().map(|r| r.name).collect(),
        failed: failed.into_iter().map(|r| r.name).collect(),
    })
}

/// Main backup flow against an already connected server.
pub async fn perform_backup_orchestration<S, T, I, R>(
    server: &mut S,
    tools: &T,
    interaction: &mut I,
    reporter: &R,
    backup_config: &BackupConfig,
) -> Result<BackupOutcome>
where
    S: DatabaseServer,
    T: DatabaseTools,
    I: Interaction,
    R: Reporter,
{
    let databases = choose_databases(server, interaction, reporter, backup_config).await?;

    let now = Local::now();
    let spec = resolve_output_path(backup_config.output_path.as_deref(), &now)?;
    reporter.info(&format!("Output directory: {}", spec.working_directory.display()));
    if let Some(name) = &spec.explicit_archive_name {
        reporter.info(&format!("Custom filename: {}", name));
    }

    reporter.info(&format!("\nStarting backup of {} database(s)...", databases.len()));
    let outcome = match create_backup(tools, &backup_config.connection, &databases, &spec, reporter, &now) {
        Ok(outcome) => outcome,
        Err(e) => {
            spec.remove_if_unused();
            return Err(e);
        }
    };

    let size_mb = std::fs::metadata(&outcome.archive)
        .map(|m| m.len() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0);
    reporter.success(&format!(
        "Backup completed: {} succeeded, {} failed",
        outcome.succeeded.len(),
        outcome.failed.len()
    ));
    if !outcome.failed.is_empty() {
        reporter.warn(&format!("Not included: {}", outcome.failed.join(", ")));
    }
    reporter.info(&format!("File: {}", outcome.archive.display()));
    reporter.info(&format!("Size: {:.2} MB", size_mb));

    Ok(outcome)
}
