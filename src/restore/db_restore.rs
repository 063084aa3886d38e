// mdump/src/restore/db_restore.rs
use std::path::{Path, PathBuf};

use crate::config::{ConflictPolicy, ConnectionParams};
use crate::errors::{AppError, Result};
use crate::utils::client_tools::DatabaseTools;
use crate::utils::databases::validate_database_name;
use crate::utils::prompt::Interaction;
use crate::utils::report::Reporter;
use crate::utils::server::DatabaseServer;

/// What happens to one dump file during restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreDecision {
    Create,
    Overwrite,
    Skip,
    CancelAll,
}

/// Counts for one restore run. `total` is the number of dump files found, whether or not
/// they were reached before a cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreTally {
    pub succeeded: usize,
    pub total: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// `shop.sql` restores into `shop`.
pub fn database_name_for(dump_file: &Path) -> Option<String> {
    dump_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// Prompts until the operator picks overwrite, skip or cancel. Defaults to skip.
pub fn ask_conflict_choice<I: Interaction, R: Reporter>(
    interaction: &mut I,
    reporter: &R,
) -> Result<RestoreDecision> {
    loop {
        let answer = interaction.ask("What would you like to do? [overwrite/skip/cancel]", "skip")?;
        match answer.trim().to_ascii_lowercase().as_str() {
            "overwrite" | "o" => return Ok(RestoreDecision::Overwrite),
            "skip" | "s" => return Ok(RestoreDecision::Skip),
            "cancel" | "c" => return Ok(RestoreDecision::CancelAll),
            _ => reporter.error("Please select one of the available options: overwrite, skip, cancel"),
        }
    }
}

/// Maps existence of the target plus the conflict policy to a decision.
pub fn decide<I: Interaction, R: Reporter>(
    exists: bool,
    db_name: &str,
    policy: ConflictPolicy,
    interaction: &mut I,
    reporter: &R,
) -> Result<RestoreDecision> {
    if !exists {
        return Ok(RestoreDecision::Create);
    }
    reporter.warn(&format!("Database '{}' already exists", db_name));
    match policy {
        ConflictPolicy::Ask => ask_conflict_choice(interaction, reporter),
        ConflictPolicy::Overwrite => Ok(RestoreDecision::Overwrite),
        ConflictPolicy::Skip => Ok(RestoreDecision::Skip),
        ConflictPolicy::Cancel => Ok(RestoreDecision::CancelAll),
    }
}

/// Restores each dump file in order, resolving conflicts with existing databases.
///
/// Per-database problems (drop/create errors, non-zero restore exit) are counted and the
/// loop moves on. `CancelAll` stops the loop and keeps what was already restored.
pub async fn restore_dump_files<S, T, I, R>(
    server: &mut S,
    tools: &T,
    conn: &ConnectionParams,
    dump_files: &[PathBuf],
    policy: ConflictPolicy,
    interaction: &mut I,
    reporter: &R,
) -> Result<RestoreTally>
where
    S: DatabaseServer,
    T: DatabaseTools,
    I: Interaction,
    R: Reporter,
{
    let mut tally = RestoreTally {
        total: dump_files.len(),
        ..Default::default()
    };

    for sql_file in dump_files {
        let Some(db_name) = database_name_for(sql_file) else {
            reporter.error(&format!("Cannot derive a database name from {}", sql_file.display()));
            tally.failed += 1;
            continue;
        };
        if let Err(e) = validate_database_name(&db_name) {
            reporter.error(&e.to_string());
            tally.failed += 1;
            continue;
        }

        let exists = match server.database_exists(&db_name).await {
            Ok(exists) => exists,
            Err(e) => {
                reporter.error(&format!("Error checking database {}: {}", db_name, e));
                tally.failed += 1;
                continue;
            }
        };

        match decide(exists, &db_name, policy, interaction, reporter)? {
            RestoreDecision::CancelAll => {
                reporter.warn("Restore cancelled");
                tally.cancelled = true;
                break;
            }
            RestoreDecision::Skip => {
                reporter.warn(&format!("Skipped: {}", db_name));
                tally.skipped += 1;
                continue;
            }
            RestoreDecision::Overwrite => {
                if let Err(e) = server.drop_database(&db_name).await {
                    reporter.error(&format!("Error dropping database {}: {}", db_name, e));
                    tally.failed += 1;
                    continue;
                }
                reporter.warn(&format!("Dropped database: {}", db_name));
            }
            RestoreDecision::Create => {}
        }

        if let Err(e) = server.create_database(&db_name).await {
            reporter.error(&format!("Error creating database {}: {}", db_name, e));
            tally.failed += 1;
            continue;
        }
        reporter.success(&format!("Created database: {}", db_name));

        let file_name = sql_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.info(&format!("Restoring {} from {}...", db_name, file_name));
        match tools.restore(conn, &db_name, sql_file) {
            Ok(output) if output.success() => {
                reporter.success(&format!("Successfully restored database: {}", db_name));
                tally.succeeded += 1;
            }
            Ok(output) => {
                reporter.error(&format!("Error restoring {}: {}", db_name, output.describe_failure()));
                tally.failed += 1;
            }
            Err(e @ AppError::ToolMissing { .. }) => return Err(e),
            Err(e) => {
                reporter.error(&format!("Unexpected error restoring {}: {}", db_name, e));
                tally.failed += 1;
            }
        }
    }

    Ok(tally)
}
