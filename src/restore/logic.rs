// mdump/src/restore/logic.rs
use chrono::Local;
use std::fs;
use std::path::PathBuf;

use crate::backup::archive::unpack_dump_archive;
use crate::config::RestoreConfig;
use crate::errors::{AppError, Result};
use crate::restore::db_restore::{RestoreTally, database_name_for, restore_dump_files};
use crate::utils::client_tools::DatabaseTools;
use crate::utils::prompt::Interaction;
use crate::utils::report::{Reporter, create_table};
use crate::utils::server::DatabaseServer;

/// Lists what the archive contains and whether each target database already exists.
pub async fn preview_dump_files<S: DatabaseServer, R: Reporter>(
    server: &mut S,
    reporter: &R,
    dump_files: &[PathBuf],
) {
    let mut table = create_table(&["Database Name", "File Size (KB)", "Status"]);
    for sql_file in dump_files {
        let db_name = database_name_for(sql_file).unwrap_or_default();
        let size_kb = fs::metadata(sql_file)
            .map(|m| format!("{:.1}", m.len() as f64 / 1024.0))
            .unwrap_or_else(|_| "N/A".to_string());
        let status = match server.database_exists(&db_name).await {
            Ok(true) => "EXISTS",
            Ok(false) => "NEW",
            Err(e) => {
                tracing::debug!(database = %db_name, error = %e, "Existence check failed");
                "UNKNOWN"
            }
        };
        table.add_row(vec![db_name, size_kb, status.to_string()]);
    }
    reporter.block(&format!("Databases to Restore\n{}", table));
}

async fn restore_extracted<S, T, I, R>(
    server: &mut S,
    tools: &T,
    interaction: &mut I,
    reporter: &R,
    restore_config: &RestoreConfig,
    dump_files: &[PathBuf],
) -> Result<RestoreTally>
where
    S: DatabaseServer,
    T: DatabaseTools,
    I: Interaction,
    R: Reporter,
{
    preview_dump_files(server, reporter, dump_files).await;

    if !interaction.confirm("Do you want to proceed with the restore?", false)? {
        return Err(AppError::Cancelled("Restore cancelled".to_string()));
    }

    restore_dump_files(
        server,
        tools,
        &restore_config.connection,
        dump_files,
        restore_config.on_conflict,
        interaction,
        reporter,
    )
    .await
}

/// Extracts the archive, confirms the plan and restores every dump file.
///
/// The extraction directory is removed whatever happens after it was created.
pub async fn perform_restore_orchestration<S, T, I, R>(
    server: &mut S,
    tools: &T,
    interaction: &mut I,
    reporter: &R,
    restore_config: &RestoreConfig,
) -> Result<RestoreTally>
where
    S: DatabaseServer,
    T: DatabaseTools,
    I: Interaction,
    R: Reporter,
{
    reporter.info(&format!(
        "Extracting {}...",
        restore_config.archive_source_path.display()
    ));
    let extracted = unpack_dump_archive(&restore_config.archive_source_path, &Local::now())?;
    reporter.success(&format!("Found {} SQL file(s)", extracted.dump_files.len()));

    let result = restore_extracted(
        server,
        tools,
        interaction,
        reporter,
        restore_config,
        &extracted.dump_files,
    )
    .await;

    if let Err(e) = fs::remove_dir_all(&extracted.directory) {
        reporter.warn(&format!(
            "Could not remove temporary directory {}: {}",
            extracted.directory.display(),
            e
        ));
    }

    let tally = result?;
    reporter.info(&format!(
        "\nRestore completed: {}/{} databases restored",
        tally.succeeded, tally.total
    ));
    if tally.skipped > 0 {
        reporter.info(&format!("Skipped: {}", tally.skipped));
    }
    if tally.failed > 0 {
        reporter.warn(&format!("Failed: {}", tally.failed));
    }

    if tally.succeeded == 0 {
        return Err(if tally.cancelled {
            AppError::Cancelled("Restore cancelled".to_string())
        } else {
            AppError::Restore("No databases were restored".to_string())
        });
    }
    Ok(tally)
}
