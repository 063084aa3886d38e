mod logic;
pub(crate) mod archive; // tar.gz packing and extraction
pub(crate) mod db_dump; // per-database mysqldump runs
pub(crate) mod output_path; // output directory / archive name resolution

use crate::config::BackupConfig;
use crate::errors::Result;
use crate::utils::client_tools::MysqlClientTools;
use crate::utils::prompt::TerminalPrompt;
use crate::utils::report::Reporter;
use crate::utils::server::MySqlServer;

pub use logic::BackupOutcome;

/// Public entry point for the backup process.
/// Wires the real server connection, client tools and terminal prompt into the backup flow.
pub async fn run_backup_flow<R: Reporter>(backup_config: &BackupConfig, reporter: &R) -> Result<BackupOutcome> {
    let tools = MysqlClientTools::discover();
    tools.require_dump()?;

    reporter.info(&format!(
        "Connecting to MySQL: {}",
        backup_config.connection.display_target()
    ));
    let mut server = MySqlServer::connect(&backup_config.connection).await?;
    reporter.success("Connection successful");

    let mut prompt = TerminalPrompt::new(backup_config.assume_yes);
    let outcome =
        logic::perform_backup_orchestration(&mut server, &tools, &mut prompt, reporter, backup_config).await;

    if let Err(e) = server.close().await {
        tracing::debug!(error = %e, "Failed to close MySQL connection cleanly");
    }
    outcome
}
