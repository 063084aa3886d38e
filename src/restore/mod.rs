mod logic;
pub(crate) mod db_restore; // conflict handling and per-database mysql runs

use crate::config::RestoreConfig;
use crate::errors::Result;
use crate::utils::client_tools::MysqlClientTools;
use crate::utils::prompt::TerminalPrompt;
use crate::utils::report::Reporter;
use crate::utils::server::MySqlServer;

pub use db_restore::RestoreTally;

/// Public entry point for the restore process.
pub async fn run_restore_flow<R: Reporter>(restore_config: &RestoreConfig, reporter: &R) -> Result<RestoreTally> {
    let tools = MysqlClientTools::discover();
    tools.require_restore()?;

    reporter.info(&format!(
        "Connecting to MySQL: {}",
        restore_config.connection.display_target()
    ));
    let mut server = MySqlServer::connect(&restore_config.connection).await?;
    reporter.success("Connection successful");

    let mut prompt = TerminalPrompt::new(restore_config.assume_yes);
    let outcome =
        logic::perform_restore_orchestration(&mut server, &tools, &mut prompt, reporter, restore_config).await;

    if let Err(e) = server.close().await {
        tracing::debug!(error = %e, "Failed to close MySQL connection cleanly");
    }
    outcome
}
