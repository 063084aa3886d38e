// mdump/src/backup/db_dump.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::backup::output_path::OutputSpec;
use crate::config::ConnectionParams;
use crate::errors::{AppError, Result};
use crate::utils::client_tools::DatabaseTools;
use crate::utils::databases::validate_database_name;
use crate::utils::report::Reporter;

/// Outcome of dumping one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpResult {
    pub name: String,
    pub file_path: PathBuf,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl DumpResult {
    fn failed(name: &str, file_path: PathBuf, error: String) -> Self {
        DumpResult {
            name: name.to_string(),
            file_path,
            succeeded: false,
            error: Some(error),
        }
    }
}

pub fn dump_file_path(spec: &OutputSpec, db_name: &str) -> PathBuf {
    spec.working_directory.join(format!("{}.sql", db_name))
}

fn remove_partial_dump(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial dump");
        }
    }
}

/// Dumps each database in order into `<working_directory>/<name>.sql`.
///
/// A failing database is recorded and its partial file removed; the remaining databases are
/// still processed. Only a missing dump binary aborts the whole run.
pub fn run_dumps<T: DatabaseTools, R: Reporter>(
    tools: &T,
    conn: &ConnectionParams,
    databases: &[String],
    spec: &OutputSpec,
    reporter: &R,
) -> Result<Vec<DumpResult>> {
    let mut results = Vec::with_capacity(databases.len());

    for db_name in databases {
        if let Err(e) = validate_database_name(db_name) {
            reporter.error(&e.to_string());
            results.push(DumpResult::failed(db_name, PathBuf::new(), e.to_string()));
            continue;
        }

        let sql_file = dump_file_path(spec, db_name);
        reporter.info(&format!("Backing up {}...", db_name));

        match tools.dump(conn, db_name, &sql_file) {
            Ok(output) if output.success() => {
                reporter.success(&format!("{} completed", db_name));
                results.push(DumpResult {
                    name: db_name.clone(),
                    file_path: sql_file,
                    succeeded: true,
                    error: None,
                });
            }
            Ok(output) => {
                let error = output.describe_failure();
                reporter.error(&format!("Error in mysqldump for {}: {}", db_name, error));
                remove_partial_dump(&sql_file);
                results.push(DumpResult::failed(db_name, sql_file, error));
            }
            Err(e @ AppError::ToolMissing { .. }) => {
                remove_partial_dump(&sql_file);
                return Err(e);
            }
            Err(e) => {
                reporter.error(&format!("{} failed: {}", db_name, e));
                remove_partial_dump(&sql_file);
                results.push(DumpResult::failed(db_name, sql_file, e.to_string()));
            }
        }
    }

    Ok(results)
}
