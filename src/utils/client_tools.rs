// mdump/src/utils/client_tools.rs
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use which::which;

use crate::config::ConnectionParams;
use crate::errors::{AppError, Result};

const INSTALL_HINT: &str = "Make sure the MySQL client is installed \
    (macOS: brew install mysql-client, Ubuntu/Debian: sudo apt-get install mysql-client).";

/// Exit status and captured stderr of one external tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Stderr, or the exit status when the tool printed nothing.
    pub fn describe_failure(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// The external dump/restore capability.
///
/// `Err` is reserved for problems running the tool at all (missing binary, unwritable
/// destination); a tool that ran and failed returns `Ok` with a non-zero status.
pub trait DatabaseTools {
    fn dump(&self, conn: &ConnectionParams, database: &str, destination: &Path) -> Result<ToolOutput>;
    fn restore(&self, conn: &ConnectionParams, database: &str, source: &Path) -> Result<ToolOutput>;
}

/// Runs `mysqldump` and `mysql` found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct MysqlClientTools {
    mysqldump: Option<PathBuf>,
    mysql: Option<PathBuf>,
}

impl MysqlClientTools {
    pub fn discover() -> Self {
        let tools = MysqlClientTools {
            mysqldump: which("mysqldump").ok(),
            mysql: which("mysql").ok(),
        };
        tracing::debug!(mysqldump = ?tools.mysqldump, mysql = ?tools.mysql, "Resolved MySQL client tools");
        tools
    }

    pub fn require_dump(&self) -> Result<&Path> {
        self.mysqldump.as_deref().ok_or(AppError::ToolMissing {
            tool: "mysqldump",
            hint: INSTALL_HINT,
        })
    }

    pub fn require_restore(&self) -> Result<&Path> {
        self.mysql.as_deref().ok_or(AppError::ToolMissing {
            tool: "mysql",
            hint: INSTALL_HINT,
        })
    }
}

fn connection_args(conn: &ConnectionParams) -> Vec<String> {
    vec![
        format!("--host={}", conn.host),
        format!("--port={}", conn.port),
        format!("--user={}", conn.user),
    ]
}

fn to_tool_output(output: std::process::Output) -> ToolOutput {
    ToolOutput {
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

impl DatabaseTools for MysqlClientTools {
    fn dump(&self, conn: &ConnectionParams, database: &str, destination: &Path) -> Result<ToolOutput> {
        let mysqldump = self.require_dump()?;
        let target = File::create(destination)?;

        tracing::debug!(database, destination = %destination.display(), "Running mysqldump");
        let output = Command::new(mysqldump)
            .env("MYSQL_PWD", &conn.password)
            .args(connection_args(conn))
            .args([
                "--single-transaction",
                "--routines",
                "--triggers",
                "--events",
                "--add-drop-database",
                "--create-options",
            ])
            .arg(database)
            .stdin(Stdio::null())
            .stdout(Stdio::from(target))
            .stderr(Stdio::piped())
            .output()?;

        Ok(to_tool_output(output))
    }

    fn restore(&self, conn: &ConnectionParams, database: &str, source: &Path) -> Result<ToolOutput> {
        let mysql = self.require_restore()?;
        let input = File::open(source)?;

        tracing::debug!(database, source = %source.display(), "Running mysql");
        let output = Command::new(mysql)
            .env("MYSQL_PWD", &conn.password)
            .args(connection_args(conn))
            .arg(database)
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(to_tool_output(output))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::test_connection;
    use super::*;

    #[test]
    fn test_describe_failure_prefers_stderr() {
        let out = ToolOutput { status: Some(2), stderr: "  Access denied\n".to_string() };
        assert!(!out.success());
        assert_eq!(out.describe_failure(), "Access denied");

        let out = ToolOutput { status: Some(3), stderr: String::new() };
        assert_eq!(out.describe_failure(), "exited with status 3");

        let out = ToolOutput { status: None, stderr: String::new() };
        assert_eq!(out.describe_failure(), "terminated by signal");
    }

    #[test]
    fn test_missing_tools_report_hint() {
        let tools = MysqlClientTools::default();
        let err = tools.require_dump().unwrap_err();
        assert!(matches!(err, AppError::ToolMissing { tool: "mysqldump", .. }));
        assert!(err.to_string().contains("brew install mysql-client"));

        let err = tools
            .restore(&test_connection(), "shop", Path::new("shop.sql"))
            .unwrap_err();
        assert!(matches!(err, AppError::ToolMissing { tool: "mysql", .. }));
    }

    #[test]
    fn test_password_is_not_passed_as_argument() {
        let args = connection_args(&test_connection());
        assert_eq!(args, vec!["--host=localhost", "--port=3306", "--user=root"]);
        assert!(args.iter().all(|a| !a.contains("secret")));
    }
}
