// mdump/src/utils/report.rs
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// Operator-facing progress and outcome messages.
///
/// Components receive a reporter instead of printing directly, so runs can be silenced or
/// captured.
pub trait Reporter {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    /// Prints a pre-rendered block such as a table.
    fn block(&self, content: &str);
}

/// Writes to stdout/stderr. `quiet` suppresses informational lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    pub quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        ConsoleReporter { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    fn success(&self, message: &str) {
        println!("✓ {}", message);
    }

    fn warn(&self, message: &str) {
        println!("⚠️  {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("❌ {}", message);
    }

    fn block(&self, content: &str) {
        if !self.quiet {
            println!("{}", content);
        }
    }
}

pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

/// Size in MB with two decimals, or `< 1 MB` for small databases.
pub fn format_megabytes(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb < 1.0 {
        "< 1 MB".to_string()
    } else {
        format!("{:.2} MB", mb)
    }
}
