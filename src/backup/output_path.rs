// mdump/src/backup/output_path.rs
use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// The only container format produced; every explicit archive name is coerced to it.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Suffixes that mark an output path as an archive filename rather than a directory.
/// Longest first so `.tar.gz` is not mistaken for a bare `.gz`.
const RECOGNIZED_SUFFIXES: &[&str] = &[".tar.gz", ".tar", ".zip"];

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where a backup run writes its dumps and its archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub working_directory: PathBuf,
    pub explicit_archive_name: Option<String>,
    /// Set when resolving created the working directory.
    pub created_directory: bool,
}

impl OutputSpec {
    /// `explicit_archive_name`, or `mysql_backup_<timestamp>.tar.gz`, under the working directory.
    pub fn archive_path<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: std::fmt::Display,
    {
        let name = match &self.explicit_archive_name {
            Some(name) => name.clone(),
            None => format!("mysql_backup_{}{}", now.format(TIMESTAMP_FORMAT), ARCHIVE_SUFFIX),
        };
        self.working_directory.join(name)
    }

    /// Removes the working directory when this run created it and left it empty.
    pub fn remove_if_unused(&self) {
        if !self.created_directory {
            return;
        }
        let is_empty = fs::read_dir(&self.working_directory)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            if let Err(e) = fs::remove_dir(&self.working_directory) {
                tracing::warn!(directory = %self.working_directory.display(), error = %e, "Failed to remove empty output directory");
            }
        }
    }
}

fn recognized_suffix(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    RECOGNIZED_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| lower.ends_with(suffix) && lower.len() > suffix.len())
}

/// Rewrites `.zip` / `.tar` to the canonical `.tar.gz`; `.tar.gz` names pass through.
fn normalize_archive_name(name: &str, suffix: &str) -> String {
    if suffix == ARCHIVE_SUFFIX {
        return name.to_string();
    }
    let stem = &name[..name.len() - suffix.len()];
    format!("{}{}", stem, ARCHIVE_SUFFIX)
}

/// Classifies the user's output path and creates the working directory.
///
/// * `None`: `./mysql_backup_<timestamp>/`, default archive name.
/// * A path ending in `.zip`, `.tar` or `.tar.gz`: its parent is the working directory and
///   its file name (normalized to `.tar.gz`) is the archive name.
/// * Anything else is a directory.
pub fn resolve_output_path<Tz: TimeZone>(output: Option<&str>, now: &DateTime<Tz>) -> Result<OutputSpec>
where
    Tz::Offset: std::fmt::Display,
{
    let mut spec = match output.map(str::trim).filter(|o| !o.is_empty()) {
        None => OutputSpec {
            working_directory: PathBuf::from(format!("./mysql_backup_{}", now.format(TIMESTAMP_FORMAT))),
            explicit_archive_name: None,
            created_directory: false,
        },
        Some(output) => {
            let path = Path::new(output);
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .filter(|_| !output.ends_with('/') && !output.ends_with(std::path::MAIN_SEPARATOR));
            match file_name.and_then(|name| recognized_suffix(name).map(|suffix| (name, suffix))) {
                Some((name, suffix)) => {
                    let parent = path
                        .parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .unwrap_or_else(|| Path::new("."));
                    OutputSpec {
                        working_directory: parent.to_path_buf(),
                        explicit_archive_name: Some(normalize_archive_name(name, suffix)),
                        created_directory: false,
                    }
                }
                None => OutputSpec {
                    working_directory: path.to_path_buf(),
                    explicit_archive_name: None,
                    created_directory: false,
                },
            }
        }
    };

    spec.created_directory = !spec.working_directory.is_dir();
    fs::create_dir_all(&spec.working_directory)?;
    tracing::debug!(
        working_directory = %spec.working_directory.display(),
        archive_name = ?spec.explicit_archive_name,
        "Resolved output path"
    );
    Ok(spec)
}
