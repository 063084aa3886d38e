// mdump/src/backup/archive.rs
use chrono::{DateTime, TimeZone};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use walkdir::WalkDir;

use crate::backup::output_path::{OutputSpec, TIMESTAMP_FORMAT};
use crate::errors::{AppError, Result};

/// Dump files found in a freshly extracted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDumps {
    /// Owned by the caller, who removes it when done.
    pub directory: PathBuf,
    /// Top-level `*.sql` files sorted by name.
    pub dump_files: Vec<PathBuf>,
}

fn write_tar_gz(archive_dest_path: &Path, files: &[PathBuf]) -> io::Result<()> {
    let archive_file = File::create(archive_dest_path)?;
    let enc = GzEncoder::new(archive_file, Compression::default());
    let mut tar_builder = Builder::new(enc);

    for path in files {
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("dump path has no file name: {}", path.display()),
            )
        })?;
        tar_builder.append_path_with_name(path, name)?;
    }

    let encoder = tar_builder.into_inner()?;
    encoder.finish()?.sync_all()?;
    Ok(())
}

/// Packs the dump files into one GZipped TAR with flat entries named by base filename.
///
/// The archive goes to `spec.explicit_archive_name` or a timestamped default under the
/// working directory. On success the dump files are deleted; on failure they are left
/// untouched and any partial archive is removed.
pub fn pack_dump_files<Tz: TimeZone>(
    files: &[PathBuf],
    spec: &OutputSpec,
    now: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let archive_dest_path = spec.archive_path(now);
    tracing::debug!(
        archive = %archive_dest_path.display(),
        members = files.len(),
        "Creating tar.gz archive"
    );

    if let Err(source) = write_tar_gz(&archive_dest_path, files) {
        if archive_dest_path.exists() {
            let _ = fs::remove_file(&archive_dest_path);
        }
        return Err(AppError::Packaging {
            archive: archive_dest_path,
            source,
        });
    }

    for sql_file in files {
        if let Err(e) = fs::remove_file(sql_file) {
            tracing::warn!(path = %sql_file.display(), error = %e, "Failed to remove archived dump");
        }
    }

    Ok(archive_dest_path)
}

/// Picks `restore_<timestamp>` next to the archive, adding `_1`, `_2`... when taken,
/// and creates it.
fn create_extraction_dir<Tz: TimeZone>(archive_path: &Path, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let parent = archive_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let base = format!("restore_{}", now.format(TIMESTAMP_FORMAT));

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{}_{}", base, attempt)
        };
        let candidate = parent.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

fn list_dump_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dump_files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let is_sql = entry.path().extension().is_some_and(|ext| ext == "sql");
        if entry.file_type().is_file() && is_sql {
            dump_files.push(entry.into_path());
        }
    }
    dump_files.sort();
    Ok(dump_files)
}

/// Extracts a backup archive into a fresh sibling directory and lists its dump files.
///
/// Nothing is left on disk when extraction fails or finds no `*.sql` entries.
pub fn unpack_dump_archive<Tz: TimeZone>(archive_path: &Path, now: &DateTime<Tz>) -> Result<ExtractedDumps>
where
    Tz::Offset: std::fmt::Display,
{
    if !archive_path.is_file() {
        return Err(AppError::ArchiveNotFound(archive_path.to_path_buf()));
    }

    let extract_to_dir = create_extraction_dir(archive_path, now)?;
    tracing::debug!(
        archive = %archive_path.display(),
        directory = %extract_to_dir.display(),
        "Extracting tar.gz archive"
    );

    let extracted = File::open(archive_path)
        .and_then(|archive_file| {
            let mut archive = Archive::new(GzDecoder::new(archive_file));
            archive.unpack(&extract_to_dir)
        })
        .and_then(|_| list_dump_files(&extract_to_dir));

    let outcome = match extracted {
        Ok(dump_files) if dump_files.is_empty() => {
            Err(AppError::NoDumpFilesFound(archive_path.to_path_buf()))
        }
        Ok(dump_files) => Ok(ExtractedDumps {
            directory: extract_to_dir.clone(),
            dump_files,
        }),
        Err(source) => Err(AppError::Extraction {
            archive: archive_path.to_path_buf(),
            source,
        }),
    };

    if outcome.is_err() {
        if let Err(e) = fs::remove_dir_all(&extract_to_dir) {
            tracing::warn!(directory = %extract_to_dir.display(), error = %e, "Failed to remove extraction directory");
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 14, 30, 22).unwrap()
    }

    fn write_dumps(dir: &Path, dumps: &[(&str, &str)]) -> io::Result<Vec<PathBuf>> {
        dumps
            .iter()
            .map(|(name, body)| -> io::Result<PathBuf> {
                let path = dir.join(name);
                fs::write(&path, body)?;
                Ok(path)
            })
            .collect()
    }

    fn read_all(files: &[PathBuf]) -> io::Result<BTreeMap<String, Vec<u8>>> {
        files
            .iter()
            .map(|p| -> io::Result<(String, Vec<u8>)> {
                Ok((p.file_name().unwrap().to_string_lossy().into_owned(), fs::read(p)?))
            })
            .collect()
    }

    #[test]
    fn test_pack_then_unpack_preserves_names_and_bytes() -> Result<()> {
        let dir = tempdir()?;
        let spec = OutputSpec {
            working_directory: dir.path().to_path_buf(),
            explicit_archive_name: None,
            created_directory: false,
        };
        let dumps = [
            ("database1.sql", "-- Database 1 backup\nCREATE TABLE test1 (id INT);"),
            ("database2.sql", "-- Database 2 backup\nCREATE TABLE test2 (id INT);\n\u{e9}\u{1F600}"),
        ];
        let files = write_dumps(dir.path(), &dumps)?;
        let before = read_all(&files)?;

        let archive = pack_dump_files(&files, &spec, &now())?;
        assert_eq!(archive, dir.path().join("mysql_backup_20250901_143022.tar.gz"));
        assert!(files.iter().all(|f| !f.exists()));

        let extracted = unpack_dump_archive(&archive, &now())?;
        assert_eq!(extracted.directory, dir.path().join("restore_20250901_143022"));
        assert_eq!(read_all(&extracted.dump_files)?, before);
        Ok(())
    }

    #[test]
    fn test_entries_are_flat() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("work");
        fs::create_dir(&nested)?;
        let files = write_dumps(&nested, &[("shop.sql", "x")])?;
        let spec = OutputSpec {
            working_directory: dir.path().to_path_buf(),
            explicit_archive_name: Some("flat.tar.gz".to_string()),
            created_directory: false,
        };

        let archive = pack_dump_files(&files, &spec, &now())?;
        let mut tar = Archive::new(GzDecoder::new(File::open(&archive)?));
        let names = tar
            .entries()?
            .map(|e| -> io::Result<String> { Ok(e?.path()?.to_string_lossy().into_owned()) })
            .collect::<io::Result<Vec<_>>>()?;
        assert_eq!(names, vec!["shop.sql"]);
        Ok(())
    }

    #[test]
    fn test_packaging_failure_keeps_dump_files() -> Result<()> {
        let dir = tempdir()?;
        let files = write_dumps(dir.path(), &[("shop.sql", "x")])?;
        let mut with_missing = files.clone();
        with_missing.push(dir.path().join("ghost.sql"));
        let spec = OutputSpec {
            working_directory: dir.path().to_path_buf(),
            explicit_archive_name: Some("broken.tar.gz".to_string()),
            created_directory: false,
        };

        let err = pack_dump_files(&with_missing, &spec, &now()).unwrap_err();
        assert!(matches!(err, AppError::Packaging { .. }));
        assert!(files[0].is_file());
        assert!(!dir.path().join("broken.tar.gz").exists());
        Ok(())
    }

    #[test]
    fn test_unpack_missing_archive() {
        let err = unpack_dump_archive(Path::new("/nonexistent/backup.tar.gz"), &now()).unwrap_err();
        assert!(matches!(err, AppError::ArchiveNotFound(_)));
    }

    #[test]
    fn test_unpack_malformed_archive_cleans_up() -> Result<()> {
        let dir = tempdir()?;
        let archive = dir.path().join("garbage.tar.gz");
        File::create(&archive)?.write_all(b"definitely not gzip")?;

        let err = unpack_dump_archive(&archive, &now()).unwrap_err();
        assert!(matches!(err, AppError::Extraction { .. }));
        assert!(!dir.path().join("restore_20250901_143022").exists());
        Ok(())
    }

    #[test]
    fn test_unpack_without_sql_files() -> Result<()> {
        let dir = tempdir()?;
        let files = write_dumps(dir.path(), &[("notes.txt", "hello")])?;
        let spec = OutputSpec {
            working_directory: dir.path().to_path_buf(),
            explicit_archive_name: Some("nosql.tar.gz".to_string()),
            created_directory: false,
        };
        let archive = pack_dump_files(&files, &spec, &now())?;

        let err = unpack_dump_archive(&archive, &now()).unwrap_err();
        assert!(matches!(err, AppError::NoDumpFilesFound(_)));
        assert!(!dir.path().join("restore_20250901_143022").exists());
        Ok(())
    }

    #[test]
    fn test_extraction_directories_are_unique() -> Result<()> {
        let dir = tempdir()?;
        let files = write_dumps(dir.path(), &[("shop.sql", "x")])?;
        let spec = OutputSpec {
            working_directory: dir.path().to_path_buf(),
            explicit_archive_name: Some("shop.tar.gz".to_string()),
            created_directory: false,
        };
        let archive = pack_dump_files(&files, &spec, &now())?;

        let first = unpack_dump_archive(&archive, &now())?;
        let second = unpack_dump_archive(&archive, &now())?;
        assert_ne!(first.directory, second.directory);
        assert_eq!(second.directory, dir.path().join("restore_20250901_143022_1"));
        Ok(())
    }
}
