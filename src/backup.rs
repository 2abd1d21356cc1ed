//! Timestamped pre-mutation backups
//!
//! A backup is a sibling file `<stem>.backup.<YYYYMMDD_HHMMSS>.md` holding a
//! note's content from just before an edit, delete or tag change. Backups are
//! a recovery artifact only: nothing indexes them and a failed backup never
//! blocks the mutation that asked for it.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::constants as C;

static BACKUP_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.backup\.\d{8}_\d{6}(?:-\d+)?\.md$").expect("backup name regex")
});

/// Give up looking for a free backup name after this many collisions
const MAX_NAME_ATTEMPTS: usize = 100;

/// Check whether a path names a backup file
pub fn is_backup_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| BACKUP_NAME_RE.is_match(&n.to_string_lossy()))
        .unwrap_or(false)
}

/// Backup path for `note` at `time`; `attempt > 0` adds a `-N` disambiguator
pub fn backup_path(note: &Path, time: &DateTime<Local>, attempt: usize) -> PathBuf {
    let name = note
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name.strip_suffix(C::MARKDOWN_EXTENSION).unwrap_or(&name);
    let timestamp = time.format(C::BACKUP_TIMESTAMP_FORMAT);

    let filename = if attempt == 0 {
        format!("{}{}{}{}", stem, C::BACKUP_INFIX, timestamp, C::MARKDOWN_EXTENSION)
    } else {
        format!(
            "{}{}{}-{}{}",
            stem,
            C::BACKUP_INFIX,
            timestamp,
            attempt,
            C::MARKDOWN_EXTENSION
        )
    };
    note.with_file_name(filename)
}

/// Write a backup of `content` next to `note`.
///
/// Never fails: problems are logged and `None` is returned.
pub fn write_backup(note: &Path, content: &str) -> Option<PathBuf> {
    let now = Local::now();

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = backup_path(note, &now, attempt);
        match write_new(&path, content) {
            Ok(()) => {
                debug!(backup = %path.display(), "wrote backup");
                return Some(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                warn!(note = %note.display(), error = %e, "backup failed, continuing without it");
                return None;
            }
        }
    }

    warn!(note = %note.display(), "backup failed, no free backup name");
    None
}

fn write_new(path: &Path, content: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

/// Occupy every backup name `note` could get during the next `seconds`
/// seconds, so that backups in that window fail.
#[cfg(test)]
pub(crate) fn block_backups(note: &Path, seconds: i64) {
    let start = Local::now();
    for offset in 0..=seconds {
        let time = start + chrono::Duration::seconds(offset);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let _ = std::fs::create_dir(backup_path(note, &time, attempt));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_backup_path_format() {
        let note = PathBuf::from("/vault/ideas/note.md");
        assert_eq!(
            backup_path(&note, &fixed_time(), 0),
            PathBuf::from("/vault/ideas/note.backup.20240115_103000.md")
        );
        assert_eq!(
            backup_path(&note, &fixed_time(), 2),
            PathBuf::from("/vault/ideas/note.backup.20240115_103000-2.md")
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file(Path::new("note.backup.20240115_103000.md")));
        assert!(is_backup_file(Path::new("a/note.backup.20240115_103000-3.md")));
        assert!(!is_backup_file(Path::new("note.md")));
        assert!(!is_backup_file(Path::new("my.backup.plan.md")));
    }

    #[test]
    fn test_write_backup_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let note = temp_dir.path().join("note.md");
        fs::write(&note, "current").unwrap();

        let first = write_backup(&note, "v1").unwrap();
        let second = write_backup(&note, "v2").unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "v1");
        assert_eq!(fs::read_to_string(&second).unwrap(), "v2");
        assert!(is_backup_file(&first));
        assert!(is_backup_file(&second));
    }

    #[test]
    fn test_write_backup_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        let note = temp_dir.path().join("missing-dir").join("note.md");
        assert!(write_backup(&note, "content").is_none());
    }

    #[test]
    fn test_write_backup_gives_up_when_names_are_taken() {
        let temp_dir = TempDir::new().unwrap();
        let note = temp_dir.path().join("note.md");
        fs::write(&note, "current").unwrap();

        block_backups(&note, 5);
        assert!(write_backup(&note, "v1").is_none());
    }
}
