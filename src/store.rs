//! Note store: create, read, edit and delete single notes
//!
//! Every path is resolved through the guard before the filesystem is touched.
//! Existing notes are rewritten with temp-file-then-rename, under the note's
//! lock, after a best-effort backup of the old content.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::backup;
use crate::constants as C;
use crate::edit::EditOperation;
use crate::error::{IoResultExt, Result, VaultError};
use crate::guard;
use crate::lock::NoteLock;
use crate::util;
use crate::vault::Vault;

/// Result of `create`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteCreated {
    /// Vault-relative path written
    pub path: String,
}

impl fmt::Display for NoteCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note created: {}", self.path)
    }
}

/// Result of `read`: full text plus file metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteContent {
    pub path: String,
    pub content: String,
    pub size: u64,
    pub modified: DateTime<Local>,
}

impl fmt::Display for NoteContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n\nFile info: {} ({} bytes, modified {})",
            self.content,
            self.path,
            util::group_thousands(self.size),
            util::format_time(&self.modified, C::READ_MTIME_FORMAT)
        )
    }
}

/// Result of `edit`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEdited {
    pub path: String,
    pub operation: EditOperation,
    /// New line count minus old line count
    pub line_delta: i64,
    pub backup: Option<String>,
}

impl fmt::Display for NoteEdited {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note edited ({}): {} ", self.operation, self.path)?;
        if self.line_delta == 0 {
            write!(f, "(no change in line count)")
        } else {
            write!(f, "({:+} lines)", self.line_delta)
        }
    }
}

/// Result of `delete`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteDeleted {
    pub path: String,
    /// Size of the note before deletion
    pub size: u64,
    pub backup: Option<String>,
}

impl fmt::Display for NoteDeleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Note deleted: {} ({} bytes)",
            self.path,
            util::group_thousands(self.size)
        )
    }
}

/// Single-note operations on a vault
pub struct Notes<'a> {
    vault: &'a Vault,
}

impl<'a> Notes<'a> {
    pub fn new(vault: &'a Vault) -> Self {
        Self { vault }
    }

    /// Resolve a note's absolute path from its filename and optional folder
    pub fn resolve(&self, filename: &str, folder: Option<&str>) -> Result<PathBuf> {
        let path = guard::note_path(&self.vault.root, filename, folder)?;
        debug!(filename, ?folder, path = %path.display(), "resolved note path");
        Ok(path)
    }

    /// Resolve a note that must already exist
    fn existing(&self, filename: &str, folder: Option<&str>) -> Result<PathBuf> {
        let path = self.resolve(filename, folder)?;
        if !path.is_file() {
            return Err(VaultError::NoteNotFound(filename.to_string()));
        }
        Ok(path)
    }

    /// Create a new note; fails if it already exists
    pub fn create(
        &self,
        filename: &str,
        content: &str,
        folder: Option<&str>,
    ) -> Result<NoteCreated> {
        let path = self.resolve(filename, folder)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(VaultError::AlreadyExists(self.vault.relative(&path)));
            }
            Err(e) => return Err(VaultError::io(&path, e)),
        };
        file.write_all(content.as_bytes()).at(&path)?;
        file.sync_all().at(&path)?;

        let relative = self.vault.relative(&path);
        info!(note = %relative, "created note");
        Ok(NoteCreated { path: relative })
    }

    /// Read a note's content and metadata
    pub fn read(&self, filename: &str, folder: Option<&str>) -> Result<NoteContent> {
        let path = self.existing(filename, folder)?;

        let content = read_note(&path, filename)?;
        let metadata = fs::metadata(&path).at(&path)?;
        let modified = metadata.modified().at(&path)?;

        Ok(NoteContent {
            path: self.vault.relative(&path),
            content,
            size: metadata.len(),
            modified: DateTime::<Local>::from(modified),
        })
    }

    /// Rewrite a note by combining its content with `content`
    pub fn edit(
        &self,
        filename: &str,
        content: &str,
        folder: Option<&str>,
        operation: EditOperation,
    ) -> Result<NoteEdited> {
        let path = self.existing(filename, folder)?;
        let _lock = NoteLock::acquire(&path);

        let existing = read_note(&path, filename)?;
        let updated = operation.apply(&existing, content);

        let backup = backup::write_backup(&path, &existing);
        write_atomic(&path, &updated)?;

        let relative = self.vault.relative(&path);
        let line_delta = util::line_count(&updated) as i64 - util::line_count(&existing) as i64;
        info!(note = %relative, %operation, line_delta, "edited note");

        Ok(NoteEdited {
            path: relative,
            operation,
            line_delta,
            backup: backup.map(|b| self.vault.relative(&b)),
        })
    }

    /// Delete a note, keeping a backup of its last content
    pub fn delete(&self, filename: &str, folder: Option<&str>) -> Result<NoteDeleted> {
        let path = self.existing(filename, folder)?;
        let _lock = NoteLock::acquire(&path);

        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VaultError::NoteNotFound(filename.to_string()));
            }
            Err(e) => return Err(VaultError::io(&path, e)),
        };
        let backup = match fs::read_to_string(&path) {
            Ok(existing) => backup::write_backup(&path, &existing),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "not backing up unreadable note");
                None
            }
        };

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VaultError::NoteNotFound(filename.to_string()));
            }
            Err(e) => return Err(VaultError::io(&path, e)),
        }

        let relative = self.vault.relative(&path);
        info!(note = %relative, size, "deleted note");
        Ok(NoteDeleted {
            path: relative,
            size,
            backup: backup.map(|b| self.vault.relative(&b)),
        })
    }
}

/// Read a note that may have been deleted since it was resolved
pub(crate) fn read_note(path: &Path, filename: &str) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(VaultError::NoteNotFound(filename.to_string()))
        }
        Err(e) => Err(VaultError::io(path, e)),
    }
}

/// Replace a file's content via a temp file in the same directory.
///
/// The temp file takes over the original's permissions before the rename.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| VaultError::InvalidPath(util::display_path(path)))?;

    let mut temp = NamedTempFile::new_in(dir).at(dir)?;
    temp.write_all(content.as_bytes()).at(temp.path())?;
    temp.as_file().sync_all().at(temp.path())?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions()).at(temp.path())?;
    }

    temp.persist(path).map_err(|e| VaultError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Vault) {
        let temp_dir = TempDir::new().unwrap();
        let vault = Vault::open(temp_dir.path(), false).unwrap();
        (temp_dir, vault)
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| backup::is_backup_file(p))
            .collect()
    }

    #[test]
    fn test_create_then_read() {
        let (_temp, vault) = setup();
        let notes = Notes::new(&vault);

        let created = notes.create("idea", "# Idea\n\nBody", None).unwrap();
        assert_eq!(created.path, "idea.md");
        assert_eq!(created.to_string(), "Note created: idea.md");

        let read = notes.read("idea.md", None).unwrap();
        assert_eq!(read.content, "# Idea\n\nBody");
        assert_eq!(read.size, 12);
        assert!(read.to_string().contains("File info: idea.md (12 bytes, modified "));
    }

    #[test]
    fn test_create_existing_fails() {
        let (_temp, vault) = setup();
        let notes = Notes::new(&vault);

        notes.create("dup", "first", None).unwrap();
        let err = notes.create("dup.md", "second", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(notes.read("dup", None).unwrap().content, "first");
    }

    #[test]
    fn test_create_in_nested_folder() {
        let (temp, vault) = setup();
        let notes = Notes::new(&vault);

        let created = notes.create("plan", "x", Some("Projects/2024")).unwrap();
        assert_eq!(created.path, "Projects/2024/plan.md");
        assert!(temp.path().join("Projects/2024/plan.md").is_file());
    }

    #[test]
    fn test_create_rejects_bad_names() {
        let (_temp, vault) = setup();
        let notes = Notes::new(&vault);

        let err = notes.create("../../etc/passwd", "x", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFilename);

        let err = notes.create("note", "x", Some("../outside")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathTraversal);

        let err = notes.create("note", "x", Some("/etc")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathTraversal);
    }

    #[test]
    fn test_read_missing() {
        let (_temp, vault) = setup();
        let err = Notes::new(&vault).read("ghost", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Note not found: ghost");
    }

    #[test]
    fn test_edit_operations_and_delta() {
        let (temp, vault) = setup();
        let notes = Notes::new(&vault);
        notes.create("n", "A\nB", None).unwrap();

        let edited = notes.edit("n", "C", None, EditOperation::Append).unwrap();
        assert_eq!(edited.line_delta, 1);
        assert_eq!(edited.to_string(), "Note edited (append): n.md (+1 lines)");
        assert_eq!(notes.read("n", None).unwrap().content, "A\nB\nC");

        notes.edit("n", "P", None, EditOperation::Prepend).unwrap();
        assert_eq!(notes.read("n", None).unwrap().content, "P\nA\nB\nC");

        let edited = notes.edit("n", "X", None, EditOperation::Replace).unwrap();
        assert_eq!(edited.line_delta, -3);
        assert_eq!(notes.read("n", None).unwrap().content, "X");

        assert_eq!(backups(temp.path()).len(), 3);
    }

    #[test]
    fn test_edit_backup_holds_old_content() {
        let (_temp, vault) = setup();
        let notes = Notes::new(&vault);
        notes.create("n", "before", None).unwrap();

        let edited = notes.edit("n", "after", None, EditOperation::Replace).unwrap();
        assert_eq!(edited.to_string(), "Note edited (replace): n.md (no change in line count)");
        let backup = vault.root.join(edited.backup.unwrap());
        assert_eq!(fs::read_to_string(backup).unwrap(), "before");
    }

    #[test]
    fn test_edit_missing() {
        let (_temp, vault) = setup();
        let err = Notes::new(&vault)
            .edit("ghost", "x", None, EditOperation::Append)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_edit_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (temp, vault) = setup();
        let notes = Notes::new(&vault);
        notes.create("n", "x", None).unwrap();
        let path = temp.path().join("n.md");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        notes.edit("n", "y", None, EditOperation::Replace).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn test_edit_succeeds_when_backup_fails() {
        let (_temp, vault) = setup();
        let notes = Notes::new(&vault);
        notes.create("n", "old", None).unwrap();
        backup::block_backups(&vault.root.join("n.md"), 5);

        let edited = notes.edit("n", "new", None, EditOperation::Replace).unwrap();
        assert!(edited.backup.is_none());
        assert_eq!(notes.read("n", None).unwrap().content, "new");
    }

    #[test]
    fn test_read_note_vanished_is_not_found() {
        let (_temp, vault) = setup();
        let notes = Notes::new(&vault);
        notes.create("gone", "x", None).unwrap();
        let path = notes.resolve("gone", None).unwrap();
        fs::remove_file(&path).unwrap();

        let err = read_note(&path, "gone").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            notes.edit("gone", "x", None, EditOperation::Append).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_delete_then_read() {
        let (temp, vault) = setup();
        let notes = Notes::new(&vault);
        notes.create("gone", "12345", None).unwrap();

        let deleted = notes.delete("gone", None).unwrap();
        assert_eq!(deleted.size, 5);
        assert_eq!(deleted.to_string(), "Note deleted: gone.md (5 bytes)");
        assert!(!temp.path().join("gone.md").exists());
        assert_eq!(backups(temp.path()).len(), 1);

        let err = notes.read("gone", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = notes.delete("gone", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
