//! Guarded enumeration of markdown files under a vault

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backup;
use crate::constants as C;
use crate::guard;

/// Find all notes under `search_dir`, which must lie inside `root`.
///
/// Hidden directories (including the vault marker directory) are skipped,
/// symlinked directories are not descended into, and backup files are not
/// notes. Every file is re-validated against the vault root; files that
/// escape it or cannot be inspected are dropped. Symlinked notes are reported
/// by their resolved target, once. Results are sorted.
pub fn markdown_files(root: &Path, search_dir: &Path) -> Vec<PathBuf> {
    let mut notes = Vec::new();
    if search_dir.is_dir() {
        find_notes_recursive(root, search_dir, &mut notes);
    }
    notes.sort();
    notes.dedup();
    notes
}

fn find_notes_recursive(root: &Path, current: &Path, notes: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(current) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %current.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            // Skip hidden directories
            if !name.starts_with('.') {
                find_notes_recursive(root, &path, notes);
            }
            continue;
        }

        if !name.ends_with(C::MARKDOWN_EXTENSION) || backup::is_backup_file(&path) {
            continue;
        }

        // Symlinked files are followed only if they stay inside the vault
        match guard::validate_contained(root, &path) {
            Ok(resolved) if resolved.is_file() => notes.push(resolved),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "skipping file outside vault"),
        }
    }
}

/// Count the notes in a vault
pub fn count_notes(root: &Path) -> usize {
    markdown_files(root, root).len()
}
