//! Path guard
//!
//! Every filesystem access made by the engine goes through this module.
//! Candidate paths are resolved the way the OS would resolve them (existing
//! prefixes are canonicalized so symlinks are followed, the rest is resolved
//! lexically) and then checked against the canonical vault root.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::constants as C;
use crate::error::{IoResultExt, Result, VaultError};

/// Resolve a path to its canonical form, following symlinks for every
/// component that exists.
///
/// Components that do not exist yet are appended lexically. A dangling
/// symlink anywhere in the path is rejected: writing through it would land
/// wherever it points.
pub fn resolve_canonical(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_relative() {
        std::env::current_dir().at(path)?.join(path)
    } else {
        path.to_path_buf()
    };

    let mut resolved = PathBuf::new();
    let mut exists = true;

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `resolved` is canonical up to here, so popping is exact
                resolved.pop();
                if !exists {
                    // Back inside existing directories: resume following symlinks
                    exists = resolved.symlink_metadata().is_ok();
                }
            }
            Component::Normal(name) => {
                resolved.push(name);
                if !exists {
                    continue;
                }
                match dunce::canonicalize(&resolved) {
                    Ok(canonical) => resolved = canonical,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        if resolved.symlink_metadata().is_ok() {
                            return Err(VaultError::PathTraversal(path.to_path_buf()));
                        }
                        exists = false;
                    }
                    Err(e) => return Err(VaultError::io(&resolved, e)),
                }
            }
        }
    }

    Ok(resolved)
}

/// Ensure `candidate` resolves to `root` or a descendant of it.
///
/// Returns the resolved candidate path on success.
pub fn validate_contained(root: &Path, candidate: &Path) -> Result<PathBuf> {
    let canonical_root = resolve_canonical(root)?;
    let canonical = resolve_canonical(candidate)?;

    if canonical.starts_with(&canonical_root) {
        Ok(canonical)
    } else {
        Err(VaultError::PathTraversal(candidate.to_path_buf()))
    }
}

/// Join sanitized segments onto `base` and validate the result.
///
/// Separator characters and `..` sequences are stripped from each segment
/// before joining; segments that end up empty are dropped.
pub fn safe_join(base: &Path, segments: &[&str]) -> Result<PathBuf> {
    let mut result = base.to_path_buf();

    for segment in segments {
        let clean = segment
            .replace("..", "")
            .replace(|c: char| c == '/' || c == '\\', "");
        if !clean.is_empty() {
            result.push(clean);
        }
    }

    validate_contained(base, &result)
}

/// Resolve a caller-supplied folder (possibly nested, like `Projects/2024`)
/// under the vault root.
///
/// Absolute folders and `..` components are rejected outright rather than
/// silently rewritten.
pub fn join_folder(root: &Path, folder: Option<&str>) -> Result<PathBuf> {
    let folder = match folder.map(str::trim) {
        Some(f) if !f.is_empty() => f,
        _ => return validate_contained(root, root),
    };

    if is_absolute_like(folder) {
        return Err(VaultError::PathTraversal(PathBuf::from(folder)));
    }

    let mut segments = Vec::new();
    for component in folder.split(|c: char| c == '/' || c == '\\') {
        match component {
            "" | "." => continue,
            ".." => return Err(VaultError::PathTraversal(PathBuf::from(folder))),
            _ => segments.push(component),
        }
    }

    safe_join(root, &segments)
}

/// Check a bare note filename supplied by a caller
pub fn validate_filename(name: &str) -> Result<()> {
    let invalid = |reason| VaultError::InvalidFilename {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid("filename is empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid(
            "filename cannot contain path separators - use the folder parameter instead",
        ));
    }
    if name == "." || name == ".." {
        return Err(invalid("reserved name"));
    }
    if name.contains('\0') {
        return Err(invalid("filename contains a NUL byte"));
    }
    Ok(())
}

/// Add the markdown extension if missing
pub fn ensure_markdown_extension(filename: &str) -> String {
    if filename.ends_with(C::MARKDOWN_EXTENSION) {
        filename.to_string()
    } else {
        format!("{}{}", filename, C::MARKDOWN_EXTENSION)
    }
}

/// Resolve the absolute path of a note from its filename and optional folder
pub fn note_path(root: &Path, filename: &str, folder: Option<&str>) -> Result<PathBuf> {
    validate_filename(filename)?;
    let name = ensure_markdown_extension(filename);
    let dir = join_folder(root, folder)?;
    validate_contained(root, &dir.join(name))
}

fn is_absolute_like(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || (path.len() >= 2 && path.as_bytes()[1] == b':')
        || Path::new(path).is_absolute()
}
