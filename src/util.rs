//! Small shared helpers for paths and text formatting

use std::path::Path;

use chrono::{DateTime, Local};

/// Display a path with forward slashes (cross-platform standard)
/// Converts Windows backslashes to forward slashes for consistent output
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Vault-relative display form of `path`
pub fn relative_path(root: &Path, path: &Path) -> String {
    display_path(path.strip_prefix(root).unwrap_or(path))
}

/// Filename stem used as a note's title
pub fn note_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Number of lines, counted the way `str::lines` splits them
pub fn line_count(content: &str) -> usize {
    content.lines().count()
}

/// Format an integer with comma thousands separators: 12345 -> "12,345"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncate to at most `max` characters (not bytes)
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Format a modification time for display
pub fn format_time(time: &DateTime<Local>, format: &str) -> String {
    time.format(format).to_string()
}
