//! Constants for vault-note
//!
//! Magic numbers, format strings, and fixed names shared across the engine.

// === File and Directory Names ===

/// Default file extension for notes
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Subdirectory whose presence marks a directory as a real vault
pub const VAULT_MARKER_DIR: &str = ".obsidian";

/// Infix inserted before the extension of backup files
pub const BACKUP_INFIX: &str = ".backup.";

/// Frontmatter delimiter line
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Frontmatter keys that hold tags, in lookup order
pub const TAG_FIELD_NAMES: &[&str] = &["tags", "tag"];

/// Key used when a note has no tag field yet
pub const DEFAULT_TAG_FIELD: &str = "tags";

// === Environment Variables ===

/// Vault root path
pub const ENV_VAULT_PATH: &str = "VAULT_NOTE_PATH";

/// Require the vault marker directory ("1", "true", "yes")
pub const ENV_VAULT_STRICT: &str = "VAULT_NOTE_STRICT";

// === Date and Time Format Strings ===

/// Timestamp embedded in backup filenames: %Y%m%d_%H%M%S
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Modification time shown when reading a note
pub const READ_MTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Modification time shown in search results
pub const SEARCH_MTIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// === Result Limits ===

/// Default number of search results kept
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Search results shown in formatted output
pub const SEARCH_DISPLAY_LIMIT: usize = 20;

/// Matching lines kept per file in content search
pub const MAX_LINE_MATCHES: usize = 10;

/// Matching lines shown per file in formatted output
pub const LINE_MATCH_DISPLAY_LIMIT: usize = 3;

/// Characters of a matching line shown in formatted output
pub const LINE_EXCERPT_CHARS: usize = 100;

/// Other tags shown beside a tag match
pub const OTHER_TAGS_DISPLAY_LIMIT: usize = 5;

/// Tags shown by the tag listing
pub const TAG_LIST_DISPLAY_LIMIT: usize = 50;

/// Affected files shown after a rename
pub const RENAME_DISPLAY_LIMIT: usize = 10;

// === Validation Limits ===

/// Maximum size of frontmatter to parse (prevents DoS on malformed files)
pub const MAX_FRONTMATTER_SIZE: usize = 64 * 1024; // 64KB
