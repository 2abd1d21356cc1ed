//! Tag index: extraction, add/remove on one note, vault-wide rename
//!
//! A note's tags are the union of its frontmatter `tags`/`tag` field and the
//! inline hashtags in its body, all normalized. Mutations rewrite the whole
//! file: the frontmatter is edited structurally, inline tags are rewritten
//! outside code only.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backup;
use crate::constants as C;
use crate::error::{Result, VaultError};
use crate::frontmatter::{self, Field, Frontmatter};
use crate::lock::NoteLock;
use crate::markdown;
use crate::store::{self, Notes};
use crate::vault::Vault;
use crate::walk;

/// Canonical form of a tag: surrounding `#` and whitespace removed, lowercased
pub fn normalize_tag(tag: &str) -> String {
    tag.trim_matches(|c: char| c == '#' || c.is_whitespace())
        .to_lowercase()
}

/// All normalized tags of a note, sorted
pub fn extract_tags(content: &str) -> BTreeSet<String> {
    let (fm, body) = frontmatter::split(content);
    let mut tags = BTreeSet::new();

    if let Some(fm) = fm {
        tags.extend(fm.tag_values().iter().map(|t| normalize_tag(t)));
    }
    tags.extend(markdown::hashtags(body).iter().map(|t| normalize_tag(t.name)));
    tags.retain(|t| !t.is_empty());
    tags
}

/// Tag query with hierarchical and `*` wildcard matching
#[derive(Debug, Clone)]
pub struct TagPattern {
    pattern: String,
    wildcard: Option<Regex>,
}

impl TagPattern {
    pub fn new(pattern: &str) -> Self {
        let pattern = normalize_tag(pattern);
        let wildcard = if pattern.contains('*') {
            let parts: Vec<String> = pattern.split('*').map(regex::escape).collect();
            Regex::new(&format!("^{}$", parts.join(".*"))).ok()
        } else {
            None
        };
        Self { pattern, wildcard }
    }

    /// `ai` matches `ai` and `ai/ml` but not `aid`; `proj*` matches `project`
    pub fn matches(&self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        match &self.wildcard {
            Some(re) => re.is_match(&tag),
            None => {
                tag == self.pattern
                    || tag
                        .strip_prefix(self.pattern.as_str())
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false)
            }
        }
    }
}

/// One-off form of [`TagPattern::matches`]
pub fn matches_tag_pattern(pattern: &str, tag: &str) -> bool {
    TagPattern::new(pattern).matches(tag)
}

/// Which single-note mutation produced a [`TagChange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Add,
    Remove,
}

/// Outcome of `add_tags` / `remove_tags`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TagChange {
    Added {
        path: String,
        added: Vec<String>,
        tags: Vec<String>,
    },
    Removed {
        path: String,
        removed: Vec<String>,
        remaining: Vec<String>,
    },
    /// Nothing to do; the note was not touched
    Unchanged { path: String, action: TagAction },
}

impl TagChange {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, TagChange::Unchanged { .. })
    }
}

fn hash_list(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for TagChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagChange::Added { path, added, tags } => write!(
                f,
                "Tags added to {}: {}\nTotal tags: {}",
                path,
                hash_list(added),
                hash_list(tags)
            ),
            TagChange::Removed {
                path,
                removed,
                remaining,
            } => {
                writeln!(f, "Tags removed from {}: {}", path, hash_list(removed))?;
                if remaining.is_empty() {
                    write!(f, "No tags remaining")
                } else {
                    write!(f, "Remaining tags: {}", hash_list(remaining))
                }
            }
            TagChange::Unchanged {
                path,
                action: TagAction::Add,
            } => write!(f, "No new tags to add to {} (all tags already exist)", path),
            TagChange::Unchanged {
                path,
                action: TagAction::Remove,
            } => write!(f, "No matching tags to remove from {}", path),
        }
    }
}

/// Outcome of `rename_tag`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameReport {
    pub old: String,
    pub new: String,
    /// Vault-relative paths of rewritten notes
    pub files: Vec<String>,
    pub replacements: usize,
    /// Notes that carried the tag but could not be written
    pub failed: Vec<String>,
}

impl fmt::Display for RenameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.files.is_empty() && self.failed.is_empty() {
            return write!(f, "No files found containing tag: #{}", self.old);
        }

        writeln!(f, "Tag renamed from #{} to #{}", self.old, self.new)?;
        writeln!(
            f,
            "Updated {} files ({} replacements)",
            self.files.len(),
            self.replacements
        )?;

        if !self.files.is_empty() {
            writeln!(f, "\nAffected files:")?;
            for (i, file) in self.files.iter().take(C::RENAME_DISPLAY_LIMIT).enumerate() {
                writeln!(f, "{}. {}", i + 1, file)?;
            }
            if self.files.len() > C::RENAME_DISPLAY_LIMIT {
                writeln!(
                    f,
                    "... and {} more files",
                    self.files.len() - C::RENAME_DISPLAY_LIMIT
                )?;
            }
        }
        if !self.failed.is_empty() {
            write!(f, "\nCould not update: {}", self.failed.join(", "))?;
        }
        Ok(())
    }
}

/// A tag and the number of notes using it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Outcome of `list_tags`: usage counts, most used first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCounts {
    pub files_scanned: usize,
    pub tags: Vec<TagCount>,
}

impl fmt::Display for TagCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.files_scanned == 0 {
            return write!(f, "No markdown files found in vault");
        }
        if self.tags.is_empty() {
            return write!(f, "No tags found in {} files", self.files_scanned);
        }

        writeln!(
            f,
            "All tags in vault ({} unique tags in {} files)\n",
            self.tags.len(),
            self.files_scanned
        )?;
        for entry in self.tags.iter().take(C::TAG_LIST_DISPLAY_LIMIT) {
            writeln!(f, "#{} ({})", entry.tag, entry.count)?;
        }
        if self.tags.len() > C::TAG_LIST_DISPLAY_LIMIT {
            write!(
                f,
                "\n... and {} more tags",
                self.tags.len() - C::TAG_LIST_DISPLAY_LIMIT
            )?;
        }
        Ok(())
    }
}

/// Normalize caller input, dropping empties and duplicates but keeping order
fn normalize_all<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = normalize_tag(tag.as_ref());
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Rename `old` to `new` in the frontmatter and inline positions of `content`.
///
/// Returns the new content and the number of replacements.
fn replace_tag(content: &str, old: &str, new: &str) -> (String, usize) {
    let (fm, body) = frontmatter::split(content);
    let mut count = 0;

    let fm = fm.map(|mut fm| {
        fm.map_tag_fields(|items| {
            let mut out: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                let item = if normalize_tag(&item) == old {
                    count += 1;
                    new.to_string()
                } else {
                    item
                };
                // The new name may already be in the list
                let tag = normalize_tag(&item);
                if !out.iter().any(|o| normalize_tag(o) == tag) {
                    out.push(item);
                }
            }
            out
        });
        fm
    });

    let (body, inline) = markdown::rewrite_hashtags(body, |name| {
        (normalize_tag(name) == old).then(|| format!("#{}", new))
    });

    (frontmatter::assemble(fm.as_ref(), &body), count + inline)
}

/// Tag operations on a vault
pub struct Tags<'a> {
    vault: &'a Vault,
}

impl<'a> Tags<'a> {
    pub fn new(vault: &'a Vault) -> Self {
        Self { vault }
    }

    fn existing(&self, filename: &str, folder: Option<&str>) -> Result<PathBuf> {
        let path = Notes::new(self.vault).resolve(filename, folder)?;
        if !path.is_file() {
            return Err(VaultError::NoteNotFound(filename.to_string()));
        }
        Ok(path)
    }

    /// Add tags to a note's frontmatter; tags it already has are skipped
    pub fn add<S: AsRef<str>>(
        &self,
        filename: &str,
        tags: &[S],
        folder: Option<&str>,
    ) -> Result<TagChange> {
        let path = self.existing(filename, folder)?;
        let relative = self.vault.relative(&path);
        let _lock = NoteLock::acquire(&path);

        let content = store::read_note(&path, filename)?;
        let existing = extract_tags(&content);
        let added: Vec<String> = normalize_all(tags)
            .into_iter()
            .filter(|t| !existing.contains(t))
            .collect();

        if added.is_empty() {
            debug!(note = %relative, "no new tags to add");
            return Ok(TagChange::Unchanged {
                path: relative,
                action: TagAction::Add,
            });
        }

        let (fm, body) = frontmatter::split(&content);
        let mut fm = fm.unwrap_or_else(|| Frontmatter::matching(body));
        let key = fm.tag_field_key().unwrap_or(C::DEFAULT_TAG_FIELD).to_string();
        let mut items = fm.get(&key).map(Field::items).unwrap_or_default();
        items.extend(added.iter().cloned());
        fm.set_list(&key, items);

        let updated = frontmatter::assemble(Some(&fm), body);
        backup::write_backup(&path, &content);
        store::write_atomic(&path, &updated)?;

        let tags: Vec<String> = extract_tags(&updated).into_iter().collect();
        info!(note = %relative, added = ?added, "added tags");
        Ok(TagChange::Added {
            path: relative,
            added,
            tags,
        })
    }

    /// Remove tags from a note's frontmatter and inline hashtags
    pub fn remove<S: AsRef<str>>(
        &self,
        filename: &str,
        tags: &[S],
        folder: Option<&str>,
    ) -> Result<TagChange> {
        let path = self.existing(filename, folder)?;
        let relative = self.vault.relative(&path);
        let _lock = NoteLock::acquire(&path);

        let content = store::read_note(&path, filename)?;
        let existing = extract_tags(&content);
        let removed: Vec<String> = normalize_all(tags)
            .into_iter()
            .filter(|t| existing.contains(t))
            .collect();

        if removed.is_empty() {
            debug!(note = %relative, "no matching tags to remove");
            return Ok(TagChange::Unchanged {
                path: relative,
                action: TagAction::Remove,
            });
        }

        let is_removed = |tag: &str| removed.iter().any(|r| *r == normalize_tag(tag));

        let (fm, body) = frontmatter::split(&content);
        let fm = fm.map(|mut fm| {
            fm.map_tag_fields(|items| items.into_iter().filter(|i| !is_removed(i.as_str())).collect());
            fm
        });
        let (body, _) =
            markdown::rewrite_hashtags(body, |name| is_removed(name).then(String::new));

        let updated = frontmatter::assemble(fm.as_ref(), &body);
        backup::write_backup(&path, &content);
        store::write_atomic(&path, &updated)?;

        let remaining: Vec<String> = extract_tags(&updated).into_iter().collect();
        info!(note = %relative, removed = ?removed, "removed tags");
        Ok(TagChange::Removed {
            path: relative,
            removed,
            remaining,
        })
    }

    /// Rename a tag in every note of the vault
    pub fn rename(&self, old_tag: &str, new_tag: &str) -> Result<RenameReport> {
        let old = normalize_tag(old_tag);
        let new = normalize_tag(new_tag);

        if old.is_empty() {
            return Err(VaultError::InvalidTagName {
                which: "old",
                raw: old_tag.to_string(),
            });
        }
        if new.is_empty() || !markdown::is_tag_name(&new) {
            return Err(VaultError::InvalidTagName {
                which: "new",
                raw: new_tag.to_string(),
            });
        }
        if old == new {
            return Err(VaultError::NoOp(format!(
                "Old and new tag are the same: #{}",
                old
            )));
        }

        let mut report = RenameReport {
            old: old.clone(),
            new: new.clone(),
            files: Vec::new(),
            replacements: 0,
            failed: Vec::new(),
        };

        for path in walk::markdown_files(&self.vault.root, &self.vault.root) {
            let relative = self.vault.relative(&path);
            match self.rename_in(&path, &old, &new) {
                Ok(0) => {}
                Ok(count) => {
                    report.files.push(relative);
                    report.replacements += count;
                }
                Err(e) => {
                    warn!(note = %relative, error = %e, "could not rename tag in note");
                    report.failed.push(relative);
                }
            }
        }

        info!(
            old = %old,
            new = %new,
            files = report.files.len(),
            replacements = report.replacements,
            "renamed tag"
        );
        Ok(report)
    }

    /// Rename within one note; unreadable notes count as untouched
    fn rename_in(&self, path: &Path, old: &str, new: &str) -> Result<usize> {
        let _lock = NoteLock::acquire(path);

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable note");
                return Ok(0);
            }
        };
        if !extract_tags(&content).contains(old) {
            return Ok(0);
        }

        let (updated, count) = replace_tag(&content, old, new);
        if count == 0 {
            return Ok(0);
        }

        backup::write_backup(path, &content);
        store::write_atomic(path, &updated)?;
        Ok(count)
    }

    /// Count tag usage across the vault
    pub fn list(&self) -> Result<TagCounts> {
        let files = walk::markdown_files(&self.vault.root, &self.vault.root);
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for path in &files {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable note");
                    continue;
                }
            };
            for tag in extract_tags(&content) {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        // BTreeMap order is by name, so a stable sort keeps names ascending on ties
        tags.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(TagCounts {
            files_scanned: files.len(),
            tags,
        })
    }
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

    fn write(vault: &Vault, name: &str, content: &str) {
        fs::write(vault.root.join(name), content).unwrap();
    }

    fn read(vault: &Vault, name: &str) -> String {
        fs::read_to_string(vault.root.join(name)).unwrap()
    }

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("#AI "), "ai");
        assert_eq!(normalize_tag("ai"), "ai");
        assert_eq!(normalize_tag("Ai"), "ai");
        assert_eq!(normalize_tag(" #Work/Meetings"), "work/meetings");
        assert_eq!(normalize_tag("#"), "");
    }

    #[test]
    fn test_normalize_tag_idempotent() {
        for raw in ["#AI ", " ##x# ", "Ünïcode", " #a #b "] {
            let once = normalize_tag(raw);
            assert_eq!(normalize_tag(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_extract_tags_union() {
        let content = "---\ntags: [Project, \"ai\"]\n---\n# Title\n\nWorking on #AI and #ml/vision.\n";
        assert_eq!(extract_tags(content), set(&["ai", "ml/vision", "project"]));
    }

    #[test]
    fn test_extract_tags_scalar_and_block_fields() {
        assert_eq!(extract_tags("---\ntag: solo\n---\nbody"), set(&["solo"]));
        assert_eq!(extract_tags("---\ntags:\n  - one\n  - Two\n---\n"), set(&["one", "two"]));
        assert_eq!(extract_tags("---\ntags: #a #b\n---\n"), set(&["a", "b"]));
    }

    #[test]
    fn test_extract_tags_skips_code() {
        let content = "Text #real\n\n```rust\n// #[derive] #fake\n```\n\n`#inline` code\n";
        assert_eq!(extract_tags(content), set(&["real"]));
    }

    #[test]
    fn test_tag_pattern() {
        assert!(matches_tag_pattern("ai", "ai"));
        assert!(matches_tag_pattern("#AI", "ai/ml"));
        assert!(!matches_tag_pattern("ai", "aid"));
        assert!(matches_tag_pattern("proj*", "project"));
        assert!(matches_tag_pattern("*/meetings", "work/meetings"));
        assert!(!matches_tag_pattern("proj*", "my-project"));
        assert!(matches_tag_pattern("a.b*", "a.bc"));
        assert!(!matches_tag_pattern("a.b*", "axbc"));
    }

    #[test]
    fn test_add_tags_creates_frontmatter() {
        let (_temp, vault) = setup();
        write(&vault, "n.md", "# Note\n\nBody #inline\n");

        let change = Tags::new(&vault).add("n", &["AI", "#ai", "inline"], None).unwrap();
        assert_eq!(
            change,
            TagChange::Added {
                path: "n.md".to_string(),
                added: vec!["ai".to_string()],
                tags: vec!["ai".to_string(), "inline".to_string()],
            }
        );
        assert_eq!(read(&vault, "n.md"), "---\ntags: [\"ai\"]\n---\n# Note\n\nBody #inline\n");
        assert_eq!(change.to_string(), "Tags added to n.md: #ai\nTotal tags: #ai, #inline");
    }

    #[test]
    fn test_add_tags_extends_existing_field() {
        let (_temp, vault) = setup();
        write(&vault, "n.md", "---\ntitle: T\ntag: old\nstatus: draft\n---\nBody\n");

        Tags::new(&vault).add("n", &["new"], None).unwrap();
        assert_eq!(
            read(&vault, "n.md"),
            "---\ntitle: T\ntag: [\"old\", \"new\"]\nstatus: draft\n---\nBody\n"
        );
    }

    #[test]
    fn test_add_tags_is_idempotent() {
        let (temp, vault) = setup();
        write(&vault, "n.md", "Body\n");
        let tags = Tags::new(&vault);

        tags.add("n", &["ai", "ai"], None).unwrap();
        assert_eq!(extract_tags(&read(&vault, "n.md")), set(&["ai"]));
        let after_first = read(&vault, "n.md");

        let change = tags.add("n", &["AI"], None).unwrap();
        assert!(change.is_unchanged());
        assert_eq!(read(&vault, "n.md"), after_first);
        assert!(change.to_string().starts_with("No new tags to add"));

        let backups = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| backup::is_backup_file(&e.path()))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_add_tags_missing_note() {
        let (_temp, vault) = setup();
        let err = Tags::new(&vault).add("ghost", &["x"], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_remove_tags_everywhere() {
        let (_temp, vault) = setup();
        write(
            &vault,
            "n.md",
            "---\ntitle: T\ntags: [ai, keep]\n---\nAbout #AI here.\n`#ai` stays in code\n",
        );

        let change = Tags::new(&vault).remove("n", &["#Ai"], None).unwrap();
        assert_eq!(
            read(&vault, "n.md"),
            "---\ntitle: T\ntags: [\"keep\"]\n---\nAbout here.\n`#ai` stays in code\n"
        );
        assert_eq!(
            change.to_string(),
            "Tags removed from n.md: #ai\nRemaining tags: #keep"
        );
    }

    #[test]
    fn test_remove_last_tag_drops_frontmatter() {
        let (_temp, vault) = setup();
        write(&vault, "n.md", "---\ntags: [solo]\n---\nBody\n");

        let change = Tags::new(&vault).remove("n", &["solo"], None).unwrap();
        assert_eq!(read(&vault, "n.md"), "Body\n");
        assert!(change.to_string().ends_with("No tags remaining"));
    }

    #[test]
    fn test_remove_absent_tag_is_unchanged() {
        let (_temp, vault) = setup();
        write(&vault, "n.md", "#a\n");

        let change = Tags::new(&vault).remove("n", &["b"], None).unwrap();
        assert!(change.is_unchanged());
        assert_eq!(read(&vault, "n.md"), "#a\n");
    }

    #[test]
    fn test_rename_scope() {
        let (_temp, vault) = setup();
        write(&vault, "one.md", "---\ntags: [Old, other]\n---\nSee #old\n");
        write(&vault, "two.md", "Inline #OLD only, not #old/child or #older\n");
        write(&vault, "three.md", "No match here #new-ish\n");
        let untouched = read(&vault, "three.md");

        let report = Tags::new(&vault).rename("old", "#New").unwrap();
        assert_eq!(report.files, vec!["one.md".to_string(), "two.md".to_string()]);
        assert_eq!(report.replacements, 3);
        assert!(report.failed.is_empty());

        assert_eq!(
            read(&vault, "one.md"),
            "---\ntags: [\"new\", \"other\"]\n---\nSee #new\n"
        );
        assert_eq!(
            read(&vault, "two.md"),
            "Inline #new only, not #old/child or #older\n"
        );
        assert_eq!(read(&vault, "three.md"), untouched);
        assert!(report.to_string().contains("Updated 2 files (3 replacements)"));
    }

    #[test]
    fn test_rename_into_existing_tag_dedups() {
        let (_temp, vault) = setup();
        write(&vault, "n.md", "---\ntags: [old, new, other]\n---\nBody\n");

        let report = Tags::new(&vault).rename("old", "new").unwrap();
        assert_eq!(report.replacements, 1);
        assert_eq!(
            read(&vault, "n.md"),
            "---\ntags: [\"new\", \"other\"]\n---\nBody\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_rename_keeps_symlinked_note() {
        let (_temp, vault) = setup();
        write(&vault, "target.md", "#old body");
        std::os::unix::fs::symlink(vault.root.join("target.md"), vault.root.join("alias.md"))
            .unwrap();

        let report = Tags::new(&vault).rename("old", "new").unwrap();
        assert_eq!(report.files, vec!["target.md".to_string()]);
        assert_eq!(report.replacements, 1);

        let alias = vault.root.join("alias.md");
        assert!(fs::symlink_metadata(&alias).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&alias).unwrap(), "#new body");
    }

    #[test]
    fn test_add_tags_keeps_crlf_line_endings() {
        let (_temp, vault) = setup();
        write(&vault, "n.md", "---\r\ntitle: T\r\ntags: [a]\r\n---\r\nbody\r\n");
        write(&vault, "plain.md", "one\r\ntwo\r\n");
        let tags = Tags::new(&vault);

        tags.add("n", &["b"], None).unwrap();
        assert_eq!(
            read(&vault, "n.md"),
            "---\r\ntitle: T\r\ntags: [\"a\", \"b\"]\r\n---\r\nbody\r\n"
        );

        tags.add("plain", &["x"], None).unwrap();
        assert_eq!(read(&vault, "plain.md"), "---\r\ntags: [\"x\"]\r\n---\r\none\r\ntwo\r\n");
    }

    #[test]
    fn test_add_tags_succeeds_when_backup_fails() {
        let (_temp, vault) = setup();
        write(&vault, "n.md", "Body\n");
        backup::block_backups(&vault.root.join("n.md"), 5);

        let change = Tags::new(&vault).add("n", &["kept"], None).unwrap();
        assert!(!change.is_unchanged());
        assert_eq!(extract_tags(&read(&vault, "n.md")), set(&["kept"]));
    }

    #[test]
    fn test_rename_no_match() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", "#x\n");

        let report = Tags::new(&vault).rename("missing", "other").unwrap();
        assert!(report.files.is_empty());
        assert_eq!(report.to_string(), "No files found containing tag: #missing");
    }

    #[test]
    fn test_rename_validation() {
        let (_temp, vault) = setup();
        let tags = Tags::new(&vault);

        assert_eq!(tags.rename("#", "x").unwrap_err().kind(), ErrorKind::InvalidTagName);
        assert_eq!(tags.rename("x", "  ").unwrap_err().kind(), ErrorKind::InvalidTagName);
        assert_eq!(tags.rename("x", "two words").unwrap_err().kind(), ErrorKind::InvalidTagName);
        assert_eq!(tags.rename("AI", "#ai").unwrap_err().kind(), ErrorKind::NoOp);
    }

    #[test]
    fn test_list_counts_sorted() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", "#common #rare\n");
        write(&vault, "b.md", "---\ntags: [common, beta]\n---\n");
        write(&vault, "c.md", "#common #alpha #beta\n");

        let counts = Tags::new(&vault).list().unwrap();
        assert_eq!(counts.files_scanned, 3);
        let order: Vec<(&str, usize)> =
            counts.tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
        assert_eq!(
            order,
            vec![("common", 3), ("beta", 2), ("alpha", 1), ("rare", 1)]
        );
        assert!(counts.to_string().starts_with("All tags in vault (4 unique tags in 3 files)"));
    }

    #[test]
    fn test_list_skips_invalid_utf8() {
        let (_temp, vault) = setup();
        write(&vault, "good.md", "#ok\n");
        fs::write(vault.root.join("bad.md"), [0xff, 0xfe, b'#', b'x']).unwrap();

        let counts = Tags::new(&vault).list().unwrap();
        assert_eq!(counts.files_scanned, 2);
        assert_eq!(counts.tags, vec![TagCount { tag: "ok".to_string(), count: 1 }]);
    }

    #[test]
    fn test_list_empty_vault() {
        let (_temp, vault) = setup();
        let counts = Tags::new(&vault).list().unwrap();
        assert_eq!(counts.to_string(), "No markdown files found in vault");
    }
}
