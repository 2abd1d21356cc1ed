//! Content, filename and tag search over a vault or one of its folders

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::constants as C;
use crate::error::{Result, VaultError};
use crate::guard;
use crate::tags::{extract_tags, TagPattern};
use crate::util;
use crate::vault::Vault;
use crate::walk;

/// What a query is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Content,
    Filename,
    Tag,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Content => "content",
            SearchType::Filename => "filename",
            SearchType::Tag => "tag",
        }
    }
}

impl FromStr for SearchType {
    type Err = VaultError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "content" => Ok(SearchType::Content),
            "filename" => Ok(SearchType::Filename),
            "tag" => Ok(SearchType::Tag),
            other => Err(VaultError::InvalidSearchType(other.to_string())),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub search_type: SearchType,
    pub case_sensitive: bool,
    /// Vault-relative folder to search instead of the whole vault
    pub path: Option<String>,
    /// Maximum results kept; 0 keeps all
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, search_type: SearchType) -> Self {
        Self {
            query: query.into(),
            search_type,
            case_sensitive: false,
            path: None,
            limit: C::DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn in_folder(mut self, path: Option<impl Into<String>>) -> Self {
        self.path = path.map(Into::into);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A matching line with its neighbours
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineMatch {
    /// 1-based
    pub line_number: usize,
    /// The matching line, trimmed
    pub line: String,
    /// Previous, matching and next line, as far as they exist
    pub context: Vec<String>,
}

/// Per-kind payload of a search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchDetail {
    Content {
        /// First matching lines, capped
        lines: Vec<LineMatch>,
        /// Number of matching lines in the file
        total: usize,
    },
    Filename {
        name: String,
    },
    Tag {
        matched: Vec<String>,
        /// Every tag of the note
        all: Vec<String>,
    },
}

impl MatchDetail {
    /// Weight used to rank results; higher ranks first
    fn score(&self) -> i64 {
        match self {
            MatchDetail::Content { total, .. } => *total as i64,
            MatchDetail::Tag { matched, .. } => matched.len() as i64,
            MatchDetail::Filename { name } => -(name.chars().count() as i64),
        }
    }
}

/// One note matching a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Vault-relative path
    pub path: String,
    /// Filename stem
    pub title: String,
    pub detail: MatchDetail,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Local>>,
}

/// Outcome of a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub search_type: SearchType,
    pub files_searched: usize,
    /// Matches found before the limit was applied
    pub total_matches: usize,
    pub results: Vec<SearchResult>,
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.files_searched == 0 {
            return write!(f, "No markdown files found in search area");
        }
        if self.results.is_empty() {
            return write!(
                f,
                "No results found for '{}' in {} files",
                self.query,
                util::group_thousands(self.files_searched as u64)
            );
        }

        writeln!(
            f,
            "Search results ({} matches in {} files)",
            util::group_thousands(self.results.len() as u64),
            util::group_thousands(self.files_searched as u64)
        )?;
        writeln!(f, "Query: `{}` | Type: `{}`", self.query, self.search_type)?;

        for (i, result) in self.results.iter().take(C::SEARCH_DISPLAY_LIMIT).enumerate() {
            writeln!(f)?;
            fmt_result(f, result, i + 1)?;
        }
        if self.results.len() > C::SEARCH_DISPLAY_LIMIT {
            write!(
                f,
                "\n... and {} more results",
                self.results.len() - C::SEARCH_DISPLAY_LIMIT
            )?;
        }
        Ok(())
    }
}

fn hash_join<'a>(tags: impl Iterator<Item = &'a String>) -> String {
    tags.map(|t| format!("#{}", t)).collect::<Vec<_>>().join(", ")
}

fn fmt_result(f: &mut fmt::Formatter<'_>, result: &SearchResult, index: usize) -> fmt::Result {
    let size = match result.size {
        Some(size) => format!("{} bytes", util::group_thousands(size)),
        None => "unknown size".to_string(),
    };
    let modified = match &result.modified {
        Some(time) => util::format_time(time, C::SEARCH_MTIME_FORMAT),
        None => "unknown".to_string(),
    };

    writeln!(f, "{}. {}", index, result.title)?;
    writeln!(f, "   {} ({}, {})", result.path, size, modified)?;

    match &result.detail {
        MatchDetail::Content { lines, total } => {
            let plural = if *total == 1 { "" } else { "es" };
            writeln!(f, "   {} content match{}", total, plural)?;
            for m in lines.iter().take(C::LINE_MATCH_DISPLAY_LIMIT) {
                writeln!(
                    f,
                    "   L{}: {}",
                    m.line_number,
                    util::truncate_chars(&m.line, C::LINE_EXCERPT_CHARS)
                )?;
            }
            if *total > C::LINE_MATCH_DISPLAY_LIMIT {
                writeln!(
                    f,
                    "   ... and {} more matches",
                    total - C::LINE_MATCH_DISPLAY_LIMIT
                )?;
            }
        }
        MatchDetail::Filename { name } => {
            writeln!(f, "   Filename match: `{}`", name)?;
        }
        MatchDetail::Tag { matched, all } => {
            writeln!(f, "   Matched tags: {}", hash_join(matched.iter()))?;
            let mut others = all
                .iter()
                .filter(|t| !matched.contains(t))
                .take(C::OTHER_TAGS_DISPLAY_LIMIT)
                .peekable();
            if others.peek().is_some() {
                writeln!(f, "   Other tags: {}", hash_join(others))?;
            }
        }
    }
    Ok(())
}

/// Compile a content query, treating it literally if it is not a valid regex
fn compile_pattern(query: &str, case_sensitive: bool) -> Option<Regex> {
    let build = |pattern: &str| {
        RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
    };
    match build(query) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!(query, error = %e, "invalid pattern, matching literally");
            build(&regex::escape(query))
                .map_err(|e| warn!(query, error = %e, "search pattern too large"))
                .ok()
        }
    }
}

fn content_matches(content: &str, pattern: &Regex) -> Option<MatchDetail> {
    let lines: Vec<&str> = content.lines().collect();
    let mut found = Vec::new();
    let mut total = 0;

    for (i, line) in lines.iter().enumerate() {
        if !pattern.is_match(line) {
            continue;
        }
        total += 1;
        if found.len() < C::MAX_LINE_MATCHES {
            let start = i.saturating_sub(1);
            let end = (i + 2).min(lines.len());
            found.push(LineMatch {
                line_number: i + 1,
                line: line.trim().to_string(),
                context: lines[start..end].iter().map(|l| l.to_string()).collect(),
            });
        }
    }

    (total > 0).then_some(MatchDetail::Content {
        lines: found,
        total,
    })
}

fn file_metadata(path: &Path) -> (Option<u64>, Option<DateTime<Local>>) {
    match fs::metadata(path) {
        Ok(meta) => (
            Some(meta.len()),
            meta.modified().ok().map(DateTime::<Local>::from),
        ),
        Err(_) => (None, None),
    }
}

/// Searches over one vault
pub struct Searcher<'a> {
    vault: &'a Vault,
}

impl<'a> Searcher<'a> {
    pub fn new(vault: &'a Vault) -> Self {
        Self { vault }
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchReport> {
        let root = &self.vault.root;
        let search_dir = match query.path.as_deref().map(str::trim) {
            Some(folder) if !folder.is_empty() => {
                let dir = guard::join_folder(root, Some(folder))?;
                if !dir.is_dir() {
                    return Err(VaultError::InvalidPath(folder.to_string()));
                }
                dir
            }
            _ => root.clone(),
        };

        let files = walk::markdown_files(root, &search_dir);
        debug!(
            dir = %search_dir.display(),
            files = files.len(),
            search_type = %query.search_type,
            "searching"
        );

        let mut report = SearchReport {
            query: query.query.clone(),
            search_type: query.search_type,
            files_searched: files.len(),
            total_matches: 0,
            results: Vec::new(),
        };
        if files.is_empty() {
            return Ok(report);
        }

        let mut results = match query.search_type {
            SearchType::Content => match compile_pattern(&query.query, query.case_sensitive) {
                Some(pattern) => {
                    self.collect(&files, true, |content, _| content_matches(content, &pattern))
                }
                None => Vec::new(),
            },
            SearchType::Filename => {
                let fold = |s: &str| {
                    if query.case_sensitive {
                        s.to_string()
                    } else {
                        s.to_lowercase()
                    }
                };
                let needle = fold(&query.query);
                self.collect(&files, false, |_, name| {
                    fold(name).contains(&needle).then(|| MatchDetail::Filename {
                        name: name.to_string(),
                    })
                })
            }
            SearchType::Tag => {
                let pattern = TagPattern::new(&query.query);
                self.collect(&files, true, |content, _| {
                    let all: Vec<String> = extract_tags(content).into_iter().collect();
                    let matched: Vec<String> =
                        all.iter().filter(|t| pattern.matches(t)).cloned().collect();
                    (!matched.is_empty()).then_some(MatchDetail::Tag { matched, all })
                })
            }
        };

        // Stable: equal scores keep path order
        results.sort_by_key(|r| std::cmp::Reverse(r.detail.score()));
        report.total_matches = results.len();
        if query.limit > 0 {
            results.truncate(query.limit);
        }
        report.results = results;
        Ok(report)
    }

    /// Run `matcher` over every file with the file's text (empty unless
    /// `read_content`) and its name. Unreadable files are skipped.
    fn collect<F>(&self, files: &[PathBuf], read_content: bool, mut matcher: F) -> Vec<SearchResult>
    where
        F: FnMut(&str, &str) -> Option<MatchDetail>,
    {
        let mut results = Vec::new();

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let content = if read_content {
                match fs::read_to_string(path) {
                    Ok(content) => content,
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "skipping unreadable note");
                        continue;
                    }
                }
            } else {
                String::new()
            };

            let Some(detail) = matcher(&content, &name) else {
                continue;
            };

            let (size, modified) = file_metadata(path);
            results.push(SearchResult {
                path: self.vault.relative(path),
                title: util::note_title(path),
                detail,
                size,
                modified,
            });
        }

        results
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
        let path = vault.root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn search(vault: &Vault, query: SearchQuery) -> SearchReport {
        Searcher::new(vault).search(&query).unwrap()
    }

    fn paths(report: &SearchReport) -> Vec<&str> {
        report.results.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn test_search_type_parse() {
        assert_eq!("tag".parse::<SearchType>().unwrap(), SearchType::Tag);
        let err = "fuzzy".parse::<SearchType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSearchType);
    }

    #[test]
    fn test_content_search_with_context() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", "first\n  Rust is fun  \nlast\n");
        write(&vault, "b.md", "nothing here\n");

        let report = search(&vault, SearchQuery::new("rust", SearchType::Content));
        assert_eq!(paths(&report), vec!["a.md"]);
        match &report.results[0].detail {
            MatchDetail::Content { lines, total } => {
                assert_eq!(*total, 1);
                assert_eq!(lines[0].line_number, 2);
                assert_eq!(lines[0].line, "Rust is fun");
                assert_eq!(lines[0].context, vec!["first", "  Rust is fun  ", "last"]);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_content_search_case_sensitive() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", "Rust\n");

        let report = search(&vault, SearchQuery::new("rust", SearchType::Content).case_sensitive(true));
        assert!(report.results.is_empty());
        assert_eq!(report.to_string(), "No results found for 'rust' in 1 files");
    }

    #[test]
    fn test_content_search_invalid_regex_is_literal() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", "call foo(bar\n");
        write(&vault, "b.md", "call foo\n");

        let report = search(&vault, SearchQuery::new("foo(", SearchType::Content));
        assert_eq!(paths(&report), vec!["a.md"]);
    }

    #[test]
    fn test_content_search_ranked_by_match_count() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", "x\n");
        write(&vault, "b.md", "x\nx\nx\n");
        write(&vault, "c.md", "x\nx\n");
        write(&vault, "d.md", "x\n");

        let report = search(&vault, SearchQuery::new("x", SearchType::Content));
        assert_eq!(paths(&report), vec!["b.md", "c.md", "a.md", "d.md"]);
    }

    #[test]
    fn test_content_search_caps_lines() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", &"hit\n".repeat(15));

        let report = search(&vault, SearchQuery::new("hit", SearchType::Content));
        match &report.results[0].detail {
            MatchDetail::Content { lines, total } => {
                assert_eq!(*total, 15);
                assert_eq!(lines.len(), C::MAX_LINE_MATCHES);
            }
            other => panic!("unexpected detail {:?}", other),
        }
        let text = report.to_string();
        assert!(text.contains("15 content matches"));
        assert!(text.contains("... and 12 more matches"));
    }

    #[test]
    fn test_filename_search() {
        let (_temp, vault) = setup();
        write(&vault, "Meeting Notes.md", "");
        write(&vault, "meeting.md", "");
        write(&vault, "other.md", "meeting in body");

        let report = search(&vault, SearchQuery::new("MEETING", SearchType::Filename));
        assert_eq!(paths(&report), vec!["meeting.md", "Meeting Notes.md"]);

        let report = search(
            &vault,
            SearchQuery::new("Meeting", SearchType::Filename).case_sensitive(true),
        );
        assert_eq!(paths(&report), vec!["Meeting Notes.md"]);
    }

    #[test]
    fn test_tag_search_hierarchical_and_wildcard() {
        let (_temp, vault) = setup();
        write(&vault, "a.md", "#work #work/meetings #home\n");
        write(&vault, "b.md", "---\ntags: [Work]\n---\n");
        write(&vault, "c.md", "#workshop\n");

        let report = search(&vault, SearchQuery::new("#WORK", SearchType::Tag));
        assert_eq!(paths(&report), vec!["a.md", "b.md"]);
        match &report.results[0].detail {
            MatchDetail::Tag { matched, all } => {
                assert_eq!(matched, &vec!["work".to_string(), "work/meetings".to_string()]);
                assert_eq!(all.len(), 3);
            }
            other => panic!("unexpected detail {:?}", other),
        }
        assert!(report.to_string().contains("Other tags: #home"));

        let report = search(&vault, SearchQuery::new("work*", SearchType::Tag));
        assert_eq!(paths(&report), vec!["a.md", "b.md", "c.md"]);
    }

    #[test]
    fn test_search_subfolder() {
        let (_temp, vault) = setup();
        write(&vault, "top.md", "needle\n");
        write(&vault, "Projects/2024/deep.md", "needle\n");

        let query = SearchQuery::new("needle", SearchType::Content).in_folder(Some("Projects"));
        let report = search(&vault, query);
        assert_eq!(paths(&report), vec!["Projects/2024/deep.md"]);
    }

    #[test]
    fn test_search_bad_subfolder() {
        let (_temp, vault) = setup();
        let searcher = Searcher::new(&vault);

        let query = SearchQuery::new("x", SearchType::Content).in_folder(Some("missing"));
        assert_eq!(searcher.search(&query).unwrap_err().kind(), ErrorKind::InvalidPath);

        let query = SearchQuery::new("x", SearchType::Content).in_folder(Some("../.."));
        assert_eq!(searcher.search(&query).unwrap_err().kind(), ErrorKind::PathTraversal);
    }

    #[test]
    fn test_search_empty_area() {
        let (_temp, vault) = setup();
        fs::create_dir(vault.root.join("empty")).unwrap();

        let query = SearchQuery::new("x", SearchType::Content).in_folder(Some("empty"));
        let report = search(&vault, query);
        assert_eq!(report.to_string(), "No markdown files found in search area");
    }

    #[test]
    fn test_search_limits() {
        let (_temp, vault) = setup();
        for i in 0..60 {
            write(&vault, &format!("note{:02}.md", i), "match\n");
        }

        let report = search(&vault, SearchQuery::new("match", SearchType::Content).limit(50));
        assert_eq!(report.total_matches, 60);
        assert_eq!(report.results.len(), 50);

        let text = report.to_string();
        assert!(text.starts_with("Search results (50 matches in 60 files)"));
        assert!(text.contains("20. note19"));
        assert!(!text.contains("21. note20"));
        assert!(text.ends_with("... and 30 more results"));

        let report = search(&vault, SearchQuery::new("match", SearchType::Content).limit(0));
        assert_eq!(report.results.len(), 60);
    }

    #[test]
    fn test_search_skips_invalid_utf8() {
        let (_temp, vault) = setup();
        write(&vault, "good.md", "needle #tag\n");
        fs::write(vault.root.join("bad.md"), [b'n', 0xff, 0xfe, b'\n']).unwrap();

        let report = search(&vault, SearchQuery::new("needle", SearchType::Content));
        assert_eq!(paths(&report), vec!["good.md"]);
        assert_eq!(report.files_searched, 2);

        let report = search(&vault, SearchQuery::new("tag", SearchType::Tag));
        assert_eq!(paths(&report), vec!["good.md"]);
    }
}
