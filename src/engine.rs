//! VaultEngine - High-level vault operations
//!
//! Provides one entry point over a resolved vault:
//! - Note CRUD
//! - Tag management
//! - Search

use std::ops::Deref;

use crate::config::VaultConfig;
use crate::edit::EditOperation;
use crate::error::Result;
use crate::search::{SearchQuery, SearchReport, Searcher};
use crate::store::{NoteContent, NoteCreated, NoteDeleted, NoteEdited, Notes};
use crate::tags::{RenameReport, TagChange, TagCounts, Tags};
use crate::vault::Vault;

// === VaultEngine ===

/// Core engine for vault operations
pub struct VaultEngine {
    inner: Vault,
}

impl VaultEngine {
    /// Create a new VaultEngine
    pub fn new(vault: Vault) -> Self {
        Self { inner: vault }
    }

    /// Resolve the configured vault and wrap it
    pub fn open(config: &VaultConfig) -> Result<Self> {
        Vault::resolve(config).map(Self::new)
    }

    pub fn notes(&self) -> Notes<'_> {
        Notes::new(&self.inner)
    }

    pub fn tags(&self) -> Tags<'_> {
        Tags::new(&self.inner)
    }

    pub fn searcher(&self) -> Searcher<'_> {
        Searcher::new(&self.inner)
    }

    // === Note Operations ===

    pub fn create(&self, filename: &str, content: &str, folder: Option<&str>) -> Result<NoteCreated> {
        self.notes().create(filename, content, folder)
    }

    pub fn read(&self, filename: &str, folder: Option<&str>) -> Result<NoteContent> {
        self.notes().read(filename, folder)
    }

    pub fn edit(
        &self,
        filename: &str,
        content: &str,
        folder: Option<&str>,
        operation: EditOperation,
    ) -> Result<NoteEdited> {
        self.notes().edit(filename, content, folder, operation)
    }

    pub fn delete(&self, filename: &str, folder: Option<&str>) -> Result<NoteDeleted> {
        self.notes().delete(filename, folder)
    }

    // === Tag Operations ===

    pub fn add_tags<S: AsRef<str>>(
        &self,
        filename: &str,
        tags: &[S],
        folder: Option<&str>,
    ) -> Result<TagChange> {
        self.tags().add(filename, tags, folder)
    }

    pub fn remove_tags<S: AsRef<str>>(
        &self,
        filename: &str,
        tags: &[S],
        folder: Option<&str>,
    ) -> Result<TagChange> {
        self.tags().remove(filename, tags, folder)
    }

    pub fn rename_tag(&self, old_tag: &str, new_tag: &str) -> Result<RenameReport> {
        self.tags().rename(old_tag, new_tag)
    }

    pub fn list_tags(&self) -> Result<TagCounts> {
        self.tags().list()
    }

    // === Search ===

    pub fn search(&self, query: &SearchQuery) -> Result<SearchReport> {
        self.searcher().search(query)
    }
}

impl Deref for VaultEngine {
    type Target = Vault;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
