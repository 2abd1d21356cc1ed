//! vault-note - a markdown vault as a guarded, searchable, taggable note store
//!
//! Every operation resolves the configured vault first and validates each
//! target path against it before touching the filesystem.

pub mod backup;
pub mod cli;
pub mod config;
pub mod constants;
pub mod edit;
pub mod engine;
pub mod error;
pub mod frontmatter;
pub mod guard;
pub mod lock;
pub mod markdown;
pub mod search;
pub mod store;
pub mod tags;
pub mod util;
pub mod vault;
pub mod walk;

pub use cli::{Cli, Command, TagCommand};
pub use config::VaultConfig;
pub use edit::EditOperation;
pub use engine::VaultEngine;
pub use error::{ErrorKind, Result, VaultError};
pub use search::{LineMatch, MatchDetail, SearchQuery, SearchReport, SearchResult, SearchType};
pub use store::{NoteContent, NoteCreated, NoteDeleted, NoteEdited};
pub use tags::{normalize_tag, RenameReport, TagChange, TagCount, TagCounts};
pub use vault::{list_vaults, Vault, VaultListing, VaultStatus};
