use clap::{Parser, Subcommand};

/// vault-note - Safe note management for a markdown vault
///
/// # Quick Reference
///
/// ## Notes
///
/// ```bash
/// vault-note create "Idea" "# My Idea"           # Create Idea.md
/// vault-note create "Plan" -f Projects/2024 -    # Content from stdin
/// vault-note read "Idea"                        # Print content and file info
/// vault-note edit "Idea" "More text" -o append  # replace | append | prepend
/// vault-note delete "Idea"                      # Delete (a backup is kept)
///
/// # From stdin/heredoc:
/// vault-note create "Idea" <<EOF
/// # My Idea
///
/// Detailed description here...
/// EOF
/// ```
///
/// ## Tags
///
/// ```bash
/// vault-note tag add "Idea" rust programming
/// vault-note tag remove "Idea" rust
/// vault-note tag rename rust rustlang    # Every note in the vault
/// vault-note tags                        # Usage counts
/// ```
///
/// ## Search
///
/// ```bash
/// vault-note search "todo"                   # Content (regex or literal)
/// vault-note search "meeting" -t filename
/// vault-note search "work/*" -t tag          # Hierarchical and wildcard
/// vault-note search "TODO" -c -p Projects -l 0   # Case-sensitive, folder, no limit
/// ```
///
/// ## Environment Variables
///
/// - `VAULT_NOTE_PATH`: Vault root directory (`~` is expanded)
/// - `VAULT_NOTE_STRICT`: Require the `.obsidian` marker directory
/// - `RUST_LOG`: Log filter (overrides `-v`)
///
/// Backups are written next to a note as `<name>.backup.<YYYYMMDD_HHMMSS>.md`
/// before every edit, delete and tag change.
#[derive(Parser, Debug)]
#[command(name = "vault-note")]
#[command(version)]
#[command(about = "Safe note management for a markdown vault")]
pub struct Cli {
    /// Vault root directory (default: $VAULT_NOTE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub vault: Option<String>,

    /// Require the vault marker directory (.obsidian)
    #[arg(long, global = true)]
    pub strict: bool,

    /// Output in JSON format (for scripting/LLM usage)
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new note
    #[command(alias = "new")]
    Create {
        /// Note filename (.md is added if missing)
        filename: String,

        /// Content (use "-" or omit to read from stdin)
        content: Option<String>,

        /// Folder inside the vault (may be nested, e.g. Projects/2024)
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Print a note with its file info
    #[command(alias = "p")]
    Read {
        /// Note filename
        filename: String,

        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Replace, append to or prepend to a note
    Edit {
        /// Note filename
        filename: String,

        /// Content (use "-" or omit to read from stdin)
        content: Option<String>,

        #[arg(short, long)]
        folder: Option<String>,

        /// replace, append or prepend
        #[arg(short, long, default_value = "replace")]
        operation: String,
    },

    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note filename
        filename: String,

        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Show the configured vault and its status
    Vaults,

    /// Search notes by content, filename or tag
    #[command(alias = "s")]
    Search {
        /// Query: regex (content), substring (filename) or tag pattern (tag)
        query: String,

        /// content, filename or tag
        #[arg(short = 't', long = "type", default_value = "content")]
        search_type: String,

        /// Match case exactly
        #[arg(short, long)]
        case_sensitive: bool,

        /// Folder inside the vault to search
        #[arg(short, long)]
        path: Option<String>,

        /// Maximum results (0 for no limit)
        #[arg(short, long, default_value_t = crate::constants::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// List all tags with usage counts
    Tags,

    /// Manage note tags
    #[command(subcommand)]
    Tag(TagCommand),
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Add tags to a note's frontmatter
    Add {
        /// Note filename
        filename: String,

        /// Tags to add (leading # optional)
        #[arg(required = true)]
        tags: Vec<String>,

        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Remove tags from a note (frontmatter and inline)
    Remove {
        /// Note filename
        filename: String,

        /// Tags to remove (leading # optional)
        #[arg(required = true)]
        tags: Vec<String>,

        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Rename a tag across the whole vault
    Rename {
        old_tag: String,
        new_tag: String,
    },
}
