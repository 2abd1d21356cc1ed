//! Vault configuration
//!
//! The vault location comes from, in priority order:
//! - an explicit override (the `--vault` flag)
//! - the VAULT_NOTE_PATH environment variable
//!
//! There is no fallback location: an unset path is reported as
//! `NotConfigured` by every operation.

use std::path::{Path, PathBuf};

use crate::constants as C;

/// Configuration for locating the vault
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultConfig {
    /// Root directory of the vault
    pub vault_path: Option<PathBuf>,
    /// Whether the vault must contain the marker directory
    pub require_marker: bool,
}

impl VaultConfig {
    /// Build configuration from the environment
    pub fn from_env() -> Self {
        // Treat empty strings as None
        let vault_path = std::env::var(C::ENV_VAULT_PATH)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| expand_home(&s));
        let require_marker = std::env::var(C::ENV_VAULT_STRICT)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            vault_path,
            require_marker,
        }
    }

    /// Build configuration for an explicit path
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self {
            vault_path: Some(path.as_ref().to_path_buf()),
            require_marker: false,
        }
    }

    /// Apply command-line overrides on top of this configuration
    pub fn with_overrides(mut self, vault: Option<&str>, strict: bool) -> Self {
        if let Some(path) = vault.filter(|s| !s.trim().is_empty()) {
            self.vault_path = Some(expand_home(path));
        }
        if strict {
            self.require_marker = true;
        }
        self
    }

    /// Require the marker directory
    pub fn strict(mut self) -> Self {
        self.require_marker = true;
        self
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
