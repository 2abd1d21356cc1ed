//! Vault resolution and status
//!
//! A vault is a canonical root directory. Every other module takes its paths
//! from here.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::VaultConfig;
use crate::constants as C;
use crate::error::{Result, VaultError};
use crate::util;
use crate::walk;

/// A Vault is the root directory of a markdown note store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vault {
    /// Name of the vault (its directory name)
    pub name: String,
    /// Canonical path to the vault directory
    pub root: PathBuf,
}

impl Vault {
    /// Resolve the configured vault, failing fast if it is unusable
    pub fn resolve(config: &VaultConfig) -> Result<Self> {
        let path = config.vault_path.as_ref().ok_or(VaultError::NotConfigured)?;
        Self::open(path, config.require_marker)
    }

    /// Open the vault at `path`
    pub fn open(path: &Path, require_marker: bool) -> Result<Self> {
        if !path.exists() {
            return Err(VaultError::VaultNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(VaultError::NotADirectory(path.to_path_buf()));
        }
        if require_marker && !path.join(C::VAULT_MARKER_DIR).is_dir() {
            return Err(VaultError::InvalidVault {
                path: path.to_path_buf(),
                marker: C::VAULT_MARKER_DIR,
            });
        }

        // Use dunce to avoid UNC prefix on Windows
        let root = dunce::canonicalize(path).map_err(|e| VaultError::io(path, e))?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| util::display_path(&root));

        Ok(Self { name, root })
    }

    /// Get the path to this vault
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Check if this vault carries the marker directory
    pub fn has_marker(&self) -> bool {
        self.root.join(C::VAULT_MARKER_DIR).is_dir()
    }

    /// Vault-relative display form of a path inside this vault
    pub fn relative(&self, path: &Path) -> String {
        util::relative_path(&self.root, path)
    }
}

/// Coarse health of the configured vault
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VaultStatus {
    Accessible { notes: usize },
    Missing,
    NotADirectory,
    MissingMarker,
}

impl fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultStatus::Accessible { notes } => {
                write!(f, "accessible, {} notes", util::group_thousands(*notes as u64))
            }
            VaultStatus::Missing => write!(f, "path does not exist"),
            VaultStatus::NotADirectory => write!(f, "not a directory"),
            VaultStatus::MissingMarker => {
                write!(f, "missing {} config", C::VAULT_MARKER_DIR)
            }
        }
    }
}

/// One entry of the vault listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultInfo {
    pub name: String,
    pub path: String,
    pub status: VaultStatus,
}

/// Result of `list_vaults`: the single configured vault, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultListing {
    pub vaults: Vec<VaultInfo>,
}

impl fmt::Display for VaultListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vaults.is_empty() {
            return write!(f, "No vault configured");
        }
        writeln!(f, "Available vaults:")?;
        for vault in &self.vaults {
            write!(f, "\n- {}: {} - {}", vault.name, vault.path, vault.status)?;
        }
        Ok(())
    }
}

/// Report the configured vault and its status.
///
/// Never fails: problems with the vault are reported as its status.
pub fn list_vaults(config: &VaultConfig) -> VaultListing {
    let path = match &config.vault_path {
        Some(p) => p,
        None => return VaultListing { vaults: Vec::new() },
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| util::display_path(path));

    let status = if !path.exists() {
        VaultStatus::Missing
    } else if !path.is_dir() {
        VaultStatus::NotADirectory
    } else if config.require_marker && !path.join(C::VAULT_MARKER_DIR).is_dir() {
        VaultStatus::MissingMarker
    } else {
        let root = dunce::canonicalize(path).unwrap_or_else(|_| path.clone());
        VaultStatus::Accessible {
            notes: walk::count_notes(&root),
        }
    };

    VaultListing {
        vaults: vec![VaultInfo {
            name,
            path: util::display_path(path),
            status,
        }],
    }
}
