//! Whole-note edit operations
//!
//! An edit combines a note's existing content with caller-supplied content.
//! The result always replaces the whole file; there are no partial patches.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::VaultError;

/// Edit operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOperation {
    /// Overwrite the note with the new content
    #[default]
    Replace,
    /// Existing content, a newline, then the new content
    Append,
    /// New content, a newline, then the existing content
    Prepend,
}

impl EditOperation {
    /// Compute the note's new content
    pub fn apply(self, existing: &str, content: &str) -> String {
        match self {
            EditOperation::Replace => content.to_string(),
            EditOperation::Append => format!("{}\n{}", existing, content),
            EditOperation::Prepend => format!("{}\n{}", content, existing),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditOperation::Replace => "replace",
            EditOperation::Append => "append",
            EditOperation::Prepend => "prepend",
        }
    }
}

impl FromStr for EditOperation {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(EditOperation::Replace),
            "append" => Ok(EditOperation::Append),
            "prepend" => Ok(EditOperation::Prepend),
            other => Err(VaultError::InvalidOperation(other.to_string())),
        }
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
