//! # Configuration
//!
//! Vault configuration is managed by [`clapfig`], which handles layered loading
//! from TOML files, environment variables, and programmatic overrides.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `DOCSAFE__INDEX_FILE`, `DOCSAFE__CHECK_ON_OPEN`, etc.
//! 2. **Vault Config**: `<vault>/docsafe.toml`.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! A missing or unreadable config file is not an error; the defaults apply.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `index_file` | `index.json` | Index file name, relative to the vault root |
//! | `attachments_dir` | `attachments` | Attachment directory, relative to the vault root |
//! | `check_on_open` | `true` | Scan for orphans and dangling references when opening |
//! | `reclaim_orphans_on_open` | `false` | Delete orphaned files when opening |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "docsafe.toml";

/// Configuration for a vault, stored in `docsafe.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DocsafeConfig {
    /// Name of the index file inside the vault root.
    #[config(default = "index.json")]
    pub index_file: String,

    /// Name of the attachment directory inside the vault root.
    #[config(default = "attachments")]
    pub attachments_dir: String,

    /// Run a consistency scan when the vault is opened and log what it finds.
    #[config(default = true)]
    pub check_on_open: bool,

    /// Delete orphaned attachment files when the vault is opened.
    #[config(default = false)]
    pub reclaim_orphans_on_open: bool,
}

impl Default for DocsafeConfig {
    fn default() -> Self {
        Self {
            index_file: "index.json".to_string(),
            attachments_dir: "attachments".to_string(),
            check_on_open: true,
            reclaim_orphans_on_open: false,
        }
    }
}

impl DocsafeConfig {
    pub fn index_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index_file)
    }

    pub fn attachments_path(&self, root: &Path) -> PathBuf {
        root.join(&self.attachments_dir)
    }
}
