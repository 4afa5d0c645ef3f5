//! # Opening a Vault
//!
//! A vault is a directory. Front ends find it, open it, and get back a
//! [`DocsafeContext`] holding a ready [`RecordManager`] over the filesystem stores.
//!
//! ## Root Resolution
//!
//! [`resolve_vault_root`] picks the vault directory in priority order:
//! 1. An explicit path (the CLI's `--vault` flag).
//! 2. The `DOCSAFE_VAULT` environment variable (primarily for testing).
//! 3. The OS-appropriate data directory (via the `directories` crate).
//!
//! ## Opening
//!
//! [`open_vault`] loads `docsafe.toml` from the vault root, builds the stores at the
//! configured locations, and runs the startup check:
//!
//! - `reclaim_orphans_on_open = true`: orphaned files are deleted.
//! - `check_on_open = true` (the default): the vault is scanned and findings are
//!   logged, nothing is changed.
//!
//! Opening never creates anything. The index and attachment directory appear on the
//! first write, or up front through [`init_vault`].

use crate::config::{DocsafeConfig, CONFIG_FILE_NAME};
use crate::error::{DocsafeError, Result};
use crate::guard::ScanReport;
use crate::manager::RecordManager;
use crate::store::fs_attachments::FsAttachmentStore;
use crate::store::fs_index::FsIndexStore;
use crate::store::IndexStore;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

pub const VAULT_ENV: &str = "DOCSAFE_VAULT";

pub type FsRecordManager = RecordManager<FsIndexStore, FsAttachmentStore>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    pub root: PathBuf,
    pub index: PathBuf,
    pub attachments: PathBuf,
}

impl VaultPaths {
    pub fn new(root: &Path, config: &DocsafeConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            index: config.index_path(root),
            attachments: config.attachments_path(root),
        }
    }

    /// The attachment directory is scanned and reclaimed wholesale, so it must not
    /// contain the vault root, the index or the config file.
    pub fn check_layout(&self) -> Result<()> {
        let root = normalize(&self.root);
        let attachments = normalize(&self.attachments);
        let index = normalize(&self.index);

        if root.starts_with(&attachments) {
            return Err(DocsafeError::InvalidLayout(format!(
                "attachment directory {} contains the vault root",
                self.attachments.display()
            )));
        }
        if index == root || index.starts_with(&attachments) {
            return Err(DocsafeError::InvalidLayout(format!(
                "index file {} must sit outside the attachment directory",
                self.index.display()
            )));
        }
        Ok(())
    }
}

/// Lexical cleanup of `.` and `..` so configured paths compare by location.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

pub struct DocsafeContext {
    pub manager: FsRecordManager,
    pub paths: VaultPaths,
    pub config: DocsafeConfig,
    /// What the startup check found, if it ran. After a reclaim, the orphans listed
    /// here are already gone.
    pub startup_report: Option<ScanReport>,
}

pub fn resolve_vault_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => path,
        None => match std::env::var_os(VAULT_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => ProjectDirs::from("com", "docsafe", "docsafe")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    DocsafeError::Store("could not determine a data directory".to_string())
                })?,
        },
    };

    if root.is_absolute() {
        Ok(root)
    } else {
        Ok(std::env::current_dir()?.join(root))
    }
}

pub fn load_config(root: &Path) -> DocsafeConfig {
    Clapfig::builder()
        .app_name("docsafe")
        .file_name(CONFIG_FILE_NAME)
        .search_paths(vec![SearchPath::Path(root.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_default()
}

/// Open the vault at `root` and run the configured startup check.
pub fn open_vault(root: &Path) -> Result<DocsafeContext> {
    let config = load_config(root);
    let paths = VaultPaths::new(root, &config);
    paths.check_layout()?;
    debug!(root = %paths.root.display(), "opening vault");

    let manager = RecordManager::new(
        FsIndexStore::new(&paths.index),
        FsAttachmentStore::new(&paths.attachments),
    );

    let startup_report = if config.reclaim_orphans_on_open {
        let reclaimed = manager.reclaim_orphans()?;
        for name in &reclaimed.failed {
            warn!(name = %name, "orphaned attachment could not be reclaimed");
        }
        let report = ScanReport {
            orphaned_files: reclaimed.reclaimed.into_iter().collect(),
            dangling_references: reclaimed.dangling_references,
        };
        log_findings(&report);
        Some(report)
    } else if config.check_on_open {
        let report = manager.scan()?;
        log_findings(&report);
        Some(report)
    } else {
        None
    };

    Ok(DocsafeContext {
        manager,
        paths,
        config,
        startup_report,
    })
}

/// Create the vault directory, its attachment directory and an empty index.
/// Existing content is left alone.
pub fn init_vault(root: &Path) -> Result<VaultPaths> {
    let config = load_config(root);
    let paths = VaultPaths::new(root, &config);
    paths.check_layout()?;

    fs::create_dir_all(&paths.attachments)?;
    if !paths.index.exists() {
        FsIndexStore::new(&paths.index).save_atomic(&[])?;
        info!(root = %paths.root.display(), "vault initialized");
    }
    Ok(paths)
}

fn log_findings(report: &ScanReport) {
    if !report.orphaned_files.is_empty() {
        warn!(
            count = report.orphaned_files.len(),
            "vault has attachment files no document references"
        );
    }
    for dangling in &report.dangling_references {
        warn!(
            id = %dangling.id,
            file = %dangling.file_name,
            "document references a missing attachment"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_root_wins() {
        let temp = TempDir::new().unwrap();
        let root = resolve_vault_root(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(root, temp.path());
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let root = resolve_vault_root(Some(PathBuf::from("my-vault"))).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("my-vault"));
    }

    #[test]
    fn test_init_creates_layout() {
        let temp = TempDir::new().unwrap();
        let paths = init_vault(temp.path()).unwrap();

        assert!(paths.attachments.is_dir());
        assert!(paths.index.is_file());
        assert_eq!(paths.index, temp.path().join("index.json"));
        assert!(FsIndexStore::new(&paths.index).load().unwrap().is_empty());
    }

    #[test]
    fn test_init_keeps_existing_index() {
        let temp = TempDir::new().unwrap();
        let index = temp.path().join("index.json");
        fs::write(&index, r#"{ "documents": [] }"#).unwrap();

        init_vault(temp.path()).unwrap();
        assert_eq!(
            fs::read_to_string(&index).unwrap(),
            r#"{ "documents": [] }"#
        );
    }

    #[test]
    fn test_open_reads_vault_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "index_file = \"records.json\"\nattachments_dir = \"files\"\n",
        )
        .unwrap();

        let ctx = open_vault(temp.path()).unwrap();
        assert_eq!(ctx.paths.index, temp.path().join("records.json"));
        assert_eq!(ctx.paths.attachments, temp.path().join("files"));
    }

    #[test]
    fn test_open_empty_dir_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let ctx = open_vault(temp.path()).unwrap();

        assert!(ctx.startup_report.unwrap().is_clean());
        assert!(!ctx.paths.index.exists());
        assert!(!ctx.paths.attachments.exists());
    }

    #[test]
    fn test_open_reports_orphans_without_deleting() {
        let temp = TempDir::new().unwrap();
        let paths = init_vault(temp.path()).unwrap();
        fs::write(paths.attachments.join("stray.jpg"), b"x").unwrap();

        let ctx = open_vault(temp.path()).unwrap();
        let report = ctx.startup_report.unwrap();
        assert!(report.orphaned_files.contains("stray.jpg"));
        assert!(paths.attachments.join("stray.jpg").exists());
    }

    #[test]
    fn test_open_can_reclaim_orphans() {
        let temp = TempDir::new().unwrap();
        let paths = init_vault(temp.path()).unwrap();
        fs::write(paths.attachments.join("stray.jpg"), b"x").unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "reclaim_orphans_on_open = true\n",
        )
        .unwrap();

        let ctx = open_vault(temp.path()).unwrap();
        assert!(ctx
            .startup_report
            .unwrap()
            .orphaned_files
            .contains("stray.jpg"));
        assert!(!paths.attachments.join("stray.jpg").exists());
    }

    fn write_config(root: &Path, contents: &str) {
        fs::write(root.join(CONFIG_FILE_NAME), contents).unwrap();
    }

    #[test]
    fn test_attachments_at_vault_root_is_rejected() {
        for dir in ["", ".", "./", "files/.."] {
            let temp = TempDir::new().unwrap();
            write_config(temp.path(), &format!("attachments_dir = \"{}\"\n", dir));

            assert!(
                matches!(
                    open_vault(temp.path()),
                    Err(DocsafeError::InvalidLayout(_))
                ),
                "attachments_dir = {:?} was accepted",
                dir
            );
            assert!(matches!(
                init_vault(temp.path()),
                Err(DocsafeError::InvalidLayout(_))
            ));
            assert!(temp.path().join(CONFIG_FILE_NAME).exists());
            assert!(!temp.path().join("index.json").exists());
        }
    }

    #[test]
    fn test_attachments_above_vault_root_is_rejected() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("vault");
        fs::create_dir_all(&root).unwrap();
        write_config(&root, "attachments_dir = \"..\"\n");

        assert!(matches!(
            open_vault(&root),
            Err(DocsafeError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_index_inside_attachments_is_rejected() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "index_file = \"attachments/index.json\"\n");

        assert!(matches!(
            open_vault(temp.path()),
            Err(DocsafeError::InvalidLayout(_))
        ));
        assert!(matches!(
            init_vault(temp.path()),
            Err(DocsafeError::InvalidLayout(_))
        ));
        assert!(!temp.path().join("attachments").exists());
    }

    #[test]
    fn test_rejected_layout_never_reclaims() {
        let temp = TempDir::new().unwrap();
        let paths = init_vault(temp.path()).unwrap();
        write_config(
            temp.path(),
            "attachments_dir = \".\"\nreclaim_orphans_on_open = true\n",
        );

        assert!(open_vault(temp.path()).is_err());
        assert!(paths.index.is_file());
        assert!(temp.path().join(CONFIG_FILE_NAME).is_file());
    }

    #[test]
    fn test_sibling_layouts_are_accepted() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            "index_file = \"data/index.json\"\nattachments_dir = \"data/files\"\n",
        );

        let paths = init_vault(temp.path()).unwrap();
        assert!(paths.attachments.is_dir());
        assert!(paths.index.is_file());
        assert!(open_vault(temp.path()).is_ok());
    }

    #[test]
    fn test_open_fails_on_corrupt_index() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.json"), "{ not json").unwrap();

        assert!(matches!(
            open_vault(temp.path()),
            Err(DocsafeError::CorruptIndex { .. })
        ));
    }
}
