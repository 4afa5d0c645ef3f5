use crate::config::DocsafeConfig;
use crate::init::{FsRecordManager, VaultPaths};
use crate::manager::RecordManager;
use crate::store::fs_attachments::FsAttachmentStore;
use crate::store::fs_index::FsIndexStore;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway vault on disk with default layout.
pub struct TestEnv {
    // Keeps the directory alive for the duration of the test
    pub _temp_dir: TempDir,
    pub manager: FsRecordManager,
    pub paths: VaultPaths,
    /// Scratch directory outside the vault for source files to ingest.
    pub outside: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().join("vault");
        let outside = temp_dir.path().join("outside");
        fs::create_dir_all(&outside).expect("failed to create scratch dir");

        let paths = VaultPaths::new(&root, &DocsafeConfig::default());
        let manager = RecordManager::new(
            FsIndexStore::new(&paths.index),
            FsAttachmentStore::new(&paths.attachments),
        );
        Self {
            _temp_dir: temp_dir,
            manager,
            paths,
            outside,
        }
    }

    /// Writes a file outside the vault and returns its path.
    pub fn source_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.outside.join(name);
        fs::write(&path, contents).expect("failed to write source file");
        path
    }

    /// Names of the files currently in the attachment directory, sorted.
    pub fn attachment_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.paths.attachments) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }
}
