use super::backend::AttachmentStore;
use super::naming::{base_name, candidate, MAX_NAME_ATTEMPTS};
use crate::error::{DocsafeError, Result};
use crate::validation::validate_file_name;
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Attachment files in one flat directory.
pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(DocsafeError::Io)?;
        }
        Ok(())
    }

    /// Claims the first free name derived from `base` by creating it exclusively.
    fn reserve(&self, base: &str) -> Result<(String, File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = candidate(base, attempt);
            let opened = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&name));
            match opened {
                Ok(file) => return Ok((name, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(name = %name, "attachment name taken, trying next");
                }
                Err(e) => return Err(DocsafeError::Io(e)),
            }
        }
        Err(DocsafeError::Store(format!(
            "no free attachment name for {} after {} attempts",
            base, MAX_NAME_ATTEMPTS
        )))
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn ingest(&self, source: &Path, preferred_name: Option<&str>) -> Result<String> {
        let mut source_file = File::open(source).map_err(DocsafeError::Io)?;
        if !source_file.metadata().map_err(DocsafeError::Io)?.is_file() {
            return Err(DocsafeError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", source.display()),
            )));
        }
        self.ensure_dir()?;

        let base = base_name(source, preferred_name, Utc::now());
        let (name, mut dest) = self.reserve(&base)?;

        let copied = io::copy(&mut source_file, &mut dest).and_then(|_| dest.sync_all());
        if let Err(e) = copied {
            drop(dest);
            let _ = fs::remove_file(self.root.join(&name));
            return Err(DocsafeError::Io(e));
        }

        debug!(source = %source.display(), name = %name, "attachment ingested");
        Ok(name)
    }

    fn delete(&self, name: &str) -> Result<()> {
        validate_file_name(name)?;
        match fs::remove_file(self.root.join(name)) {
            Ok(()) => {
                debug!(name = %name, "attachment deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DocsafeError::Io(e)),
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn exists(&self, name: &str) -> bool {
        validate_file_name(name).is_ok() && self.root.join(name).is_file()
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(DocsafeError::Io)? {
            let entry = entry.map_err(DocsafeError::Io)?;
            if !entry.file_type().map_err(DocsafeError::Io)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsAttachmentStore) {
        let dir = TempDir::new().unwrap();
        let store = FsAttachmentStore::new(dir.path().join("attachments"));
        (dir, store)
    }

    fn source(dir: &TempDir, rel: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn ingest_copies_under_source_name() {
        let (dir, store) = setup();
        let src = source(&dir, "picked/passport.jpg", b"front");

        let name = store.ingest(&src, None).unwrap();

        assert_eq!(name, "passport.jpg");
        assert!(store.exists(&name));
        assert_eq!(fs::read(store.resolve(&name)).unwrap(), b"front");
        // The source is copied, not moved.
        assert!(src.exists());
    }

    #[test]
    fn colliding_names_get_distinct_files() {
        let (dir, store) = setup();
        let first = source(&dir, "camera/scan.jpg", b"first");
        let second = source(&dir, "gallery/scan.jpg", b"second");

        let a = store.ingest(&first, None).unwrap();
        let b = store.ingest(&second, None).unwrap();

        assert_eq!(a, "scan.jpg");
        assert_eq!(b, "scan-1.jpg");
        assert_eq!(fs::read(store.resolve(&a)).unwrap(), b"first");
        assert_eq!(fs::read(store.resolve(&b)).unwrap(), b"second");
    }

    #[test]
    fn preferred_name_is_used_and_sanitized() {
        let (dir, store) = setup();
        let src = source(&dir, "tmp/blob", b"x");
        let name = store.ingest(&src, Some("../outside.pdf")).unwrap();
        assert_eq!(name, "outside.pdf");
        assert!(store.root().join("outside.pdf").exists());
    }

    #[test]
    fn unreadable_source_is_io_error() {
        let (dir, store) = setup();
        let err = store.ingest(&dir.path().join("missing.jpg"), None).unwrap_err();
        assert!(matches!(err, DocsafeError::Io(_)));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn directory_source_is_rejected() {
        let (dir, store) = setup();
        let err = store.ingest(dir.path(), None).unwrap_err();
        assert!(matches!(err, DocsafeError::Io(_)));
    }

    #[test]
    fn delete_is_idempotent() {
        let (dir, store) = setup();
        let src = source(&dir, "a.pdf", b"a");
        let name = store.ingest(&src, None).unwrap();

        store.delete(&name).unwrap();
        assert!(!store.exists(&name));
        store.delete(&name).unwrap();
        store.delete("never-existed.pdf").unwrap();
    }

    #[test]
    fn delete_refuses_paths() {
        let (_dir, store) = setup();
        assert!(store.delete("../index.json").is_err());
        assert!(!store.exists("../index.json"));
    }

    #[test]
    fn list_skips_hidden_files_and_dirs() {
        let (dir, store) = setup();
        store.ingest(&source(&dir, "b.png", b"b"), None).unwrap();
        store.ingest(&source(&dir, "a.png", b"a"), None).unwrap();
        fs::write(store.root().join(".DS_Store"), b"").unwrap();
        fs::create_dir(store.root().join("nested")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["a.png", "b.png"]);
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let (_dir, store) = setup();
        assert!(store.list().unwrap().is_empty());
    }
}
