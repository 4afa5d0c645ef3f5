use super::backend::{AttachmentStore, IndexStore};
use super::naming::{base_name, candidate, MAX_NAME_ATTEMPTS};
use crate::error::{DocsafeError, Result};
use crate::model::DocumentRecord;
use crate::validation::check_index;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory index for testing.
///
/// Uses `Mutex` rather than `RefCell` because a `RecordManager` may be shared
/// between threads.
#[derive(Default)]
pub struct MemIndexStore {
    records: Mutex<Vec<DocumentRecord>>,
    simulate_write_error: AtomicBool,
    saves: AtomicUsize,
}

impl MemIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Test helper: replace the stored set without going through `save_atomic`.
    pub fn set_records(&self, records: Vec<DocumentRecord>) {
        *lock(&self.records) = records;
    }
}

impl IndexStore for MemIndexStore {
    fn load(&self) -> Result<Vec<DocumentRecord>> {
        let records = lock(&self.records).clone();
        check_index(&records).map_err(|reason| DocsafeError::CorruptIndex {
            path: PathBuf::from("memory://index"),
            reason,
        })?;
        Ok(records)
    }

    fn save_atomic(&self, records: &[DocumentRecord]) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(DocsafeError::Store("Simulated write error".to_string()));
        }
        *lock(&self.records) = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory attachment store for testing. `ingest` still reads the source from disk.
#[derive(Default)]
pub struct MemAttachmentStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    simulate_write_error: AtomicBool,
    simulate_delete_error: AtomicBool,
}

impl MemAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    pub fn set_simulate_delete_error(&self, simulate: bool) {
        self.simulate_delete_error.store(simulate, Ordering::SeqCst);
    }

    /// Test helper: place a file directly into the store.
    pub fn insert(&self, name: &str, bytes: &[u8]) {
        lock(&self.files).insert(name.to_string(), bytes.to_vec());
    }

    pub fn read(&self, name: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(name).cloned()
    }
}

impl AttachmentStore for MemAttachmentStore {
    fn ingest(&self, source: &Path, preferred_name: Option<&str>) -> Result<String> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(DocsafeError::Store("Simulated write error".to_string()));
        }
        let bytes = fs::read(source).map_err(DocsafeError::Io)?;
        let base = base_name(source, preferred_name, Utc::now());

        let mut files = lock(&self.files);
        let name = (0..MAX_NAME_ATTEMPTS)
            .map(|attempt| candidate(&base, attempt))
            .find(|name| !files.contains_key(name))
            .ok_or_else(|| DocsafeError::Store(format!("no free attachment name for {}", base)))?;
        files.insert(name.clone(), bytes);
        Ok(name)
    }

    fn delete(&self, name: &str) -> Result<()> {
        if self.simulate_delete_error.load(Ordering::SeqCst) {
            return Err(DocsafeError::Store("Simulated delete error".to_string()));
        }
        lock(&self.files).remove(name);
        Ok(())
    }

    fn resolve(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("memory://{}", name))
    }

    fn exists(&self, name: &str) -> bool {
        lock(&self.files).contains_key(name)
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(lock(&self.files).keys().cloned().collect())
    }
}
