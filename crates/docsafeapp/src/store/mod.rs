//! # Storage Layer
//!
//! A vault is stored as two independent resources, each behind its own trait:
//!
//! 1. **Index** ([`backend::IndexStore`]): one JSON file holding every
//!    [`DocumentRecord`](crate::model::DocumentRecord). It is always loaded and saved
//!    as a whole.
//! 2. **Attachments** ([`backend::AttachmentStore`]): a flat directory of files,
//!    referenced from the index by bare file name only.
//!
//! Neither store knows about the other. Keeping them consistent is the job of the
//! [`RecordManager`](crate::manager::RecordManager); detecting drift between them is
//! the job of the [`ConsistencyGuard`](crate::guard::ConsistencyGuard).
//!
//! ## Atomic Index Writes
//!
//! The index is written to a hidden temporary file next to the real one and renamed
//! over it. A crash mid-write leaves at most a stray `.tmp` file; the index itself is
//! either the old version or the new one.
//!
//! ## Collision-Safe Ingest
//!
//! Ingest never overwrites. The destination is opened with `create_new`, and if the
//! name is taken the store retries with `-1`, `-2`, ... appended to the stem. See
//! [`naming`].
//!
//! ## Implementations
//!
//! - [`fs_index::FsIndexStore`] and [`fs_attachments::FsAttachmentStore`]: production.
//! - [`mem_backend::MemIndexStore`] and [`mem_backend::MemAttachmentStore`]: for tests,
//!   with write-fault injection.
//!
//! ## Storage Layout
//!
//! ```text
//! <vault>/
//! ├── docsafe.toml        # Optional configuration
//! ├── index.json          # Record index
//! └── attachments/        # Attachment files
//!     ├── passport.jpg
//!     ├── passport-1.jpg
//!     └── camera_2024-05-01T10-00-00-000Z.jpg
//! ```

pub mod backend;
pub mod fs_attachments;
pub mod fs_index;
pub mod mem_backend;
pub mod naming;

pub use backend::{AttachmentStore, IndexStore};
