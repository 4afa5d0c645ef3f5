//! # Docsafe Architecture
//!
//! Docsafe is a **UI-agnostic document vault library**. A vault is a directory holding
//! one JSON index of document records and a flat directory of attachment files. The
//! library keeps the two in correspondence; every front end (the bundled CLI, a GUI, a
//! service) goes through the [`manager::RecordManager`] and never touches the files
//! directly.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Front end (crates/docsafe, or any other UI)                │
//! │  - Pickers, sharing, rendering, exit codes                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record Manager (manager.rs) + Consistency Guard (guard.rs) │
//! │  - Validation, stage-then-commit, cascading delete          │
//! │  - One lock around every read-modify-write cycle            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - IndexStore: atomic load/save of the record set           │
//! │  - AttachmentStore: collision-safe ingest, idempotent delete│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No I/O Assumptions in Core
//!
//! Nothing in this crate writes to stdout/stderr or exits the process. Diagnostics go
//! through `tracing`; the front end decides whether and where to print them.
//!
//! ## Module Overview
//!
//! - [`manager`]: The record manager, sole entry point for mutations
//! - [`guard`]: Orphan / dangling reference scan and orphan reclamation
//! - [`store`]: Storage traits and their filesystem and in-memory implementations
//! - [`model`]: `DocumentRecord`, attachments, drafts and patches
//! - [`validation`]: Name, URL and file name rules
//! - [`mime`]: Attachment kind and MIME classification for share hand-off
//! - [`config`]: Vault configuration
//! - [`init`]: Vault root resolution and context construction
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod guard;
pub mod init;
pub mod manager;
pub mod mime;
pub mod model;
pub mod store;
pub mod validation;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
