use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// A rule a record or an attachment reference failed to satisfy.
///
/// Validation always runs before any mutation, so receiving one of these means
/// neither the index nor the attachment directory was touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Document name is required")]
    EmptyName,

    #[error("A principal attachment is required")]
    MissingPrincipal,

    #[error("Invalid reference URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid attachment file name: {0:?}")]
    InvalidFileName(String),

    #[error("Attachment not found in store: {0}")]
    AttachmentNotFound(String),

    #[error("Attachment already belongs to another document: {0}")]
    AttachmentInUse(String),

    #[error("Attachment used for both slots: {0}")]
    DuplicateAttachment(String),
}

#[derive(Error, Debug)]
pub enum DocsafeError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Document not found: {0}")]
    RecordNotFound(Uuid),

    #[error("Corrupt index at {}: {reason}", path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid vault layout: {0}")]
    InvalidLayout(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, DocsafeError>;
