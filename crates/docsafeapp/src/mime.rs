//! Classification of attachments by file extension.
//!
//! Front ends use this to pick an icon or viewer ([`AttachmentKind`]) and to hand a
//! file to a platform share sheet with a MIME type ([`mime_type`]).

use serde::Serialize;
use std::path::{Path, PathBuf};

pub const GENERIC_BINARY: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Pdf,
    Word,
    Spreadsheet,
    Presentation,
    Image,
    Archive,
    Audio,
    Video,
    Other,
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

impl AttachmentKind {
    pub fn from_file_name(file_name: &str) -> Self {
        match extension(file_name).as_deref() {
            Some("pdf") => AttachmentKind::Pdf,
            Some("doc" | "docx") => AttachmentKind::Word,
            Some("xls" | "xlsx") => AttachmentKind::Spreadsheet,
            Some("ppt" | "pptx") => AttachmentKind::Presentation,
            Some("jpg" | "jpeg" | "png") => AttachmentKind::Image,
            Some("zip" | "rar") => AttachmentKind::Archive,
            Some("mp3" | "wav") => AttachmentKind::Audio,
            Some("mp4" | "mkv") => AttachmentKind::Video,
            _ => AttachmentKind::Other,
        }
    }

    /// Images open in the built-in viewer, everything else in an external app.
    pub fn is_image(self) -> bool {
        self == AttachmentKind::Image
    }
}

/// MIME type to announce when sharing `file_name`.
pub fn mime_type(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc" | "docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls" | "xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("ppt" | "pptx") => "application/vnd.ms-powerpoint",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp3" | "wav") => "audio/*",
        Some("mp4" | "mkv") => "video/*",
        _ => GENERIC_BINARY,
    }
}

/// What a front end needs to share or open one attachment.
#[derive(Debug, Clone, Serialize)]
pub struct ShareTarget {
    pub file_name: String,
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub kind: AttachmentKind,
}

impl ShareTarget {
    pub fn new(file_name: &str, path: PathBuf) -> Self {
        Self {
            file_name: file_name.to_string(),
            path,
            mime_type: mime_type(file_name),
            kind: AttachmentKind::from_file_name(file_name),
        }
    }
}
