//! # Rendering
//!
//! Turns library values into terminal text. Every function returns a `String`; the
//! handlers decide where it goes. JSON output bypasses this module and serializes the
//! library types directly.
//!
//! ## List Layout
//!
//! ```text
//!   0b6f6f4e  Passport                                  2030-05-01  2 att   3 days ago
//!   │         │                                         │           │       │
//!   short id  name (fill, truncated)                    expiry      count   created
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use console::Style;
use docsafeapp::guard::{DanglingReference, ReclaimReport, ScanReport};
use docsafeapp::mime::{AttachmentKind, ShareTarget};
use docsafeapp::model::{AttachmentSlot, DocumentRecord};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 100;
pub const SHORT_ID_LEN: usize = 8;

const COL_ID: usize = SHORT_ID_LEN + 2;
const COL_EXPIRY: usize = 12;
const COL_COUNT: usize = 7;
const COL_TIME: usize = 16;

fn muted() -> Style {
    Style::new().dim()
}

fn title() -> Style {
    Style::new().bold()
}

fn expired() -> Style {
    Style::new().red()
}

fn archived() -> Style {
    Style::new().yellow()
}

fn success() -> Style {
    Style::new().green()
}

fn warning() -> Style {
    Style::new().yellow()
}

pub fn short_id(record: &DocumentRecord) -> String {
    record.id.simple().to_string()[..SHORT_ID_LEN].to_string()
}

pub fn render_list(records: &[DocumentRecord], today: NaiveDate) -> String {
    if records.is_empty() {
        return "No documents found.\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        let name_width = LINE_WIDTH.saturating_sub(2 + COL_ID + COL_EXPIRY + COL_COUNT + COL_TIME);
        let name = truncate_to_width(&record.name, name_width);
        let padding = name_width.saturating_sub(name.width());

        let expiry = record.expiry_date.format("%Y-%m-%d").to_string();
        let expiry = if record.is_expired(today) {
            expired().apply_to(format!("{:<width$}", expiry, width = COL_EXPIRY))
        } else {
            Style::new().apply_to(format!("{:<width$}", expiry, width = COL_EXPIRY))
        };
        let marker = if record.archive_flag {
            archived().apply_to("a ")
        } else {
            Style::new().apply_to("  ")
        };
        let count = format!("{} att", record.attachments.count());

        out.push_str(&format!(
            "{}{}{}{}{}{:<cw$}{}\n",
            marker,
            muted().apply_to(format!("{:<width$}", short_id(record), width = COL_ID)),
            name,
            " ".repeat(padding),
            expiry,
            count,
            muted().apply_to(format_time_ago(record.creation_timestamp)),
            cw = COL_COUNT,
        ));
    }
    out
}

pub fn render_record(
    record: &DocumentRecord,
    today: NaiveDate,
    resolve: impl Fn(&str) -> PathBuf,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", title().apply_to(&record.name)));
    out.push_str(&format!("{}\n", muted().apply_to(record.id)));
    out.push('\n');

    if !record.description.is_empty() {
        out.push_str(&format!("{}\n\n", record.description));
    }

    let expiry = record.expiry_date.format("%Y-%m-%d").to_string();
    let expiry = if record.is_expired(today) {
        format!("{} {}", expired().apply_to(expiry), expired().apply_to("(expired)"))
    } else {
        expiry
    };
    out.push_str(&field("Expires", &expiry));
    out.push_str(&field(
        "Created",
        &record.creation_timestamp.format("%Y-%m-%d %H:%M").to_string(),
    ));
    if let Some(url) = &record.reference_url {
        out.push_str(&field("URL", url));
    }
    if record.archive_flag {
        out.push_str(&field("Status", &archived().apply_to("archived").to_string()));
    }

    for slot in AttachmentSlot::ALL {
        if let Some(name) = record.attachment(slot) {
            let kind = AttachmentKind::from_file_name(name);
            out.push_str(&field(
                &slot.to_string(),
                &format!(
                    "{} {}",
                    name,
                    muted().apply_to(format!("[{}] {}", kind_label(kind), resolve(name).display()))
                ),
            ));
        }
    }
    out
}

pub fn render_share_target(target: &ShareTarget) -> String {
    format!("{}\n", target.path.display())
}

pub fn render_created(record: &DocumentRecord) -> String {
    format!(
        "{} {} ({})\n",
        success().apply_to("Added"),
        record.name,
        short_id(record)
    )
}

pub fn render_updated(record: &DocumentRecord) -> String {
    format!(
        "{} {} ({})\n",
        success().apply_to("Updated"),
        record.name,
        short_id(record)
    )
}

pub fn render_deleted(record: &DocumentRecord) -> String {
    format!(
        "{} {} ({})\n",
        success().apply_to("Deleted"),
        record.name,
        short_id(record)
    )
}

pub fn render_initialized(root: &Path) -> String {
    format!(
        "{} vault at {}\n",
        success().apply_to("Initialized"),
        root.display()
    )
}

pub fn render_scan(report: &ScanReport) -> String {
    if report.is_clean() {
        return format!("{}\n", success().apply_to("Vault is consistent."));
    }

    let mut out = String::new();
    if !report.orphaned_files.is_empty() {
        out.push_str(&format!(
            "{}\n",
            warning().apply_to(format!(
                "{} orphaned file(s), run `docsafe doctor --reclaim` to delete:",
                report.orphaned_files.len()
            ))
        ));
        for name in &report.orphaned_files {
            out.push_str(&format!("  {}\n", name));
        }
    }
    out.push_str(&render_dangling(&report.dangling_references));
    out
}

pub fn render_reclaim(report: &ReclaimReport) -> String {
    let mut out = String::new();
    if report.reclaimed.is_empty() {
        out.push_str("No orphaned files.\n");
    } else {
        out.push_str(&format!(
            "{}\n",
            success().apply_to(format!("Reclaimed {} file(s):", report.reclaimed.len()))
        ));
        for name in &report.reclaimed {
            out.push_str(&format!("  {}\n", name));
        }
    }
    if !report.failed.is_empty() {
        out.push_str(&format!(
            "{}\n",
            warning().apply_to(format!("Could not delete {} file(s):", report.failed.len()))
        ));
        for name in &report.failed {
            out.push_str(&format!("  {}\n", name));
        }
    }
    out.push_str(&render_dangling(&report.dangling_references));
    out
}

fn render_dangling(dangling: &BTreeSet<DanglingReference>) -> String {
    if dangling.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "{}\n",
        expired().apply_to(format!(
            "{} reference(s) to missing files (fix these by hand):",
            dangling.len()
        ))
    );
    for reference in dangling {
        out.push_str(&format!("  {}  {}\n", reference.id, reference.file_name));
    }
    out
}

fn field(label: &str, value: &str) -> String {
    format!("{} {}\n", muted().apply_to(format!("{:>10}:", label)), value)
}

fn kind_label(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Pdf => "pdf",
        AttachmentKind::Word => "word",
        AttachmentKind::Spreadsheet => "spreadsheet",
        AttachmentKind::Presentation => "presentation",
        AttachmentKind::Image => "image",
        AttachmentKind::Archive => "archive",
        AttachmentKind::Audio => "audio",
        AttachmentKind::Video => "video",
        AttachmentKind::Other => "file",
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;
    let limit = max_width.saturating_sub(1);

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = COL_TIME)
}
