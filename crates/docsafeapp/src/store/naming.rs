//! Stored file names.
//!
//! Names are derived from what the caller suggests, then from the source file, and
//! as a last resort from the capture time (`camera_2024-05-01T10-00-00-000Z.jpg`).
//! When a name is taken, [`candidate`] produces `stem-1.ext`, `stem-2.ext`, ...

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;

/// Upper bound on `-N` suffixes tried before ingest gives up.
pub const MAX_NAME_ATTEMPTS: usize = 10_000;

/// Name for a file captured at `at`, e.g. `camera_2024-05-01T10-00-00-000Z.jpg`.
pub fn capture_file_name(at: DateTime<Utc>, ext: &str) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("camera_{}.{}", stamp, ext.trim_start_matches('.'))
}

/// Reduce a suggested name to a bare, visible file name.
pub fn sanitize(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = last
        .trim()
        .trim_start_matches('.')
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// First-choice stored name for ingesting `source`.
pub fn base_name(source: &Path, preferred: Option<&str>, now: DateTime<Utc>) -> String {
    preferred
        .and_then(sanitize)
        .or_else(|| source.file_name().and_then(|n| n.to_str()).and_then(sanitize))
        .unwrap_or_else(|| {
            let ext = source
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("bin");
            capture_file_name(now, ext)
        })
}

/// The `attempt`-th name to try for `base`. Attempt 0 is `base` itself.
pub fn candidate(base: &str, attempt: usize) -> String {
    if attempt == 0 {
        return base.to_string();
    }
    let path = Path::new(base);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(base);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-{}.{}", stem, attempt, ext),
        None => format!("{}-{}", stem, attempt),
    }
}
