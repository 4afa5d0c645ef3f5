//! Command handlers.
//!
//! Each handler resolves the user's document reference, calls the record manager,
//! and returns what to print. Handlers never print or exit themselves.

use super::render;
use super::setup::OutputMode;
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use docsafeapp::init::{init_vault, DocsafeContext, FsRecordManager};
use docsafeapp::model::{
    AttachmentInput, AttachmentSlot, DocumentDraft, DocumentPatch, DocumentRecord, RecordFilter,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct AppState {
    pub ctx: DocsafeContext,
    pub output: OutputMode,
}

impl AppState {
    pub fn new(ctx: DocsafeContext, output: OutputMode) -> Self {
        Self { ctx, output }
    }

    fn manager(&self) -> &FsRecordManager {
        &self.ctx.manager
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<Option<String>> {
        if self.output == OutputMode::Json {
            let mut out = serde_json::to_string_pretty(value)?;
            out.push('\n');
            return Ok(Some(out));
        }
        Ok(None)
    }
}

pub struct AddArgs {
    pub name: String,
    pub principal: PathBuf,
    pub secondary: Option<PathBuf>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub expires: Option<NaiveDate>,
    pub archived: bool,
}

pub struct UpdateArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub clear_url: bool,
    pub expires: Option<NaiveDate>,
    pub archive: Option<bool>,
    pub principal: Option<PathBuf>,
    pub secondary: Option<PathBuf>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts a full id or a unique prefix of one (case-insensitive, dashes optional).
pub fn resolve_id(records: &[DocumentRecord], reference: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(id);
    }

    let needle = reference.trim().replace('-', "").to_ascii_lowercase();
    if needle.is_empty() {
        bail!("Empty document reference");
    }
    let matches: Vec<&DocumentRecord> = records
        .iter()
        .filter(|r| r.id.simple().to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [] => bail!("No document matches '{}'", reference),
        [only] => Ok(only.id),
        many => bail!(
            "'{}' matches {} documents, use a longer prefix",
            reference,
            many.len()
        ),
    }
}

fn lookup(state: &AppState, reference: &str) -> Result<Uuid> {
    let records = state.manager().load_all()?;
    resolve_id(&records, reference)
}

pub fn handle_init(root: &Path, output: OutputMode) -> Result<String> {
    let paths = init_vault(root)?;
    if output == OutputMode::Json {
        return Ok(format!("{}\n", serde_json::json!({ "root": paths.root })));
    }
    Ok(render::render_initialized(&paths.root))
}

pub fn handle_add(state: &AppState, args: AddArgs) -> Result<String> {
    let mut draft = DocumentDraft::new(args.name)
        .archived(args.archived)
        .with_principal(AttachmentInput::import(args.principal));
    if let Some(secondary) = args.secondary {
        draft = draft.with_secondary(AttachmentInput::import(secondary));
    }
    if let Some(description) = args.description {
        draft = draft.with_description(description);
    }
    if let Some(url) = args.url {
        draft = draft.with_reference_url(url);
    }
    if let Some(date) = args.expires {
        draft = draft.with_expiry_date(date);
    }

    let record = state.manager().create(draft)?;
    if let Some(out) = state.json(&record)? {
        return Ok(out);
    }
    Ok(render::render_created(&record))
}

pub fn handle_list(state: &AppState, filter: RecordFilter) -> Result<String> {
    let records = state.manager().list(filter)?;
    if let Some(out) = state.json(&records)? {
        return Ok(out);
    }
    Ok(render::render_list(&records, today()))
}

pub fn handle_show(state: &AppState, reference: &str) -> Result<String> {
    let id = lookup(state, reference)?;
    let record = state.manager().find(id)?;
    if let Some(out) = state.json(&record)? {
        return Ok(out);
    }
    Ok(render::render_record(&record, today(), |name| {
        state.manager().resolve(name)
    }))
}

pub fn handle_update(state: &AppState, reference: &str, args: UpdateArgs) -> Result<String> {
    let id = lookup(state, reference)?;

    let mut patch = DocumentPatch::new();
    if let Some(name) = args.name {
        patch = patch.with_name(name);
    }
    if let Some(description) = args.description {
        patch = patch.with_description(description);
    }
    if let Some(url) = args.url {
        patch = patch.with_reference_url(url);
    }
    if args.clear_url {
        patch = patch.clear_reference_url();
    }
    if let Some(date) = args.expires {
        patch = patch.with_expiry_date(date);
    }
    if let Some(archived) = args.archive {
        patch = patch.archived(archived);
    }
    if let Some(path) = args.principal {
        patch = patch.with_attachment(AttachmentSlot::Principal, AttachmentInput::import(path));
    }
    if let Some(path) = args.secondary {
        patch = patch.with_attachment(AttachmentSlot::Secondary, AttachmentInput::import(path));
    }
    if patch.is_empty() {
        bail!("Nothing to update, pass at least one field to change");
    }

    let record = state.manager().update(id, patch)?;
    if let Some(out) = state.json(&record)? {
        return Ok(out);
    }
    Ok(render::render_updated(&record))
}

pub fn handle_detach(state: &AppState, reference: &str, slot: AttachmentSlot) -> Result<String> {
    let id = lookup(state, reference)?;
    let record = state
        .manager()
        .remove_attachment(id, slot)
        .with_context(|| format!("Could not detach the {} attachment", slot))?;
    if let Some(out) = state.json(&record)? {
        return Ok(out);
    }
    Ok(render::render_updated(&record))
}

pub fn handle_delete(state: &AppState, reference: &str) -> Result<String> {
    let id = lookup(state, reference)?;
    let record = state.manager().delete(id)?;
    if let Some(out) = state.json(&record)? {
        return Ok(out);
    }
    Ok(render::render_deleted(&record))
}

pub fn handle_path(state: &AppState, reference: &str, slot: AttachmentSlot) -> Result<String> {
    let id = lookup(state, reference)?;
    let Some(target) = state.manager().share_target(id, slot)? else {
        bail!("Document has no {} attachment", slot);
    };
    if let Some(out) = state.json(&target)? {
        return Ok(out);
    }
    Ok(render::render_share_target(&target))
}

pub fn handle_doctor(state: &AppState, reclaim: bool) -> Result<String> {
    if reclaim {
        let report = state.manager().reclaim_orphans()?;
        if let Some(out) = state.json(&report)? {
            return Ok(out);
        }
        return Ok(render::render_reclaim(&report));
    }

    let report = state.manager().scan()?;
    if let Some(out) = state.json(&report)? {
        return Ok(out);
    }
    Ok(render::render_scan(&report))
}
