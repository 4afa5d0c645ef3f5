use docsafeapp::error::{DocsafeError, ValidationError};
use docsafeapp::init::{init_vault, open_vault, FsRecordManager};
use docsafeapp::manager::RecordManager;
use docsafeapp::model::{AttachmentInput, AttachmentSlot, DocumentDraft, DocumentPatch};
use docsafeapp::store::fs_attachments::FsAttachmentStore;
use docsafeapp::store::fs_index::FsIndexStore;
use docsafeapp::store::{AttachmentStore, IndexStore};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup() -> (TempDir, FsRecordManager) {
    let dir = TempDir::new().unwrap();
    let manager = RecordManager::new(
        FsIndexStore::new(dir.path().join("index.json")),
        FsAttachmentStore::new(dir.path().join("attachments")),
    );
    (dir, manager)
}

fn write_source(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let outside = dir.path().join("outside");
    fs::create_dir_all(&outside).unwrap();
    let path = outside.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_passport_lifecycle() {
    let (dir, manager) = setup();
    let source = write_source(&dir, "p1.jpg", b"passport scan");

    // Stage, then attach.
    let stored = manager.ingest(&source, None).unwrap();
    assert_eq!(stored, "p1.jpg");
    let record = manager
        .create(DocumentDraft::new("Passport").with_principal(AttachmentInput::stored(&stored)))
        .unwrap();

    let all = manager.load_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], record);

    let renamed = manager
        .update(record.id, DocumentPatch::new().with_name("Passport Renewed"))
        .unwrap();
    assert_eq!(manager.find(record.id).unwrap().name, "Passport Renewed");
    assert_eq!(renamed.attachments, record.attachments);

    manager.delete(record.id).unwrap();
    assert!(manager.load_all().unwrap().is_empty());
    assert!(!manager.attachment_exists("p1.jpg"));
}

#[test]
fn test_index_file_shape() {
    let (dir, manager) = setup();
    let front = write_source(&dir, "front.jpg", b"f");
    let back = write_source(&dir, "back.jpg", b"b");
    manager
        .create(
            DocumentDraft::new("ID card")
                .with_reference_url("https://example.com/doc")
                .with_principal(AttachmentInput::import(&front))
                .with_secondary(AttachmentInput::import(&back)),
        )
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("index.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let doc = &value["documents"][0];

    assert_eq!(doc["name"], "ID card");
    assert_eq!(doc["referenceUrl"], "https://example.com/doc");
    assert_eq!(doc["archiveFlag"], false);
    assert_eq!(doc["attachments"], serde_json::json!(["front.jpg", "back.jpg"]));
    assert!(doc["creationTimestamp"].is_string());
    assert!(doc["expiryDate"].is_string());
}

#[test]
fn test_resave_is_byte_stable() {
    let (dir, manager) = setup();
    let source = write_source(&dir, "p1.jpg", b"x");
    manager
        .create(DocumentDraft::new("Passport").with_principal(AttachmentInput::import(&source)))
        .unwrap();

    let index = FsIndexStore::new(dir.path().join("index.json"));
    let before = fs::read(index.path()).unwrap();
    index.save_atomic(&index.load().unwrap()).unwrap();
    assert_eq!(fs::read(index.path()).unwrap(), before);
}

#[test]
fn test_colliding_ingests_keep_both_files() {
    let (dir, manager) = setup();
    let first = write_source(&dir, "scan.pdf", b"first");
    let second_dir = dir.path().join("elsewhere");
    fs::create_dir_all(&second_dir).unwrap();
    let second = second_dir.join("scan.pdf");
    fs::write(&second, b"second").unwrap();

    let a = manager.ingest(&first, None).unwrap();
    let b = manager.ingest(&second, None).unwrap();

    assert_ne!(a, b);
    assert_eq!(fs::read(manager.resolve(&a)).unwrap(), b"first");
    assert_eq!(fs::read(manager.resolve(&b)).unwrap(), b"second");
}

#[test]
fn test_delete_removes_every_attachment() {
    let (dir, manager) = setup();
    let front = write_source(&dir, "front.jpg", b"f");
    let back = write_source(&dir, "back.jpg", b"b");
    let record = manager
        .create(
            DocumentDraft::new("Licence")
                .with_principal(AttachmentInput::import(&front))
                .with_secondary(AttachmentInput::import(&back)),
        )
        .unwrap();

    manager.delete(record.id).unwrap();

    let files = FsAttachmentStore::new(dir.path().join("attachments"));
    assert!(files.list().unwrap().is_empty());
}

#[test]
fn test_replace_attachment_on_disk() {
    let (dir, manager) = setup();
    let old = write_source(&dir, "old.jpg", b"old");
    let new = write_source(&dir, "new.jpg", b"new");
    let record = manager
        .create(DocumentDraft::new("Passport").with_principal(AttachmentInput::import(&old)))
        .unwrap();

    manager
        .update(
            record.id,
            DocumentPatch::new()
                .with_attachment(AttachmentSlot::Principal, AttachmentInput::import(&new)),
        )
        .unwrap();

    assert!(!manager.attachment_exists("old.jpg"));
    assert_eq!(fs::read(manager.resolve("new.jpg")).unwrap(), b"new");
    assert!(manager.scan().unwrap().is_clean());
}

#[test]
fn test_principal_removal_without_secondary_is_rejected() {
    let (dir, manager) = setup();
    let source = write_source(&dir, "p1.jpg", b"x");
    let record = manager
        .create(DocumentDraft::new("Passport").with_principal(AttachmentInput::import(&source)))
        .unwrap();
    let before = fs::read(dir.path().join("index.json")).unwrap();

    let err = manager
        .remove_attachment(record.id, AttachmentSlot::Principal)
        .unwrap_err();

    assert!(matches!(
        err,
        DocsafeError::Validation(ValidationError::MissingPrincipal)
    ));
    assert_eq!(fs::read(dir.path().join("index.json")).unwrap(), before);
    assert!(manager.attachment_exists("p1.jpg"));
}

#[test]
fn test_corrupt_index_is_left_untouched() {
    let (dir, manager) = setup();
    let index_path = dir.path().join("index.json");
    fs::write(&index_path, "{\"documents\": [ {\"name\": 1} ]}").unwrap();
    let source = write_source(&dir, "p1.jpg", b"x");

    let err = manager
        .create(DocumentDraft::new("Passport").with_principal(AttachmentInput::import(&source)))
        .unwrap_err();

    assert!(matches!(err, DocsafeError::CorruptIndex { .. }));
    assert_eq!(
        fs::read_to_string(&index_path).unwrap(),
        "{\"documents\": [ {\"name\": 1} ]}"
    );
    // Nothing was staged either.
    assert!(!manager.attachment_exists("p1.jpg"));
}

#[test]
fn test_legacy_index_loads_and_is_rewritten_canonically() {
    let (dir, manager) = setup();
    fs::create_dir_all(dir.path().join("attachments")).unwrap();
    fs::write(dir.path().join("attachments").join("camera_1.jpg"), b"x").unwrap();
    fs::write(
        dir.path().join("index.json"),
        r#"{ "archivos": [ {
            "id_archivo": "0b6f6f4e-8d43-4c8b-9b53-0a1f0e7f4a10",
            "nombre": "Pasaporte",
            "descripcion": "",
            "url": "",
            "fecha_creacion": "2023-01-15T08:30:00.000Z",
            "expiryDate": "2030-01-15T08:30:00.000Z",
            "share": false,
            "imagenes": ["camera_1.jpg"]
        } ] }"#,
    )
    .unwrap();

    let records = manager.load_all().unwrap();
    assert_eq!(records.len(), 1);
    manager
        .update(records[0].id, DocumentPatch::new().with_name("Passport"))
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("index.json")).unwrap();
    assert!(raw.contains("\"documents\""));
    assert!(raw.contains("\"expiryDate\": \"2030-01-15\""));
    assert!(!raw.contains("archivos"));
}

#[test]
fn test_reopened_vault_sees_prior_writes() {
    let dir = TempDir::new().unwrap();
    init_vault(dir.path()).unwrap();
    let source = write_source(&dir, "p1.jpg", b"x");

    let id = {
        let ctx = open_vault(dir.path()).unwrap();
        ctx.manager
            .create(
                DocumentDraft::new("Passport").with_principal(AttachmentInput::import(&source)),
            )
            .unwrap()
            .id
    };

    let ctx = open_vault(dir.path()).unwrap();
    assert_eq!(ctx.manager.find(id).unwrap().name, "Passport");
    assert!(ctx.startup_report.unwrap().is_clean());
}
