//! Snapshot save/load against a real temporary directory.

use bridge_desktop::TokioFileSystem;
use chrono::{Duration, TimeZone, Utc};
use core_library::{load_snapshot, save_snapshot, DocumentDescriptor, LibraryError};

// =============================================================================
// Fixtures
// =============================================================================

fn sample_documents() -> Vec<DocumentDescriptor> {
    let created = Utc.with_ymd_and_hms(2023, 3, 14, 9, 26, 53).unwrap();

    let mut plan = DocumentDescriptor::new("Roadmap: 2024?.pptx", "b!drive-1", "01ABC");
    plan.library_name = "Documents".into();
    plan.folder_path = "Strategy/Drafts".into();
    plan.size_bytes = 1_048_576;
    plan.created_at = Some(created);
    plan.modified_at = Some(created + Duration::days(30) + Duration::nanoseconds(500));
    plan.mime_type =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation".into();
    plan.direct_download_url = Some("https://contoso.sharepoint.com/_layouts/15/download.aspx?x=1".into());
    plan.web_url = Some("https://contoso.sharepoint.com/sites/S/Roadmap.pptx".into());
    plan.discovered_at = Some(created + Duration::days(31));

    let mut minimal = DocumentDescriptor::new("notes.txt", "b!drive-2", "01XYZ");
    minimal.library_name = "Shared Notes".into();

    let mut unicode = DocumentDescriptor::new("Résumé – final.docx", "b!drive-2", "01UNI");
    unicode.library_name = "Personnel".into();
    unicode.folder_path = "HR/2024".into();
    unicode.size_bytes = 42;

    vec![plan, minimal, unicode]
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_save_then_load_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sharepoint_documents.json");
    let fs = TokioFileSystem::new();
    let docs = sample_documents();

    save_snapshot(&fs, &path, &docs).await.unwrap();
    let loaded = load_snapshot(&fs, &path).await.unwrap();

    assert_eq!(loaded, docs);
}

#[tokio::test]
async fn test_saved_file_is_wrapped_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let fs = TokioFileSystem::new();

    save_snapshot(&fs, &path, &sample_documents()).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["total_documents"], 3);
    assert_eq!(value["documents"][0]["safe_name"], "Roadmap_ 2024_.pptx");
    assert_eq!(value["documents"][1]["download_url"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_load_legacy_bare_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "a.pdf", "safe_name": "a.pdf", "id": "1", "unique_id": "1",
             "drive_id": "d", "library": "Documents", "path": "", "size": 10,
             "created": "2024-01-01T00:00:00Z", "modified": "2024-01-02T00:00:00Z",
             "download_url": "https://x/y", "web_url": "https://x/z",
             "mime_type": "application/pdf"}
        ]"#,
    )
    .unwrap();

    let docs = load_snapshot(&TokioFileSystem::new(), &path).await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].size_bytes, 10);
    assert_eq!(docs[0].direct_download_url.as_deref(), Some("https://x/y"));
    assert!(docs[0].discovered_at.is_none());
}

#[tokio::test]
async fn test_empty_urls_survive_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty_urls.json");
    let fs = TokioFileSystem::new();

    let mut doc = DocumentDescriptor::new("memo.txt", "b!drive-3", "01EMP");
    doc.library_name = "Documents".into();
    doc.web_url = Some(String::new());
    doc.direct_download_url = Some(String::new());
    let docs = vec![doc];

    save_snapshot(&fs, &path, &docs).await.unwrap();
    let loaded = load_snapshot(&fs, &path).await.unwrap();

    assert_eq!(loaded, docs);
}

#[tokio::test]
async fn test_load_rejects_traversal_in_safe_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edited.json");
    std::fs::write(
        &path,
        r#"[{"name": "a.pdf", "safe_name": "../../escape.pdf", "id": "1",
             "drive_id": "d", "library": "Docs"}]"#,
    )
    .unwrap();

    let docs = load_snapshot(&TokioFileSystem::new(), &path).await.unwrap();

    assert_eq!(docs.len(), 1);
    assert!(!docs[0].safe_name.contains('/'));
    assert_ne!(docs[0].safe_name, "..");
}

#[tokio::test]
async fn test_load_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_snapshot(&TokioFileSystem::new(), &dir.path().join("none.json"))
        .await
        .unwrap_err();

    assert!(matches!(err, LibraryError::Bridge(_)));
}

#[tokio::test]
async fn test_load_malformed_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = load_snapshot(&TokioFileSystem::new(), &path).await.unwrap_err();

    match err {
        LibraryError::InvalidSnapshot { path: p, .. } => assert!(p.ends_with("broken.json")),
        other => panic!("unexpected error: {other:?}"),
    }
}
