//! Extension-based MIME lookup for knowledge-base ingestion.

use std::path::Path;

use crate::models::DEFAULT_MIME_TYPE;

const MIME_TABLE: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("doc", "application/msword"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("rtf", "application/rtf"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("xls", "application/vnd.ms-excel"),
];

/// MIME type for a bare extension, case-insensitive and without the dot.
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    MIME_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// MIME type for a file path; unknown or missing extensions map to
/// `application/octet-stream`.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(mime_type_for_extension)
        .unwrap_or(DEFAULT_MIME_TYPE)
}
