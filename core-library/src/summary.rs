//! Summary statistics over a set of descriptors.

use std::collections::BTreeMap;

use crate::models::DocumentDescriptor;

/// Count and total size of one document library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub count: usize,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub total: usize,
    pub total_size: u64,
    pub libraries: BTreeMap<String, LibraryStats>,
    /// Lowercased extension to file count
    pub file_types: BTreeMap<String, usize>,
}

impl DocumentSummary {
    pub fn from_documents(documents: &[DocumentDescriptor]) -> Self {
        let mut summary = Self {
            total: documents.len(),
            ..Self::default()
        };

        for doc in documents {
            let library = summary
                .libraries
                .entry(doc.library_name.clone())
                .or_default();
            library.count += 1;
            library.size_bytes += doc.size_bytes;

            summary.total_size += doc.size_bytes;

            if let Some(ext) = doc.extension() {
                *summary.file_types.entry(ext).or_default() += 1;
            }
        }

        summary
    }

    /// The `n` most common extensions, most frequent first; ties break by name.
    pub fn top_file_types(&self, n: usize) -> Vec<(&str, usize)> {
        let mut types: Vec<(&str, usize)> = self
            .file_types
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        types.truncate(n);
        types
    }
}

/// Human-readable size with binary units, e.g. `1.50 MB`.
pub fn format_file_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if size_bytes < 1024 {
        return format!("{} B", size_bytes);
    }

    let mut value = size_bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}
