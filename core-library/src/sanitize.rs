//! Filesystem-safe names for downloaded documents.

/// Returned for names that are empty or consist only of stripped characters.
pub const UNKNOWN_FILE: &str = "unknown_file";

/// Upper bound for a sanitized name, extension included, in characters.
pub const MAX_FILENAME_LEN: usize = 200;

const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn is_edge_junk(c: char) -> bool {
    c == '.' || c.is_whitespace()
}

/// Turn an arbitrary remote name into one that is safe on every desktop
/// filesystem.
///
/// Reserved characters become `_`, leading and trailing dots and whitespace
/// are removed, and overlong names lose characters from the end of the stem
/// so the extension survives.
///
/// ```
/// use core_library::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c"), "a_b_c");
/// assert_eq!(sanitize_filename("  .report.pdf. "), "report.pdf");
/// assert_eq!(sanitize_filename(""), "unknown_file");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    if name.trim().is_empty() {
        return UNKNOWN_FILE.to_string();
    }

    let replaced: String = name
        .chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect();

    let trimmed = replaced.trim_matches(is_edge_junk);
    if trimmed.is_empty() {
        return UNKNOWN_FILE.to_string();
    }

    truncate_preserving_extension(trimmed)
}

fn truncate_preserving_extension(name: &str) -> String {
    let len = name.chars().count();
    if len <= MAX_FILENAME_LEN {
        return name.to_string();
    }

    if let Some(dot) = name.rfind('.') {
        let (stem, extension) = name.split_at(dot);
        let ext_len = extension.chars().count();
        if dot > 0 && ext_len < MAX_FILENAME_LEN {
            let keep: String = stem.chars().take(MAX_FILENAME_LEN - ext_len).collect();
            return format!("{}{}", keep, extension);
        }
    }

    // No usable extension: cut and re-trim so the result is stable
    let cut: String = name.chars().take(MAX_FILENAME_LEN).collect();
    let cut = cut.trim_end_matches(is_edge_junk);
    if cut.is_empty() {
        UNKNOWN_FILE.to_string()
    } else {
        cut.to_string()
    }
}

/// Sanitize every component of a slash-separated folder path.
///
/// Empty components are dropped, so `/Reports//2024/` yields
/// `["Reports", "2024"]`. A component such as `..` sanitizes to
/// [`UNKNOWN_FILE`] and can never climb out of the destination root.
pub fn sanitize_folder_path(folder_path: &str) -> Vec<String> {
    folder_path
        .split(['/', '\\'])
        .filter(|component| !component.trim().is_empty())
        .map(sanitize_filename)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<String> {
        let mut samples: Vec<String> = [
            "",
            "   ",
            "report.pdf",
            "a/b:c",
            "<>:\"/\\|?*",
            "...",
            " . ",
            "  .hidden.txt. ",
            "Q3 results: draft?.docx",
            "tab\tinside.txt",
            "naïve façade.pptx",
            "..\\..\\etc\\passwd",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        samples.push("x".repeat(250));
        samples.push(format!("{}.pdf", "y".repeat(300)));
        samples.push(format!("{}. .txt", "z".repeat(300)));
        samples.push(format!("a.{}", "e".repeat(260)));
        samples.push(format!("{}{}", "w".repeat(199), ". trailing"));
        samples.push(format!("{}.docx", "é".repeat(220)));
        samples
    }

    #[test]
    fn test_empty_and_blank_become_sentinel() {
        assert_eq!(sanitize_filename(""), UNKNOWN_FILE);
        assert_eq!(sanitize_filename(" \t\n"), UNKNOWN_FILE);
        assert_eq!(sanitize_filename("..."), UNKNOWN_FILE);
        assert_eq!(sanitize_filename(" . "), UNKNOWN_FILE);
    }

    #[test]
    fn test_reserved_characters_replaced() {
        assert_eq!(sanitize_filename("a/b:c"), "a_b_c");
        assert_eq!(sanitize_filename("<>:\"/\\|?*"), "_________");
        assert_eq!(
            sanitize_filename("Q3 results: draft?.docx"),
            "Q3 results_ draft_.docx"
        );
    }

    #[test]
    fn test_edges_trimmed() {
        assert_eq!(sanitize_filename("  .hidden.txt. "), "hidden.txt");
    }

    #[test]
    fn test_long_name_keeps_extension() {
        let name = format!("{}.pdf", "y".repeat(300));
        let sanitized = sanitize_filename(&name);

        assert_eq!(sanitized.chars().count(), MAX_FILENAME_LEN);
        assert!(sanitized.ends_with(".pdf"));
        assert!(sanitized.starts_with("yyy"));
    }

    #[test]
    fn test_long_name_without_extension() {
        let sanitized = sanitize_filename(&"x".repeat(250));
        assert_eq!(sanitized, "x".repeat(MAX_FILENAME_LEN));
    }

    #[test]
    fn test_multibyte_names_counted_in_characters() {
        let sanitized = sanitize_filename(&format!("{}.docx", "é".repeat(220)));
        assert_eq!(sanitized.chars().count(), MAX_FILENAME_LEN);
        assert!(sanitized.ends_with(".docx"));
    }

    #[test]
    fn test_invariants_hold_for_samples() {
        for sample in samples() {
            let once = sanitize_filename(&sample);

            assert!(!once.is_empty(), "empty output for {sample:?}");
            assert!(
                !once.contains(RESERVED),
                "reserved char survived in {once:?}"
            );
            assert!(
                once.chars().count() <= MAX_FILENAME_LEN,
                "too long for {sample:?}"
            );
            assert_eq!(sanitize_filename(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        for sample in samples() {
            assert_eq!(sanitize_filename(&sample), sanitize_filename(&sample));
        }
    }

    #[test]
    fn test_folder_path_components() {
        assert_eq!(
            sanitize_folder_path("/Reports//2024: Q1/"),
            vec!["Reports".to_string(), "2024_ Q1".to_string()]
        );
        assert!(sanitize_folder_path("").is_empty());
        assert_eq!(
            sanitize_folder_path("../secrets"),
            vec![UNKNOWN_FILE.to_string(), "secrets".to_string()]
        );
    }
}
