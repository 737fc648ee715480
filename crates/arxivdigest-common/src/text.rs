//! Small text normalisation helpers shared by the extractor and re-parser.

/// Collapse every run of whitespace (including newlines) into one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every occurrence of a field label such as `"Authors:"` and trim.
pub fn strip_label(s: &str, label: &str) -> String {
    s.replace(label, "").trim().to_string()
}
