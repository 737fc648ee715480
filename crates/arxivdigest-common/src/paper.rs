//! Paper records as they move through a pipeline run.
//!
//! Records are created either by the listing extractor or by the artifact
//! re-parser, are never mutated afterwards, and are not persisted except
//! through the artifacts rendered from them.

use serde::{Deserialize, Serialize};

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const AUTHORS_NOT_FOUND: &str = "Authors not found";
pub const SUBJECTS_NOT_FOUND: &str = "Subjects not found";
pub const ABSTRACT_NOT_FOUND: &str = "Abstract not found";

/// Marker that must appear in a link for a paper id to be derived from it.
const ABS_PATH_MARKER: &str = "/abs/";

/// One listed paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    /// Free text, exactly as listed (not split into names).
    pub authors: String,
    /// Free-text taxonomy line, e.g. "Machine Learning (cs.LG); Artificial Intelligence (cs.AI)".
    pub subjects: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub paper_id: Option<String>,
}

impl PaperRecord {
    /// Build a record, substituting placeholders for empty fields and deriving
    /// `paper_id` from the link.
    pub fn new(
        title: impl Into<String>,
        authors: impl Into<String>,
        subjects: impl Into<String>,
        abstract_text: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        let link = link.filter(|l| !l.trim().is_empty());
        let paper_id = link.as_deref().and_then(paper_id_from_link);
        Self {
            title: or_placeholder(title.into(), TITLE_NOT_FOUND),
            authors: or_placeholder(authors.into(), AUTHORS_NOT_FOUND),
            subjects: or_placeholder(subjects.into(), SUBJECTS_NOT_FOUND),
            abstract_text: or_placeholder(abstract_text.into(), ABSTRACT_NOT_FOUND),
            link,
            paper_id,
        }
    }
}

fn or_placeholder(value: String, placeholder: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Final path segment of an arXiv abstract URL, e.g. `2401.01234v2`.
/// Links without the `/abs/` marker yield `None`.
pub fn paper_id_from_link(link: &str) -> Option<String> {
    if !link.contains(ABS_PATH_MARKER) {
        return None;
    }
    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(String::from)
}

/// A record paired with the summary text generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedPaper {
    #[serde(flatten)]
    pub record: PaperRecord,
    pub summary: String,
}
