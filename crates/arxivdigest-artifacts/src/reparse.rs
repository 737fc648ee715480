//! Re-parsing collection artifacts back into paper records.
//!
//! The structured sidecar is authoritative. Artifacts without a usable
//! sidecar are read through their text layer: one line per paragraph, blank
//! lines between records. Each block is matched as
//!
//! ```text
//! <title>
//! Authors: <authors>
//! [<link>]
//! Subjects: <subjects>
//! <abstract...>
//! ```
//!
//! Blocks that do not fit (the header, summary records) are dropped.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use arxivdigest_common::text::{collapse_whitespace, strip_label};
use arxivdigest_common::PaperRecord;

use crate::error::ParseError;
use crate::layout::LayoutConfig;
use crate::naming::ArtifactKind;
use crate::pdf;
use crate::sidecar::{sidecar_path, Sidecar};

lazy_static! {
    static ref BLOCK_SPLIT_RE: Regex = Regex::new(r"\n[ \t]*\n").expect("block split regex");
    static ref RECORD_RE: Regex = Regex::new(
        r"(?s)^(?P<title>.+?)\n(?P<authors>Authors:.*?)\n(?P<subjects>Subjects:.*?)\n(?P<abstract>.+)$"
    )
    .expect("record regex");
    static ref LINK_RE: Regex = Regex::new(r"https?://arxiv\.org/\S+").expect("link regex");
}

/// Extract records from artifact text. Never fails; unmatched blocks are
/// omitted.
pub fn reparse(text: &str) -> Vec<PaperRecord> {
    let normalised = text.replace("\r\n", "\n");
    let mut records = Vec::new();

    for block in BLOCK_SPLIT_RE.split(&normalised) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        match parse_block(block) {
            Some(record) => records.push(record),
            None => debug!(block_len = block.len(), "Text block does not match record layout"),
        }
    }
    records
}

fn parse_block(block: &str) -> Option<PaperRecord> {
    let caps = RECORD_RE.captures(block)?;
    let title = collapse_whitespace(&caps["title"]);
    let authors_span = &caps["authors"];
    let subjects_span = &caps["subjects"];

    let link = LINK_RE
        .find(authors_span)
        .or_else(|| LINK_RE.find(subjects_span))
        .map(|m| m.as_str().to_string());

    let authors = match &link {
        Some(l) => authors_span.replace(l.as_str(), ""),
        None => authors_span.to_string(),
    };
    let authors = collapse_whitespace(&strip_label(&authors, "Authors:"));
    let subjects = collapse_whitespace(&strip_label(subjects_span, "Subjects:"));
    let abstract_text = collapse_whitespace(&caps["abstract"]);

    Some(PaperRecord::new(title, authors, subjects, abstract_text, link))
}

/// Records of a collection artifact: sidecar first, text layer as fallback.
///
/// `layout` must be the one the artifact was rendered with; it decides where
/// one record ends in the text layer. An unreadable PDF with no usable
/// sidecar is an error; the caller decides whether that skips the topic.
pub fn load_records(artifact: &Path, layout: &LayoutConfig) -> Result<Vec<PaperRecord>, ParseError> {
    let json = sidecar_path(artifact);
    if json.exists() {
        match Sidecar::load(&json) {
            Ok(sidecar) if sidecar.kind == ArtifactKind::Collection => {
                debug!(path = %json.display(), papers = sidecar.papers.len(), "Loaded records from sidecar");
                return Ok(sidecar.records());
            }
            Ok(sidecar) => {
                return Err(ParseError::KindMismatch {
                    expected: ArtifactKind::Collection.to_string(),
                    found: sidecar.kind.to_string(),
                });
            }
            Err(e) => {
                warn!(path = %json.display(), error = %e, "Unreadable sidecar; falling back to text re-parse");
            }
        }
    }

    let text = pdf::extract_text_from_path(artifact, layout)?;
    let records = reparse(&text);
    info!(path = %artifact.display(), papers = records.len(), "Re-parsed artifact text");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEXT: &str = "ArXiv Papers: AI\nGenerated on: 2024-01-02 09:00\nContains 2 papers\n\n\
First Title\nAuthors: Ada Lovelace\nhttps://arxiv.org/abs/2401.00001\nSubjects: Artificial Intelligence (cs.AI)\nAbstract one. Continues.\n\n\
Second Title\nAuthors: Alan Turing\nSubjects: Machine Learning (cs.LG)\nAbstract two.\nMore abstract.\n";

    #[test]
    fn test_reparse_skips_header_and_reads_records() {
        let records = reparse(TEXT);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "First Title");
        assert_eq!(records[0].authors, "Ada Lovelace");
        assert_eq!(records[0].subjects, "Artificial Intelligence (cs.AI)");
        assert_eq!(records[0].abstract_text, "Abstract one. Continues.");
        assert_eq!(records[0].link.as_deref(), Some("https://arxiv.org/abs/2401.00001"));
        assert_eq!(records[0].paper_id.as_deref(), Some("2401.00001"));

        assert_eq!(records[1].link, None);
        assert_eq!(records[1].abstract_text, "Abstract two. More abstract.");
    }

    #[test]
    fn test_link_without_abs_marker_has_no_id() {
        let text = "T\nAuthors: A\nhttps://arxiv.org/pdf/1\nSubjects: S\nAbs.";
        let records = reparse(text);
        assert_eq!(records[0].link.as_deref(), Some("https://arxiv.org/pdf/1"));
        assert_eq!(records[0].paper_id, None);
    }

    #[test]
    fn test_unmatched_text_yields_nothing() {
        assert!(reparse("").is_empty());
        assert!(reparse("just a heading\n\nand some prose").is_empty());
    }

    #[test]
    fn test_summary_sidecar_is_rejected_as_collection() {
        use crate::sidecar::Sidecar;
        use chrono::NaiveDate;

        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("arxiv_summary_01012024_0900_AI.pdf");
        let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let sidecar = Sidecar::for_summary("AI", at, &[]);
        std::fs::write(sidecar_path(&pdf_path), sidecar.to_json().unwrap()).unwrap();

        assert!(matches!(load_records(&pdf_path, &LayoutConfig::default()), Err(ParseError::KindMismatch { .. })));
    }
}
