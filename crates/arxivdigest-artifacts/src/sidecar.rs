//! JSON twin of a rendered artifact.
//!
//! The sidecar carries the exact records an artifact was rendered from, so
//! downstream stages never depend on reading text back out of the PDF.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use arxivdigest_common::{PaperRecord, SummarizedPaper};

use crate::error::ParseError;
use crate::naming::{ArtifactKind, SIDECAR_EXTENSION};

/// One paper as stored in a sidecar. `summary` is only present for summary
/// artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarPaper {
    #[serde(flatten)]
    pub record: PaperRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    pub kind: ArtifactKind,
    pub topic: String,
    pub generated_at: NaiveDateTime,
    pub papers: Vec<SidecarPaper>,
}

impl Sidecar {
    pub fn for_collection(topic: &str, generated_at: NaiveDateTime, records: &[PaperRecord]) -> Self {
        Self {
            kind: ArtifactKind::Collection,
            topic: topic.to_string(),
            generated_at,
            papers: records
                .iter()
                .map(|r| SidecarPaper { record: r.clone(), summary: None })
                .collect(),
        }
    }

    pub fn for_summary(topic: &str, generated_at: NaiveDateTime, papers: &[SummarizedPaper]) -> Self {
        Self {
            kind: ArtifactKind::Summary,
            topic: topic.to_string(),
            generated_at,
            papers: papers
                .iter()
                .map(|p| SidecarPaper { record: p.record.clone(), summary: Some(p.summary.clone()) })
                .collect(),
        }
    }

    pub fn records(&self) -> Vec<PaperRecord> {
        self.papers.iter().map(|p| p.record.clone()).collect()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// `<stem>.json` next to an artifact.
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    artifact.with_extension(SIDECAR_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_sidecar_path_swaps_extension() {
        let p = sidecar_path(Path::new("/out/arxiv_papers_06052024_0900_AI.pdf"));
        assert_eq!(p, PathBuf::from("/out/arxiv_papers_06052024_0900_AI.json"));
    }

    #[test]
    fn test_collection_sidecar_has_no_summary_field() {
        let r = PaperRecord::new("T", "A", "S", "Abs.", None);
        let json = String::from_utf8(Sidecar::for_collection("AI", at(), &[r]).to_json().unwrap()).unwrap();
        assert!(json.contains("\"kind\": \"collection\""));
        assert!(!json.contains("\"summary\""));
    }

    #[test]
    fn test_summary_sidecar_keeps_summaries() {
        let record = PaperRecord::new("T", "A", "S", "Abs.", None);
        let sidecar = Sidecar::for_summary(
            "AI",
            at(),
            &[SummarizedPaper { record: record.clone(), summary: "Short.".into() }],
        );
        let back: Sidecar = serde_json::from_slice(&sidecar.to_json().unwrap()).unwrap();
        assert_eq!(back.papers[0].summary.as_deref(), Some("Short."));
        assert_eq!(back.records(), vec![record]);
    }
}
