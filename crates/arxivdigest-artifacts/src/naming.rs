//! Artifact file-name grammar.
//!
//! `{arxiv_papers|arxiv_summary}_{ddMMyyyy}_{HHmm}_{topic}.pdf`
//!
//! The topic token may itself contain underscores (they stand for spaces),
//! so decoding anchors on the fixed prefix and the two fixed-width numeric
//! groups instead of splitting on `_`.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const ARTIFACT_EXTENSION: &str = "pdf";
pub const SIDECAR_EXTENSION: &str = "json";

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(
        r"^(arxiv_papers|arxiv_summary)_(\d{2})(\d{2})(\d{4})_(\d{2})(\d{2})_(.+)\.pdf$"
    )
    .expect("artifact name regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Collection,
    Summary,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Collection => "arxiv_papers",
            ArtifactKind::Summary    => "arxiv_summary",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Collection => "collection",
            ArtifactKind::Summary    => "summary",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "arxiv_papers"  => Some(ArtifactKind::Collection),
            "arxiv_summary" => Some(ArtifactKind::Summary),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded (or to-be-encoded) artifact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub kind: ArtifactKind,
    /// Minute granularity; seconds are dropped on construction.
    pub timestamp: NaiveDateTime,
    /// Human form of the topic (spaces, not underscores).
    pub topic: String,
}

impl ArtifactName {
    pub fn new(kind: ArtifactKind, topic: &str, timestamp: NaiveDateTime) -> Self {
        let timestamp = timestamp
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(timestamp);
        Self { kind, timestamp, topic: topic.trim().to_string() }
    }

    /// `ddMMyyyy_HHmm`
    pub fn encoded_timestamp(&self) -> String {
        self.timestamp.format("%d%m%Y_%H%M").to_string()
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.kind.prefix(),
            self.encoded_timestamp(),
            encode_topic(&self.topic),
            ARTIFACT_EXTENSION
        )
    }

    pub fn sidecar_file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.kind.prefix(),
            self.encoded_timestamp(),
            encode_topic(&self.topic),
            SIDECAR_EXTENSION
        )
    }

    /// Decode a file name. Returns `None` for anything that does not follow
    /// the grammar or carries an impossible date.
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = NAME_RE.captures(file_name)?;
        let kind = ArtifactKind::from_prefix(&caps[1])?;
        let num = |i: usize| caps[i].parse::<u32>().ok();
        let date = NaiveDate::from_ymd_opt(num(4)? as i32, num(3)?, num(2)?)?;
        let timestamp = date.and_hms_opt(num(5)?, num(6)?, 0)?;
        Some(Self {
            kind,
            timestamp,
            topic: decode_topic(&caps[7]),
        })
    }
}

/// Whitespace becomes `_`; path separators become `-` so the topic can never
/// escape the output directory.
pub fn encode_topic(topic: &str) -> String {
    topic
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '/' | '\\' => '-',
            c => c,
        })
        .collect()
}

pub fn decode_topic(token: &str) -> String {
    token.replace('_', " ")
}
