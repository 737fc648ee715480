//! Topics: case-insensitive substring filters over a paper's subjects line.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the topic occurs anywhere in `subjects`, ignoring case.
    pub fn matches(&self, subjects: &str) -> bool {
        subjects.to_lowercase().contains(&self.0.to_lowercase())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Topic::new(s)
    }
}

/// Parse a newline-delimited topics list. Blank lines are ignored.
pub fn parse_topics(content: &str) -> Vec<Topic> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Topic::new)
        .collect()
}

/// Read and parse a topics file.
pub fn load_topics(path: &Path) -> std::io::Result<Vec<Topic>> {
    let content = std::fs::read_to_string(path)?;
    let topics = parse_topics(&content);
    tracing::debug!(path = %path.display(), n = topics.len(), "Topics loaded");
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_match_is_case_insensitive() {
        let t = Topic::new("machine learning");
        assert!(t.matches("Machine Learning (cs.LG); Robotics (cs.RO)"));
        assert!(!t.matches("Computation and Language (cs.CL)"));
    }

    #[test]
    fn test_parse_topics_skips_blank_lines() {
        let topics = parse_topics("Machine Learning\n\n   \n  Information Retrieval  \n");
        assert_eq!(
            topics,
            vec![Topic::new("Machine Learning"), Topic::new("Information Retrieval")]
        );
    }

    #[test]
    fn test_load_topics_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.txt");
        std::fs::write(&path, "Artificial Intelligence\r\nNeural and Evolutionary Computing\n").unwrap();
        let topics = load_topics(&path).unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].as_str(), "Artificial Intelligence");
    }
}
