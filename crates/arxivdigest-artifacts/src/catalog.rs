//! Artifact catalog: latest artifact of a kind per topic.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::naming::{ArtifactKind, ArtifactName};

/// Every artifact of `kind` in `directory` whose name decodes, in no
/// particular order. A missing or unreadable directory yields an empty list.
pub fn list_artifacts(directory: &Path, kind: ArtifactKind) -> Vec<(ArtifactName, PathBuf)> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %directory.display(), error = %e, "Cannot read artifact directory");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match ArtifactName::parse(file_name) {
            Some(name) if name.kind == kind => found.push((name, path)),
            Some(_) => {}
            None => debug!(file = file_name, "Skipping file that is not an artifact"),
        }
    }
    found
}

/// Map each topic to its most recent artifact of `kind`.
///
/// Ordering is by the decoded calendar timestamp; equal timestamps fall back
/// to the file name so the choice is deterministic.
pub fn list_latest_per_topic(directory: &Path, kind: ArtifactKind) -> BTreeMap<String, PathBuf> {
    let mut latest: BTreeMap<String, (NaiveDateTime, PathBuf)> = BTreeMap::new();

    for (name, path) in list_artifacts(directory, kind) {
        let newer = match latest.get(&name.topic) {
            None => true,
            Some((ts, existing)) => (name.timestamp, &path) > (*ts, existing),
        };
        if newer {
            latest.insert(name.topic, (name.timestamp, path));
        }
    }

    latest.into_iter().map(|(topic, (_, path))| (topic, path)).collect()
}
