//! arxivdigest-artifacts: Rendered PDF artifacts and everything that reads them back.
//!
//! - Artifact naming grammar (kind, timestamp, topic)
//! - Paragraph layout and PDF writing
//! - JSON sidecars carrying the structured records
//! - Catalog of the latest artifact per topic
//! - Text re-parsing of collection artifacts (sidecar fallback)

pub mod catalog;
pub mod error;
pub mod layout;
pub mod naming;
pub mod pdf;
pub mod render;
pub mod reparse;
pub mod sidecar;

pub use catalog::list_latest_per_topic;
pub use error::{ParseError, RenderError};
pub use layout::LayoutConfig;
pub use naming::{ArtifactKind, ArtifactName};
pub use render::{ArtifactContent, ArtifactRenderer};
pub use reparse::{load_records, reparse};
pub use sidecar::Sidecar;
