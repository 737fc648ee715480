//! Artifact error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Markup error at byte {offset}: {message}")]
    Markup { offset: usize, message: String },

    #[error("Artifact already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Invalid layout: {0}")]
    Layout(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Sidecar error: {0}")]
    Sidecar(#[from] serde_json::Error),

    #[error("Expected a {expected} artifact, found {found}")]
    KindMismatch { expected: String, found: String },
}
