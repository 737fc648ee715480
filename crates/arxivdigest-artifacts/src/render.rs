//! Artifact renderer: records → story → paginated PDF + JSON sidecar.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use arxivdigest_common::{PaperRecord, SummarizedPaper};

use crate::error::RenderError;
use crate::layout::{escape_markup, paginate, Block, LayoutConfig};
use crate::naming::{ArtifactKind, ArtifactName};
use crate::pdf;
use crate::sidecar::{sidecar_path, Sidecar};

/// What goes into an artifact.
#[derive(Debug, Clone, Copy)]
pub enum ArtifactContent<'a> {
    Collection(&'a [PaperRecord]),
    Summary(&'a [SummarizedPaper]),
}

impl ArtifactContent<'_> {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactContent::Collection(_) => ArtifactKind::Collection,
            ArtifactContent::Summary(_) => ArtifactKind::Summary,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArtifactContent::Collection(r) => r.len(),
            ArtifactContent::Summary(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stateless apart from its layout; safe to share across worker tasks.
#[derive(Debug, Clone, Default)]
pub struct ArtifactRenderer {
    layout: LayoutConfig,
}

impl ArtifactRenderer {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Render one artifact into `output_dir`.
    ///
    /// Returns `Ok(None)` when there is nothing to render. Never replaces an
    /// existing artifact: a name collision is a [`RenderError::AlreadyExists`].
    #[instrument(skip(self, content, output_dir), fields(kind = %content.kind(), papers = content.len()))]
    pub fn render(
        &self,
        topic: &str,
        content: ArtifactContent<'_>,
        output_dir: &Path,
        generated_at: NaiveDateTime,
    ) -> Result<Option<PathBuf>, RenderError> {
        if content.is_empty() {
            info!(topic, "No papers to render; skipping artifact");
            return Ok(None);
        }

        self.layout.validate()?;
        fs::create_dir_all(output_dir)?;

        let name = ArtifactName::new(content.kind(), topic, generated_at);
        let pdf_path = output_dir.join(name.file_name());
        let json_path = sidecar_path(&pdf_path);
        if pdf_path.exists() || json_path.exists() {
            return Err(RenderError::AlreadyExists(pdf_path));
        }

        // Lay out first so markup errors surface before anything touches disk.
        let blocks = self.story(topic, content, generated_at);
        let pages = paginate(&blocks, &self.layout)?;
        let mut doc = pdf::build_document(&pages, &self.layout, &header_title(content.kind(), topic))?;

        let sidecar = match content {
            ArtifactContent::Collection(records) => Sidecar::for_collection(topic, name.timestamp, records),
            ArtifactContent::Summary(papers) => Sidecar::for_summary(topic, name.timestamp, papers),
        };
        let mut json_tmp = NamedTempFile::new_in(output_dir)?;
        json_tmp.write_all(&sidecar.to_json()?)?;
        json_tmp.as_file().sync_all()?;
        persist_new(json_tmp, &json_path)?;

        let pdf_result = write_pdf(&mut doc, output_dir, &pdf_path);
        if let Err(e) = pdf_result {
            warn!(topic, error = %e, "PDF write failed; removing sidecar");
            if let Err(rm) = fs::remove_file(&json_path) {
                debug!(path = %json_path.display(), error = %rm, "Could not remove orphaned sidecar");
            }
            return Err(e);
        }

        info!(
            topic,
            path = %pdf_path.display(),
            pages = pages.len(),
            "Rendered artifact"
        );
        Ok(Some(pdf_path))
    }

    /// The ordered flowables for an artifact.
    pub fn story(&self, topic: &str, content: ArtifactContent<'_>, generated_at: NaiveDateTime) -> Vec<Block> {
        let l = &self.layout;
        let kind = content.kind();
        let spacer = match kind {
            ArtifactKind::Collection => l.collection_spacer,
            ArtifactKind::Summary => l.summary_spacer,
        };
        let count_line = match kind {
            ArtifactKind::Collection => format!("Contains {} papers", content.len()),
            ArtifactKind::Summary => format!("Contains summaries of {} papers", content.len()),
        };

        let mut blocks = vec![
            Block::paragraph(escape_markup(&header_title(kind, topic)), &l.heading),
            Block::paragraph(
                format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M")),
                &l.normal,
            ),
            Block::paragraph(count_line, &l.normal),
            Block::Spacer(l.header_spacer),
        ];

        match content {
            ArtifactContent::Collection(records) => {
                for record in records {
                    self.push_record_head(&mut blocks, record);
                    blocks.push(Block::paragraph(
                        format!("Subjects: {}", escape_markup(&record.subjects)),
                        &l.body,
                    ));
                    blocks.push(Block::paragraph(escape_markup(&record.abstract_text), &l.body));
                    blocks.push(Block::Spacer(spacer));
                }
            }
            ArtifactContent::Summary(papers) => {
                for paper in papers {
                    self.push_record_head(&mut blocks, &paper.record);
                    blocks.push(Block::paragraph("Summary:", &l.section));
                    blocks.push(Block::paragraph(escape_markup(&paper.summary), &l.body));
                    blocks.push(Block::Spacer(spacer));
                }
            }
        }
        blocks
    }

    fn push_record_head(&self, blocks: &mut Vec<Block>, record: &PaperRecord) {
        let l = &self.layout;
        blocks.push(Block::paragraph(escape_markup(&record.title), &l.paper_title));
        blocks.push(Block::paragraph(
            format!("Authors: {}", escape_markup(&record.authors)),
            &l.italic,
        ));
        if let Some(link) = &record.link {
            let link = escape_markup(link);
            blocks.push(Block::paragraph(format!("<link href='{link}'>{link}</link>"), &l.link));
        }
    }
}

fn header_title(kind: ArtifactKind, topic: &str) -> String {
    match kind {
        ArtifactKind::Collection => format!("ArXiv Papers: {topic}"),
        ArtifactKind::Summary => format!("ArXiv Papers Summary: {topic}"),
    }
}

fn write_pdf(doc: &mut lopdf::Document, dir: &Path, target: &Path) -> Result<(), RenderError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    pdf::write_document(doc, &mut tmp)?;
    tmp.as_file().sync_all()?;
    persist_new(tmp, target)
}

fn persist_new(tmp: NamedTempFile, target: &Path) -> Result<(), RenderError> {
    match tmp.persist_noclobber(target) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            Err(RenderError::AlreadyExists(target.to_path_buf()))
        }
        Err(e) => Err(RenderError::Io(e.error)),
    }
}
