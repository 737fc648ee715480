//! PDF object writing and layout-aware text extraction (lopdf).
//!
//! Every placed paragraph becomes one text object (`BT … ET`) whose lines are
//! separated by `T*`. Extraction walks the content streams in page order and
//! turns each text object back into one line of text, inserting a blank line
//! wherever the vertical gap to the previous line is wider than any gap
//! between paragraphs of the same record. Both thresholds come from the
//! [`LayoutConfig`] the document was rendered with.

use std::io::Write;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{ParseError, RenderError};
use crate::layout::{FontFace, LayoutConfig, Page, PlacedParagraph};

// ── Writing ─────────────────────────────────────────────────────────────────

/// Assemble a document from paginated content.
pub fn build_document(pages: &[Page], config: &LayoutConfig, title: &str) -> Result<Document, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content { operations: page_operations(page) };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        let annots = link_annotations(&mut doc, page);
        if !annots.is_empty() {
            page_dict.set("Annots", annots);
        }
        kids.push(doc.add_object(page_dict).into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(config.page_width),
                Object::Integer(config.page_height),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_latin1(title)),
        "Producer" => Object::string_literal("arxivdigest"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    Ok(doc)
}

/// Compress streams and serialise the document.
pub fn write_document<W: Write>(doc: &mut Document, out: &mut W) -> Result<(), RenderError> {
    doc.compress();
    doc.save_to(out)?;
    Ok(())
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::new();
    for para in &page.paragraphs {
        ops.extend(paragraph_operations(para));
    }
    ops
}

fn paragraph_operations(para: &PlacedParagraph) -> Vec<Operation> {
    let style = &para.style;
    let [r, g, b] = style.color.unwrap_or([0, 0, 0]);

    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![style.font.resource_name().into(), Object::Integer(style.size)]),
        Operation::new("rg", vec![Object::Integer(r), Object::Integer(g), Object::Integer(b)]),
        Operation::new("TL", vec![Object::Integer(style.leading)]),
        Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Integer(para.x),
                Object::Integer(para.y),
            ],
        ),
    ];
    for (i, line) in para.lines.iter().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("Tj", vec![Object::string_literal(encode_latin1(line))]));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn link_annotations(doc: &mut Document, page: &Page) -> Vec<Object> {
    let mut annots = Vec::new();
    for link in page.paragraphs.iter().filter_map(|p| p.link.as_ref()) {
        let id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => link.rect.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
            "A" => dictionary! {
                "S" => "URI",
                "URI" => Object::string_literal(encode_latin1(&link.href)),
            },
        });
        annots.push(id.into());
    }
    annots
}

/// Standard Type1 fonts with WinAnsi encoding cover Latin-1; anything outside
/// it is replaced with `?`.
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

// ── Extraction ──────────────────────────────────────────────────────────────

pub fn extract_text(bytes: &[u8], layout: &LayoutConfig) -> Result<String, ParseError> {
    let doc = Document::load_mem(bytes)?;
    extract_document_text(&doc, layout)
}

pub fn extract_text_from_path(path: &Path, layout: &LayoutConfig) -> Result<String, ParseError> {
    let doc = Document::load(path)?;
    extract_document_text(&doc, layout)
}

/// One line per text object, blank lines at wide vertical gaps.
pub fn extract_document_text(doc: &Document, layout: &LayoutConfig) -> Result<String, ParseError> {
    let geometry = layout.break_geometry();
    let mut out = String::new();

    for (_page_no, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id)?)?;

        let mut y = geometry.page_top;
        let mut leading = 0.0f32;
        let mut prev_baseline = geometry.page_top;
        let mut first_in_block = true;

        for op in &content.operations {
            match op.operator.as_str() {
                "BT" => first_in_block = true,
                "TL" => leading = op.operands.first().and_then(number).unwrap_or(leading),
                "Tm" => y = op.operands.get(5).and_then(number).unwrap_or(y),
                "Td" => y += op.operands.get(1).and_then(number).unwrap_or(0.0),
                "TD" => {
                    let ty = op.operands.get(1).and_then(number).unwrap_or(0.0);
                    leading = -ty;
                    y += ty;
                }
                "T*" => y -= leading,
                "Tj" | "'" | "\"" | "TJ" => {
                    if op.operator != "Tj" && op.operator != "TJ" {
                        y -= leading;
                    }
                    let text = shown_text(op);
                    if first_in_block {
                        if !out.is_empty() && prev_baseline - y > geometry.record_gap {
                            out.push('\n');
                        }
                    } else {
                        out.push(' ');
                    }
                    out.push_str(&text);
                    prev_baseline = y;
                    first_in_block = false;
                }
                "ET" => {
                    if !first_in_block {
                        out.push('\n');
                    }
                    first_in_block = true;
                }
                _ => {}
            }
        }
    }

    Ok(out)
}

fn shown_text(op: &Operation) -> String {
    let mut text = String::new();
    for operand in &op.operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&decode_latin1(bytes)),
            Object::Array(items) => {
                for item in items {
                    if let Object::String(bytes, _) = item {
                        text.push_str(&decode_latin1(bytes));
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
