//! Paragraph layout: styles, paragraph markup, word wrapping and pagination.
//!
//! The layout works in whole PDF points (US-letter, origin bottom-left).
//! Fonts are the standard Type1 Helvetica family so glyph widths are
//! approximated with a fixed per-character ratio rather than measured.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

// ── Styles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    Regular,
    Bold,
    Oblique,
}

impl FontFace {
    pub const ALL: [FontFace; 3] = [FontFace::Regular, FontFace::Bold, FontFace::Oblique];

    /// Name of the font in the page resource dictionary.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold    => "F2",
            FontFace::Oblique => "F3",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold    => "Helvetica-Bold",
            FontFace::Oblique => "Helvetica-Oblique",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    pub font: FontFace,
    pub size: i64,
    pub leading: i64,
    pub space_after: i64,
    /// RGB fill colour, components 0 or 1. `None` keeps the default black.
    pub color: Option<[i64; 3]>,
}

impl ParagraphStyle {
    const fn new(font: FontFace, size: i64, leading: i64, space_after: i64) -> Self {
        Self { font, size, leading, space_after, color: None }
    }
}

/// Page geometry and the fixed style sheet used by both artifact kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page_width: i64,
    pub page_height: i64,
    pub margin_left: i64,
    pub margin_right: i64,
    /// Baseline area top (y of the first line box).
    pub top: i64,
    pub bottom: i64,
    /// Average glyph advance as a fraction of the font size.
    pub char_width_ratio: f32,

    pub heading: ParagraphStyle,
    pub normal: ParagraphStyle,
    pub paper_title: ParagraphStyle,
    pub italic: ParagraphStyle,
    pub link: ParagraphStyle,
    pub section: ParagraphStyle,
    pub body: ParagraphStyle,

    /// Gap after the header block, both kinds.
    pub header_spacer: i64,
    pub collection_spacer: i64,
    pub summary_spacer: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 612,
            page_height: 792,
            margin_left: 72,
            margin_right: 72,
            top: 720,
            bottom: 72,
            char_width_ratio: 0.55,

            heading:     ParagraphStyle::new(FontFace::Bold, 18, 22, 12),
            normal:      ParagraphStyle::new(FontFace::Regular, 10, 12, 6),
            paper_title: ParagraphStyle::new(FontFace::Bold, 14, 17, 12),
            italic:      ParagraphStyle::new(FontFace::Oblique, 10, 12, 6),
            link: ParagraphStyle {
                color: Some([0, 0, 1]),
                ..ParagraphStyle::new(FontFace::Regular, 10, 12, 12)
            },
            section:     ParagraphStyle::new(FontFace::Bold, 12, 14, 6),
            body:        ParagraphStyle::new(FontFace::Regular, 10, 12, 6),

            header_spacer: 60,
            collection_spacer: 60,
            summary_spacer: 36,
        }
    }
}

impl LayoutConfig {
    pub fn usable_width(&self) -> i64 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Characters that fit on one line at `size`.
    pub fn max_chars(&self, size: i64) -> usize {
        let advance = self.char_width_ratio * size as f32;
        if advance <= 0.0 {
            return usize::MAX;
        }
        ((self.usable_width() as f32 / advance).floor() as usize).max(1)
    }

    pub fn text_width(&self, chars: usize, size: i64) -> i64 {
        (chars as f32 * self.char_width_ratio * size as f32).ceil() as i64
    }

    fn styles(&self) -> [&ParagraphStyle; 7] {
        [
            &self.heading,
            &self.normal,
            &self.paper_title,
            &self.italic,
            &self.link,
            &self.section,
            &self.body,
        ]
    }

    /// Widest baseline-to-baseline distance between two consecutive
    /// paragraphs with no spacer in between.
    pub fn max_paragraph_gap(&self) -> i64 {
        let styles = self.styles();
        let advance = styles.iter().map(|s| paragraph_advance(s)).max().unwrap_or(0);
        let size = styles.iter().map(|s| s.size).max().unwrap_or(0);
        advance + size
    }

    /// Narrowest baseline-to-baseline distance across a spacer.
    pub fn min_record_gap(&self) -> i64 {
        let styles = self.styles();
        let advance = styles.iter().map(|s| paragraph_advance(s)).min().unwrap_or(0);
        let size = styles.iter().map(|s| s.size).min().unwrap_or(0);
        let spacer = self.header_spacer.min(self.collection_spacer).min(self.summary_spacer);
        spacer + advance + size
    }

    /// Where extraction starts measuring on each page, and the gap above
    /// which two lines belong to different blocks.
    pub fn break_geometry(&self) -> BreakGeometry {
        let advance = self.styles().iter().map(|s| paragraph_advance(s)).min().unwrap_or(0);
        BreakGeometry {
            page_top: (self.top + advance) as f32,
            record_gap: (self.max_paragraph_gap() + self.min_record_gap()) as f32 / 2.0,
        }
    }

    /// Rejects geometry the renderer cannot place, and spacers too narrow
    /// to be told apart from paragraph spacing when the text is read back.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.bottom < 0 || self.top <= self.bottom || self.top > self.page_height {
            return Err(RenderError::Layout(format!(
                "text frame {}..{} does not fit a page of height {}",
                self.bottom, self.top, self.page_height
            )));
        }
        if self.usable_width() <= 0 {
            return Err(RenderError::Layout("margins leave no usable width".to_string()));
        }
        if let Some(style) = self.styles().into_iter().find(|s| s.size <= 0 || s.leading <= 0) {
            return Err(RenderError::Layout(format!(
                "style {:?} needs a positive size and leading",
                style.font
            )));
        }
        let (para, record) = (self.max_paragraph_gap(), self.min_record_gap());
        if record <= para {
            return Err(RenderError::Layout(format!(
                "record spacing ({record}pt) must exceed paragraph spacing ({para}pt)"
            )));
        }
        Ok(())
    }
}

/// Space a paragraph consumes below its last baseline before the next
/// paragraph's line box starts.
fn paragraph_advance(style: &ParagraphStyle) -> i64 {
    style.leading - style.size + style.space_after
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakGeometry {
    pub page_top: f32,
    pub record_gap: f32,
}

// ── Flowables ───────────────────────────────────────────────────────────────

/// One element of the document story.
#[derive(Debug, Clone)]
pub enum Block {
    /// Paragraph text in markup form (see [`parse_markup`]).
    Paragraph { markup: String, style: ParagraphStyle },
    /// Fixed vertical gap in points.
    Spacer(i64),
}

impl Block {
    pub fn paragraph(markup: impl Into<String>, style: &ParagraphStyle) -> Self {
        Block::Paragraph { markup: markup.into(), style: style.clone() }
    }
}

// ── Markup ──────────────────────────────────────────────────────────────────

/// Escape text for inclusion in paragraph markup.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Plain text of a paragraph plus the target of its link tag, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMarkup {
    pub text: String,
    pub href: Option<String>,
}

const OPEN_LINK: &str = "<link href='";
const CLOSE_LINK: &str = "</link>";

/// Parse paragraph markup.
///
/// Recognised: the entities `&amp; &lt; &gt; &quot;` and a
/// `<link href='...'>...</link>` element. Any other `<` or `&` is an error.
pub fn parse_markup(markup: &str) -> Result<ParsedMarkup, RenderError> {
    let mut text = String::with_capacity(markup.len());
    let mut href = None;
    let mut in_link = false;
    let mut i = 0;

    while i < markup.len() {
        let rest = &markup[i..];
        if rest.starts_with('&') {
            let (decoded, consumed) = decode_entity(rest).ok_or_else(|| markup_error(i, "unknown entity"))?;
            text.push(decoded);
            i += consumed;
        } else if rest.starts_with(OPEN_LINK) {
            if in_link || href.is_some() {
                return Err(markup_error(i, "nested or repeated link"));
            }
            let attr_start = OPEN_LINK.len();
            let attr_len = rest[attr_start..]
                .find("'>")
                .ok_or_else(|| markup_error(i, "unterminated link tag"))?;
            let raw = &rest[attr_start..attr_start + attr_len];
            href = Some(decode_attribute(raw).ok_or_else(|| markup_error(i, "bad entity in href"))?);
            in_link = true;
            i += attr_start + attr_len + 2;
        } else if rest.starts_with(CLOSE_LINK) {
            if !in_link {
                return Err(markup_error(i, "unmatched </link>"));
            }
            in_link = false;
            i += CLOSE_LINK.len();
        } else if rest.starts_with('<') || rest.starts_with('>') {
            return Err(markup_error(i, "unescaped angle bracket"));
        } else {
            // `i` always sits on a char boundary here.
            let c = rest.chars().next().unwrap_or_default();
            text.push(c);
            i += c.len_utf8();
        }
    }

    if in_link {
        return Err(markup_error(markup.len(), "unclosed <link>"));
    }
    Ok(ParsedMarkup { text, href })
}

fn decode_entity(s: &str) -> Option<(char, usize)> {
    [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>'), ("&quot;", '"')]
        .iter()
        .find(|(entity, _)| s.starts_with(entity))
        .map(|(entity, c)| (*c, entity.len()))
}

fn decode_attribute(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let rest = &raw[i..];
        if rest.starts_with('&') {
            let (c, n) = decode_entity(rest)?;
            out.push(c);
            i += n;
        } else {
            let c = rest.chars().next()?;
            out.push(c);
            i += c.len_utf8();
        }
    }
    Some(out)
}

fn markup_error(offset: usize, message: &str) -> RenderError {
    RenderError::Markup { offset, message: message.to_string() }
}

// ── Wrapping ────────────────────────────────────────────────────────────────

/// Greedy word wrap to at most `max_chars` characters per line. Words longer
/// than a line are hard-split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let tail = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = tail;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

// ── Pagination ──────────────────────────────────────────────────────────────

/// A paragraph (or the part of one) placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedParagraph {
    pub style: ParagraphStyle,
    pub lines: Vec<String>,
    pub x: i64,
    /// Baseline of the first line.
    pub y: i64,
    pub link: Option<LinkArea>,
}

/// Clickable rectangle `[x1, y1, x2, y2]` and its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkArea {
    pub href: String,
    pub rect: [i64; 4],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub paragraphs: Vec<PlacedParagraph>,
}

/// Flow the story onto pages.
///
/// A paragraph stays on one page unless it is taller than the page itself.
/// Spacers are deferred until the next paragraph: when that paragraph moves
/// to a fresh page the spacer moves with it, so a record boundary is always
/// visible as a vertical gap on the page where the record starts. Trailing
/// spacers are dropped.
pub fn paginate(blocks: &[Block], config: &LayoutConfig) -> Result<Vec<Page>, RenderError> {
    let mut pages = vec![Page::default()];
    let mut cursor = config.top;
    let mut pending_gap = 0i64;
    let frame_height = config.top - config.bottom;

    for block in blocks {
        let (markup, style) = match block {
            Block::Spacer(gap) => {
                pending_gap += (*gap).max(0);
                continue;
            }
            Block::Paragraph { markup, style } => (markup, style),
        };

        let parsed = parse_markup(markup)?;
        let mut lines = wrap(&parsed.text, config.max_chars(style.size));
        if lines.is_empty() {
            continue;
        }

        let height = lines.len() as i64 * style.leading;
        let page_is_empty = cursor == config.top;
        let fits = cursor - pending_gap - height >= config.bottom;
        if !fits && !page_is_empty && height <= frame_height - pending_gap {
            pages.push(Page::default());
            cursor = config.top;
        }
        cursor -= pending_gap;
        pending_gap = 0;

        // Oversized paragraphs are split line by line across pages.
        loop {
            let room = ((cursor - config.bottom) / style.leading).max(0) as usize;
            if room == 0 {
                pages.push(Page::default());
                cursor = config.top;
                continue;
            }
            let take = room.min(lines.len());
            let rest = lines.split_off(take);
            let chunk = std::mem::replace(&mut lines, rest);

            let first_baseline = cursor - style.size;
            let link = parsed.href.as_ref().map(|href| {
                let widest = chunk.iter().map(|l| l.chars().count()).max().unwrap_or(0);
                let last_baseline = first_baseline - (chunk.len() as i64 - 1) * style.leading;
                LinkArea {
                    href: href.clone(),
                    rect: [
                        config.margin_left,
                        last_baseline - 2,
                        config.margin_left + config.text_width(widest, style.size).min(config.usable_width()),
                        first_baseline + style.size,
                    ],
                }
            });

            cursor -= chunk.len() as i64 * style.leading;
            if let Some(page) = pages.last_mut() {
                page.paragraphs.push(PlacedParagraph {
                    style: style.clone(),
                    lines: chunk,
                    x: config.margin_left,
                    y: first_baseline,
                    link,
                });
            }

            if lines.is_empty() {
                break;
            }
            pages.push(Page::default());
            cursor = config.top;
        }
        cursor -= style.space_after;
    }

    Ok(pages)
}
