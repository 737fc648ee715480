//! Entry extraction from an arXiv HTML listing.
//!
//! A listing is a sequence of `<dt>` (identifiers, abstract link) and `<dd>`
//! (metadata) elements. The n-th `<dt>` belongs to the n-th `<dd>`.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use arxivdigest_common::paper::SUBJECTS_NOT_FOUND;
use arxivdigest_common::text::{collapse_whitespace, strip_label};
use arxivdigest_common::{PaperRecord, Topic};

use crate::sources::arxiv::ARXIV_BASE_URL;

lazy_static! {
    static ref DT: Selector = Selector::parse("dt").expect("dt selector");
    static ref DD: Selector = Selector::parse("dd").expect("dd selector");
    static ref TITLE: Selector = Selector::parse("div.list-title").expect("title selector");
    static ref AUTHORS: Selector = Selector::parse("div.list-authors").expect("authors selector");
    static ref SUBJECTS: Selector = Selector::parse("div.list-subjects").expect("subjects selector");
    static ref ABSTRACT_LINK: Selector = Selector::parse(r#"a[title="Abstract"]"#).expect("link selector");
    static ref ABSTRACT: Selector = Selector::parse("p.mathjax").expect("abstract selector");
    static ref ARXIV_BASE: Option<Url> = Url::parse(ARXIV_BASE_URL).ok();
}

/// One `<dt>`/`<dd>` pair, fields already cleaned. Missing fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub subjects: Option<String>,
    pub abstract_text: Option<String>,
    pub link: Option<String>,
}

impl ListingEntry {
    /// Subjects text used for topic matching; the placeholder when missing.
    pub fn subjects_text(&self) -> &str {
        self.subjects.as_deref().unwrap_or(SUBJECTS_NOT_FOUND)
    }

    pub fn to_record(&self) -> PaperRecord {
        PaperRecord::new(
            self.title.clone().unwrap_or_default(),
            self.authors.clone().unwrap_or_default(),
            self.subjects.clone().unwrap_or_default(),
            self.abstract_text.clone().unwrap_or_default(),
            self.link.clone(),
        )
    }
}

/// A parsed listing page, shared read-only by every topic of a run.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    pub fn parse(raw: &str) -> Self {
        let document = Html::parse_document(raw);
        let dts: Vec<ElementRef> = document.select(&DT).collect();
        let dds: Vec<ElementRef> = document.select(&DD).collect();
        if dts.len() != dds.len() {
            warn!(dt = dts.len(), dd = dds.len(), "Unbalanced listing; extra entries ignored");
        }

        let entries: Vec<ListingEntry> = dts
            .iter()
            .zip(dds.iter())
            .map(|(dt, dd)| ListingEntry {
                title: first_text(dd, &TITLE).map(|t| strip_label(&t, "Title:")),
                authors: first_text(dd, &AUTHORS).map(|t| strip_label(&t, "Authors:")),
                subjects: first_text(dd, &SUBJECTS).map(|t| strip_label(&t, "Subjects:")),
                abstract_text: first_text(dd, &ABSTRACT),
                link: dt
                    .select(&ABSTRACT_LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(absolute_link),
            })
            .collect();

        if entries.is_empty() {
            warn!("Listing contains no entries");
        } else {
            debug!(entries = entries.len(), "Parsed listing");
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records whose subjects contain `topic` (case-insensitive), in listing
    /// order, at most `max_count`.
    pub fn matching(&self, topic: &Topic, max_count: usize) -> Vec<PaperRecord> {
        let records: Vec<PaperRecord> = self
            .entries
            .iter()
            .filter(|e| topic.matches(e.subjects_text()))
            .take(max_count)
            .map(ListingEntry::to_record)
            .collect();
        debug!(topic = %topic, matched = records.len(), "Filtered listing by topic");
        records
    }
}

/// Parse `raw` and keep the entries matching `topic`.
pub fn extract(raw: &str, topic: &Topic, max_count: usize) -> Vec<PaperRecord> {
    Listing::parse(raw).matching(topic, max_count)
}

fn first_text(parent: &ElementRef, selector: &Selector) -> Option<String> {
    parent
        .select(selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn absolute_link(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match ARXIV_BASE.as_ref() {
        Some(base) => base.join(href).ok().map(String::from),
        None => Some(format!("{ARXIV_BASE_URL}{href}")),
    }
}
