//! Crawl pipeline: TOC planning, sequential chapter fetching, and canon
//! assembly. Page-level parsing lives in [ctext]; the HTTP client in
//! [client].

mod client;
mod error;

pub mod ctext;

pub use client::{PoliteClient, PoliteClientBuilder};
pub use error::CrawlError;

use crate::model::{Book, Chapter, Section};
use ctext::TocLink;
use regex::Regex;

/// Caller-supplied predicate deciding which TOC hrefs are chapters.
///
/// Receives the anchor's raw href (with a single leading `/` stripped),
/// before URL resolution.
pub trait HrefFilter {
    fn matches(&self, href: &str) -> bool;
}

/// Starts-with regex filter, the CLI's `--chapter-filter-regex`.
///
/// The pattern is anchored at the start of the href; a match may end before
/// the href does.
pub struct RegexHrefFilter {
    re: Regex,
}

impl RegexHrefFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self { re })
    }
}

impl HrefFilter for RegexHrefFilter {
    fn matches(&self, href: &str) -> bool {
        self.re.is_match(href)
    }
}

/// How to treat a chapter page with no content cells at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyChapterPolicy {
    /// Keep a zero-block chapter.
    Allow,
    /// Fail the crawl (default).
    Fail,
}

impl Default for EmptyChapterPolicy {
    fn default() -> Self {
        EmptyChapterPolicy::Fail
    }
}

/// Options for a crawl run. `start_index` seeds chapter numbering;
/// `max_chapters` bounds the index value, not the accepted count.
pub struct CrawlOptions<'a> {
    pub progress: Option<&'a dyn Fn(u32, u32)>,
    pub start_index: u32,
    pub max_chapters: Option<u32>,
    pub empty_chapters: EmptyChapterPolicy,
    pub indent: bool,
    /// Plan the TOC but skip chapter fetches; chapters come back with empty texts.
    pub toc_only: bool,
    pub quiet: bool,
}

impl Default for CrawlOptions<'_> {
    fn default() -> Self {
        Self {
            progress: None,
            start_index: 0,
            max_chapters: None,
            empty_chapters: EmptyChapterPolicy::Fail,
            indent: true,
            toc_only: false,
            quiet: false,
        }
    }
}

/// One accepted TOC link with its assigned chapter index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChapter {
    pub index: u32,
    pub href: String,
    pub title: String,
}

/// Outcome of planning a TOC: accepted links with indices, rejected links for logging.
#[derive(Debug, Clone)]
pub struct TocPlan {
    pub accepted: Vec<PlannedChapter>,
    pub skipped: Vec<TocLink>,
}

/// The form of an href the filter sees: a single leading `/` is stripped so
/// base-relative and root-relative anchors match the same patterns.
fn filter_form(href: &str) -> &str {
    href.strip_prefix('/').unwrap_or(href)
}

/// Assign sequential indices to accepted links, in document order.
///
/// Indices start at `start_index` and advance only on accepted links.
/// After each link, accepted or not, the loop stops once the running index
/// reaches `max_chapters`; a link processed on the boundary iteration is
/// still accepted even when `start_index` already exceeds the cap.
pub fn plan_chapters(
    links: &[TocLink],
    filter: &dyn HrefFilter,
    start_index: u32,
    max_chapters: Option<u32>,
) -> TocPlan {
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    let mut index = start_index;
    for link in links {
        match link.href.as_deref() {
            Some(href) if filter.matches(filter_form(href)) => {
                accepted.push(PlannedChapter {
                    index,
                    href: href.to_string(),
                    title: link.title.clone(),
                });
                index += 1;
            }
            _ => skipped.push(link.clone()),
        }
        if let Some(max) = max_chapters {
            if index >= max {
                break;
            }
        }
    }
    TocPlan { accepted, skipped }
}

/// Crawl one book: fetch the root page, plan its TOC, then fetch and extract
/// each accepted chapter in order. Any fetch or extract failure aborts the
/// crawl; partial progress is not persisted.
pub fn crawl_book(
    root_url: &str,
    filter: &dyn HrefFilter,
    client: &mut PoliteClient,
    options: &CrawlOptions<'_>,
) -> Result<Book, CrawlError> {
    let html = client.get_text(root_url, Some("book page"))?;
    let name = ctext::parse_book_title(&html, root_url)?;
    let toc = ctext::parse_toc(&html, root_url)?;

    let plan = plan_chapters(&toc, filter, options.start_index, options.max_chapters);
    if !options.quiet {
        for link in &plan.skipped {
            eprintln!(
                "Skipping {}, {}",
                link.title,
                link.href.as_deref().unwrap_or("<no href>")
            );
        }
    }

    let total = plan.accepted.len() as u32;
    let mut chapters = Vec::with_capacity(plan.accepted.len());

    if options.toc_only {
        for planned in plan.accepted {
            chapters.push(Chapter {
                title: planned.title,
                texts: Vec::new(),
                loc: planned.index,
            });
        }
        return Ok(Book {
            name,
            chapters,
            sections: None,
        });
    }

    let mut done = 0u32;
    for planned in plan.accepted {
        done += 1;
        if let Some(ref p) = options.progress {
            p(done, total);
        }
        let chapter_url = ctext::resolve_href(root_url, &planned.href)?;
        let context = format!("chapter {}", planned.index);
        let chapter_html = client.get_text(&chapter_url, Some(&context))?;
        let chapter = ctext::parse_chapter_page(
            &chapter_html,
            &planned.title,
            planned.index,
            &chapter_url,
            options.indent,
            options.empty_chapters,
        )?;
        chapters.push(chapter);
    }

    Ok(Book {
        name,
        chapters,
        sections: None,
    })
}

/// Crawl a canon: one [crawl_book] per sub-book URL in order, then renumber
/// all chapters into one contiguous sequence and record a section per
/// sub-book. The supplied `title` becomes the canon's name; each section is
/// titled with its sub-book's own derived name.
pub fn crawl_canon(
    book_urls: &[String],
    title: &str,
    filter: &dyn HrefFilter,
    client: &mut PoliteClient,
    options: &CrawlOptions<'_>,
) -> Result<Book, CrawlError> {
    let mut books = Vec::with_capacity(book_urls.len());
    for url in book_urls {
        let book = crawl_book(url, filter, client, options)?;
        if book.chapters.is_empty() {
            return Err(CrawlError::EmptySubBook { url: url.clone() });
        }
        books.push(book);
    }
    Ok(assemble_canon(title, books, options.start_index))
}

/// Renumber sub-book chapters with one running counter starting at
/// `start_index` and record each sub-book's inclusive span. Each sub-book's
/// internal numbering is discarded. Callers ensure every book is non-empty.
fn assemble_canon(title: &str, books: Vec<Book>, start_index: u32) -> Book {
    let mut chapters = Vec::new();
    let mut sections = Vec::with_capacity(books.len());
    let mut next = start_index;
    for book in books {
        let start = next;
        for mut chapter in book.chapters {
            chapter.loc = next;
            next += 1;
            chapters.push(chapter);
        }
        sections.push(Section {
            title: book.name,
            chapter_range: (start, next - 1),
        });
    }
    Book {
        name: title.to_string(),
        chapters,
        sections: Some(sections),
    }
}
