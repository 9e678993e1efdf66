//! ctext.org page parsing. Book pages carry the title in the first `<h2>` and
//! the chapter links in `div#content3`; chapter body text lives in `td.ctext`
//! cells. Paragraph indentation on the site is a leading double-width space.

use crate::crawler::error::CrawlError;
use crate::crawler::EmptyChapterPolicy;
use crate::model::Chapter;
use reqwest::Url;
use scraper::{Html, Selector};

/// Double-width space the source convention uses for paragraph indentation.
pub const INDENT: &str = "　　";

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, CrawlError> {
    Selector::parse(sel).map_err(|e| CrawlError::ParsePage {
        message: format!("invalid selector {:?}: {}", sel, e),
    })
}

/// One anchor from the table-of-contents container, in document order.
/// `href` is the raw attribute value; anchors without an href keep `None`
/// so they can still be reported as skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocLink {
    pub href: Option<String>,
    pub title: String,
}

/// Book display title: text of the first `<h2>` on the page.
pub fn parse_book_title(html: &str, url: &str) -> Result<String, CrawlError> {
    let doc = Html::parse_document(html);
    let h2_sel = parse_selector("h2")?;
    doc.select(&h2_sel)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CrawlError::MissingHeading {
            url: url.to_string(),
        })
}

/// All anchors inside the `div#content3` TOC container, in document order.
pub fn parse_toc(html: &str, url: &str) -> Result<Vec<TocLink>, CrawlError> {
    let doc = Html::parse_document(html);
    let container_sel = parse_selector("div#content3")?;
    let a_sel = parse_selector("a")?;
    let container = doc
        .select(&container_sel)
        .next()
        .ok_or_else(|| CrawlError::MissingToc {
            url: url.to_string(),
        })?;
    Ok(container
        .select(&a_sel)
        .map(|a| TocLink {
            href: a.value().attr("href").map(String::from),
            title: a.text().collect::<String>().trim().to_string(),
        })
        .collect())
}

/// Resolve a chapter href against the site origin of the root page URL.
///
/// Hrefs on the site are origin-relative whether or not they carry a leading
/// slash, so resolution goes through `{scheme}://{host}/`, not the root
/// page's own path. Absolute hrefs pass through unchanged.
pub fn resolve_href(root_url: &str, href: &str) -> Result<String, CrawlError> {
    let invalid = |reason: String| CrawlError::InvalidUrl {
        input: root_url.to_string(),
        reason,
    };
    let root = Url::parse(root_url).map_err(|e| invalid(e.to_string()))?;
    let origin = root.join("/").map_err(|e| invalid(e.to_string()))?;
    let resolved = origin.join(href).map_err(|e| CrawlError::InvalidUrl {
        input: href.to_string(),
        reason: e.to_string(),
    })?;
    Ok(resolved.to_string())
}

/// Trim a content block and ensure it starts with the indentation prefix.
/// Idempotent: an already-prefixed block is returned as-is.
pub fn indent_block(text: &str) -> String {
    let text = text.trim();
    if text.starts_with(INDENT) {
        text.to_string()
    } else {
        format!("{}{}", INDENT, text)
    }
}

/// Extract one chapter from a fetched chapter page.
///
/// `title_hint` is the TOC anchor text; when empty, the title falls back to
/// the page's own `<h2>`. Content blocks are the `td.ctext` cells in document
/// order, trimmed, and indent-prefixed when `indent` is on. A page with no
/// content cell at all is [CrawlError::MissingContent] under
/// [EmptyChapterPolicy::Fail], or a zero-block chapter under
/// [EmptyChapterPolicy::Allow].
pub fn parse_chapter_page(
    html: &str,
    title_hint: &str,
    index: u32,
    url: &str,
    indent: bool,
    empty: EmptyChapterPolicy,
) -> Result<Chapter, CrawlError> {
    let doc = Html::parse_document(html);

    let title = if title_hint.is_empty() {
        let h2_sel = parse_selector("h2")?;
        doc.select(&h2_sel)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CrawlError::MissingHeading {
                url: url.to_string(),
            })?
    } else {
        title_hint.to_string()
    };

    let cell_sel = parse_selector("td.ctext")?;
    let texts: Vec<String> = doc
        .select(&cell_sel)
        .map(|el| {
            let text = el.text().collect::<String>();
            if indent {
                indent_block(&text)
            } else {
                text.trim().to_string()
            }
        })
        .collect();

    if texts.is_empty() && empty == EmptyChapterPolicy::Fail {
        return Err(CrawlError::MissingContent {
            index,
            url: url.to_string(),
        });
    }

    Ok(Chapter {
        title,
        texts,
        loc: index,
    })
}
