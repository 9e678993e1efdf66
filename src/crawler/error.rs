//! Shared error type for the crawler: fetch failures and extraction failures.

use thiserror::Error;

/// Crawl error. Fetch variants cover transport and HTTP status problems;
/// extract variants cover pages missing the markup the source site is
/// expected to carry (changed markup or a wrong URL).
#[derive(Debug, Error)]
pub enum CrawlError {
    // URL handling
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    // Fetch
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus {
        status: u16,
        url: String,
        /// Optional context (e.g. "book page", "chapter 5") for programmatic use.
        context: Option<String>,
    },

    #[error("Failed to read response body: {source}")]
    BodyRead { source: reqwest::Error },

    // Extract
    #[error("Could not parse page: {message}")]
    ParsePage { message: String },

    #[error("No title heading (<h2>) found at {url}.")]
    MissingHeading { url: String },

    #[error("No table-of-contents container (div#content3) found at {url}.")]
    MissingToc { url: String },

    #[error("Chapter {index} has no content cells (td.ctext) at {url}.")]
    MissingContent { index: u32, url: String },

    #[error("Sub-book at {url} produced no chapters; cannot record a section range.")]
    EmptySubBook { url: String },
}
