//! ctscrape: CLI crawler for ctext.org classical Chinese texts, outputting JSON.

pub mod cli;
pub mod config;
pub mod crawler;
pub mod export;
pub mod model;

// Re-exports for CLI and consumers.
pub use crawler::{
    crawl_book, crawl_canon, plan_chapters, CrawlError, CrawlOptions, EmptyChapterPolicy,
    HrefFilter, PoliteClient, PoliteClientBuilder, RegexHrefFilter,
};
pub use export::{export_book, ExportError};
pub use model::{Book, Chapter, Section};
