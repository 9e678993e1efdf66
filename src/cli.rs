//! CLI parsing and orchestration. Parses args, runs the crawl (single book or
//! canon), exports JSON. Maps errors to exit codes.

use crate::config;
use crate::crawler::{
    crawl_book, crawl_canon, CrawlError, CrawlOptions, EmptyChapterPolicy, PoliteClient,
    RegexHrefFilter,
};
use crate::export::{export_book, ExportError};
use clap::Parser;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Crawl(#[from] CrawlError),

    #[error("{0}")]
    Export(#[from] ExportError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Crawl(_) => 2,
            CliRunError::Export(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ctscrape")]
#[command(about = "Crawl a book from ctext.org and write chapter JSON")]
#[command(
    after_help = "Config file keys (output_dir, user_agent, request_delay_secs, timeout_secs, empty_chapters) are read from ctscrape.toml; CLI flags override config. Example:\n  ctscrape --url https://ctext.org/huangdi-neijing/suwen/zhs --title \"黄帝内经 - 素问\" --chapter-filter-regex \"huangdi-neijing/.+/zhs\""
)]
pub struct Args {
    /// Root page URL of the book.
    #[arg(long)]
    pub url: String,

    /// Book title; becomes the output filename stem and the canon name.
    #[arg(long)]
    pub title: String,

    /// Starts-with regex matched against each candidate chapter href.
    #[arg(long)]
    pub chapter_filter_regex: String,

    /// Sub-book root URLs; presence switches from single-book to canon mode.
    #[arg(long, num_args = 1..)]
    pub book_urls: Option<Vec<String>>,

    /// Stop once the running chapter index reaches this value.
    #[arg(long)]
    pub max_chapters: Option<u32>,

    /// Index assigned to the first accepted chapter.
    #[arg(long, default_value_t = 0)]
    pub chapter_index_start: u32,

    /// Output directory for the JSON files. Default from config, else CWD.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Delay slept after each fetch in seconds (overrides config; default 1).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// How to treat chapter pages without content cells: allow or fail.
    #[arg(long, value_parser = parse_empty_policy)]
    pub empty_chapters: Option<EmptyChapterPolicy>,

    /// Keep extracted blocks as-is instead of prefixing the indentation marker.
    #[arg(long)]
    pub no_indent: bool,

    /// Fetch TOC pages only, print chapter count and output path without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress and skip logging (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,
}

fn parse_empty_policy(s: &str) -> Result<EmptyChapterPolicy, String> {
    match s.to_lowercase().as_str() {
        "allow" => Ok(EmptyChapterPolicy::Allow),
        "fail" => Ok(EmptyChapterPolicy::Fail),
        _ => Err(format!(
            "Invalid --empty-chapters value: '{}'. Use allow or fail.",
            s
        )),
    }
}

/// Build the href filter from the CLI pattern. Anchored at the start of the
/// href, like the planner expects.
fn build_filter(pattern: &str) -> Result<RegexHrefFilter, CliRunError> {
    RegexHrefFilter::new(pattern).map_err(|e| {
        CliRunError::InvalidInput(format!(
            "Invalid --chapter-filter-regex '{}': {}",
            pattern, e
        ))
    })
}

/// Ensure output base's parent directory exists; return error otherwise.
fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    if args.title.trim().is_empty() {
        return Err(CliRunError::InvalidInput(
            "--title must not be empty; it names the output files.".to_string(),
        ));
    }
    let filter = build_filter(&args.chapter_filter_regex)?;

    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let effective_output_dir: PathBuf = args
        .output_dir
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.output_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."));

    const DEFAULT_DELAY_SECS: u64 = 1;
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    let delay_secs = args
        .delay
        .or_else(|| config.as_ref().and_then(|c| c.request_delay_secs))
        .unwrap_or(DEFAULT_DELAY_SECS);
    let timeout_secs = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));

    let mut builder = PoliteClient::builder()
        .delay_secs(delay_secs)
        .timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let empty_chapters = args
        .empty_chapters
        .or_else(|| {
            config
                .as_ref()
                .and_then(|c| c.empty_chapters.as_deref())
                .and_then(|s| parse_empty_policy(s).ok())
        })
        .unwrap_or_default();

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |n: u32, total: u32| {
        if total == 0 {
            return;
        }
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .progress_chars("█▉▊▋▌▍▎▏ "),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_length(total as u64);
        pb.set_position(n as u64);
        pb.set_message(format!("Fetching chapter {}/{}", n, total));
    };
    let progress: Option<&dyn Fn(u32, u32)> = if args.quiet { None } else { Some(&progress_cb) };

    let options = CrawlOptions {
        progress,
        start_index: args.chapter_index_start,
        max_chapters: args.max_chapters,
        empty_chapters,
        indent: !args.no_indent,
        toc_only: args.dry_run,
        quiet: args.quiet,
    };

    let output_base = effective_output_dir.join(&args.title);
    validate_output_path(&output_base)?;

    let book = match &args.book_urls {
        Some(urls) => crawl_canon(urls, &args.title, &filter, &mut client, &options)?,
        None => crawl_book(&args.url, &filter, &mut client, &options)?,
    };

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    if args.dry_run {
        eprintln!("Chapters: {}", book.chapters.len());
        eprintln!("Output: {}.json", output_base.display());
        return Ok(());
    }

    if book.chapters.is_empty() && !args.quiet {
        eprintln!(
            "Warning: no chapter links matched '{}' at {}.",
            args.chapter_filter_regex, args.url
        );
    }

    let written = export_book(&book, &output_base)?;

    if !args.quiet {
        for path in &written {
            eprintln!("Wrote {}", path.display());
        }
    }
    Ok(())
}
