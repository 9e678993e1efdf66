//! JSON export. Consumes the canonical Book and writes the chapter file plus,
//! for canons, the sections file.

use crate::model::Book;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the JSON exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize output: {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Write `{base_path}.json` with the chapter array and, when the book has a
/// non-empty sections list, `{base_path}_sections.json` with the section
/// array. Existing files are overwritten; writes are not atomic. Returns the
/// paths written.
pub fn export_book(book: &Book, base_path: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let mut written = Vec::with_capacity(2);

    let chapters_path = append_to_stem(base_path, ".json");
    write_json(&chapters_path, &book.chapters)?;
    written.push(chapters_path);

    if let Some(sections) = book.sections.as_ref().filter(|s| !s.is_empty()) {
        let sections_path = append_to_stem(base_path, "_sections.json");
        write_json(&sections_path, sections)?;
        written.push(sections_path);
    }

    Ok(written)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let f = File::create(path).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::to_writer(f, value).map_err(|e| ExportError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `{base}{suffix}` without treating the base name's dots as extensions.
fn append_to_stem(base: &Path, suffix: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Book, Chapter, Section};
    use std::error::Error;

    fn sample_book(sections: Option<Vec<Section>>) -> Book {
        Book {
            name: "黄帝内经 - 素问".to_string(),
            chapters: vec![
                Chapter {
                    title: "上古天真论".to_string(),
                    texts: vec!["　　昔在黄帝。".to_string()],
                    loc: 0,
                },
                Chapter {
                    title: "四气调神大论".to_string(),
                    texts: vec!["　　春三月。".to_string()],
                    loc: 1,
                },
            ],
            sections,
        }
    }

    fn temp_base(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ctscrape_export_test_{}", tag))
    }

    #[test]
    fn writes_chapter_array_only_without_sections() -> Result<(), Box<dyn Error>> {
        let base = temp_base("single");
        let written = export_book(&sample_book(None), &base)?;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], temp_base("single.json"));

        let data = std::fs::read_to_string(&written[0])?;
        let parsed: serde_json::Value = serde_json::from_str(&data)?;
        let chapters = parsed.as_array().expect("chapter file must be an array");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0]["title"].as_str(), Some("上古天真论"));
        assert_eq!(chapters[1]["loc"].as_u64(), Some(1));

        std::fs::remove_file(&written[0])?;
        Ok(())
    }

    #[test]
    fn writes_sections_file_for_canon() -> Result<(), Box<dyn Error>> {
        let base = temp_base("canon");
        let book = sample_book(Some(vec![Section {
            title: "素问".to_string(),
            chapter_range: (0, 1),
        }]));
        let written = export_book(&book, &base)?;
        assert_eq!(written.len(), 2);
        assert_eq!(written[1], temp_base("canon_sections.json"));

        let data = std::fs::read_to_string(&written[1])?;
        let parsed: serde_json::Value = serde_json::from_str(&data)?;
        let sections = parsed.as_array().expect("sections file must be an array");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0]["chapter_range"][1].as_u64(), Some(1));

        for path in &written {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    #[test]
    fn empty_sections_list_writes_no_sections_file() -> Result<(), Box<dyn Error>> {
        let base = temp_base("empty_sections");
        let written = export_book(&sample_book(Some(Vec::new())), &base)?;
        assert_eq!(written.len(), 1);
        std::fs::remove_file(&written[0])?;
        Ok(())
    }

    #[test]
    fn overwrites_existing_output() -> Result<(), Box<dyn Error>> {
        let base = temp_base("overwrite");
        let path = temp_base("overwrite.json");
        std::fs::write(&path, "stale")?;
        export_book(&sample_book(None), &base)?;
        let data = std::fs::read_to_string(&path)?;
        assert!(data.starts_with('['));
        std::fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn missing_parent_directory_is_an_io_error() {
        let base = PathBuf::from("/nonexistent_dir_ctscrape_xyz/out");
        let result = export_book(&sample_book(None), &base);
        assert!(matches!(result, Err(ExportError::Io { .. })));
    }
}
