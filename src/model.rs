//! Canonical data model for crawled books.
//!
//! The crawler produces this shape; the JSON exporter consumes it as the
//! single source of truth.

use serde::{Deserialize, Serialize};

/// One crawled chapter.
///
/// `texts` holds one entry per extracted content block, in document order.
/// `loc` is the chapter's position index, assigned in crawl order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub texts: Vec<String>,
    /// 0-based by default; the first chapter gets the configured start index.
    pub loc: u32,
}

impl Chapter {
    /// Flat rendering of the body: blocks joined with newlines.
    pub fn joined_text(&self) -> String {
        self.texts.join("\n")
    }
}

/// One sub-book's contiguous chapter span within a canon, after renumbering.
///
/// `chapter_range` is inclusive on both ends and serializes as `[start, end]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub chapter_range: (u32, u32),
}

/// A crawled book: ordered chapters under one name.
///
/// `sections` is present only for canon crawls, where it records each
/// sub-book's renumbered chapter span in supply order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub name: String,
    pub chapters: Vec<Chapter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn sample_book() -> Book {
        Book {
            name: "黄帝内经 - 素问".to_string(),
            chapters: vec![Chapter {
                title: "上古天真论".to_string(),
                texts: vec![
                    "　　昔在黄帝，生而神灵。".to_string(),
                    "　　乃问于天师曰。".to_string(),
                ],
                loc: 0,
            }],
            sections: None,
        }
    }

    #[test]
    fn chapter_serializes_with_expected_keys_in_order() -> Result<(), Box<dyn Error>> {
        let book = sample_book();
        // Field order in the serialized text is the struct's declaration order.
        let json = serde_json::to_string(&book.chapters)?;
        assert!(json.starts_with(r#"[{"title":"上古天真论","texts":["#));
        assert!(json.ends_with(r#""loc":0}]"#));

        let parsed: serde_json::Value = serde_json::from_str(&json)?;
        let chapters = parsed
            .as_array()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "not an array"))?;
        assert_eq!(chapters.len(), 1);
        let texts = chapters[0]["texts"].as_array().expect("texts must be array");
        assert_eq!(texts.len(), 2);
        assert!(texts[0].as_str().unwrap_or("").starts_with("　　"));
        Ok(())
    }

    #[test]
    fn section_range_serializes_as_two_element_array() -> Result<(), Box<dyn Error>> {
        let section = Section {
            title: "本纪".to_string(),
            chapter_range: (0, 11),
        };
        let json = serde_json::to_string(&section)?;
        assert_eq!(json, r#"{"title":"本纪","chapter_range":[0,11]}"#);
        Ok(())
    }

    #[test]
    fn book_round_trips_through_json() -> Result<(), Box<dyn Error>> {
        let mut book = sample_book();
        book.sections = Some(vec![Section {
            title: "素问".to_string(),
            chapter_range: (0, 0),
        }]);
        let json = serde_json::to_string(&book)?;
        let round_tripped: Book = serde_json::from_str(&json)?;
        assert_eq!(round_tripped.name, book.name);
        assert_eq!(round_tripped.chapters.len(), 1);
        assert_eq!(round_tripped.chapters[0].texts, book.chapters[0].texts);
        assert_eq!(round_tripped.sections.as_ref().map(|s| s.len()), Some(1));
        Ok(())
    }

    #[test]
    fn sections_key_absent_when_none() -> Result<(), Box<dyn Error>> {
        let book = sample_book();
        let json = serde_json::to_string(&book)?;
        let parsed: serde_json::Value = serde_json::from_str(&json)?;
        assert!(parsed.get("sections").is_none());
        Ok(())
    }

    #[test]
    fn joined_text_inserts_newlines_between_blocks() {
        let ch = Chapter {
            title: "t".to_string(),
            texts: vec!["　　一".to_string(), "　　二".to_string()],
            loc: 3,
        };
        assert_eq!(ch.joined_text(), "　　一\n　　二");
    }
}
