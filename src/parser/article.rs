use std::collections::HashMap;

use super::elements::{Element, PageFields};
use super::sections::{build_sections, Section};
use super::text::{normalize, tokenize};

/// One fully extracted article, built in a single pass over its page's
/// element stream and never mutated afterwards. The word-frequency values
/// always sum to `word_count`.
#[derive(Debug, Clone)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: String,
    pub publish_date: String,
    pub summary: String,
    pub sections: Vec<Section>,
    pub content: String,
    pub word_count: usize,
    pub char_count: usize,
    pub word_freq: HashMap<String, usize>,
}

/// Normalize the scalar fields, build sections from the element stream,
/// synthesize the full content, and count words. A page with no elements
/// produces an empty article, not an error.
pub fn extract(url: &str, fields: &PageFields, elements: &[Element]) -> Article {
    let sections = build_sections(elements);

    let mut content = String::new();
    for section in &sections {
        if !section.heading.is_empty() {
            content.push_str("\n## ");
            content.push_str(&section.heading);
            content.push_str("\n\n");
        }
        content.push_str(&section.content);
        content.push('\n');
    }

    let words = tokenize(&content);
    let word_count = words.len();
    let mut word_freq: HashMap<String, usize> = HashMap::new();
    for word in words {
        *word_freq.entry(word).or_insert(0) += 1;
    }

    Article {
        url: url.to_string(),
        title: normalize(&fields.title),
        author: normalize(&fields.author),
        publish_date: normalize(&fields.publish_date),
        summary: normalize(&fields.summary),
        char_count: content.chars().count(),
        sections,
        content,
        word_count,
        word_freq,
    }
}

// ── Tests ──
