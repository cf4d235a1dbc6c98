use std::collections::HashMap;

use serde::Serialize;

use crate::parser::article::Article;

/// Corpus-wide statistics, derived once from a completed set of articles.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub total_articles: usize,
    pub total_words: usize,
    pub total_chars: usize,
    pub average_words: f64,
    pub common_words: HashMap<String, usize>,
    pub longest_article: String,
    pub shortest_article: String,
}

/// Single pass over the articles: sum the counts, merge word frequencies
/// additively, and track the extremes with strict comparisons so the first
/// article with an extreme word count wins ties.
pub fn aggregate(articles: &[Article]) -> Analysis {
    let mut total_words = 0;
    let mut total_chars = 0;
    let mut common_words: HashMap<String, usize> = HashMap::new();
    let mut longest: Option<(usize, &str)> = None;
    let mut shortest: Option<(usize, &str)> = None;

    for article in articles {
        total_words += article.word_count;
        total_chars += article.char_count;
        for (word, count) in &article.word_freq {
            *common_words.entry(word.clone()).or_insert(0) += count;
        }
        if longest.map_or(true, |(max, _)| article.word_count > max) {
            longest = Some((article.word_count, &article.url));
        }
        if shortest.map_or(true, |(min, _)| article.word_count < min) {
            shortest = Some((article.word_count, &article.url));
        }
    }

    let average_words = if articles.is_empty() {
        0.0
    } else {
        total_words as f64 / articles.len() as f64
    };

    Analysis {
        total_articles: articles.len(),
        total_words,
        total_chars,
        average_words,
        common_words,
        longest_article: longest.map(|(_, url)| url.to_string()).unwrap_or_default(),
        shortest_article: shortest.map(|(_, url)| url.to_string()).unwrap_or_default(),
    }
}

/// The `n` highest-count entries, descending. Ties are broken by ascending
/// word order so the ranking is deterministic across runs.
pub fn top_k(freq: &HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut pairs: Vec<(String, usize)> = freq.iter().map(|(w, c)| (w.clone(), *c)).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs.truncate(n);
    pairs
}

// ── Tests ──
