use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::analysis::{top_k, Analysis};
use crate::parser::article::Article;

/// Column order is a compatibility contract with downstream consumers.
const ARTICLE_HEADER: [&str; 9] = [
    "Title",
    "URL",
    "Author",
    "Publish Date",
    "Summary",
    "Word Count",
    "Character Count",
    "Content",
    "Top 5 Words",
];

/// Write all article rows to `articles_<timestamp>.csv` under `out_dir`.
pub fn export_articles(articles: &[Article], out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("articles_{}.csv", Local::now().format("%Y%m%d_%H%M%S")));
    let mut rows = vec![ARTICLE_HEADER.iter().map(|s| s.to_string()).collect()];
    rows.extend(articles.iter().map(article_row));
    write_csv(&path, &rows)?;
    Ok(path)
}

/// Write the analysis metric/value rows to `analysis_<timestamp>.csv`.
pub fn export_analysis(analysis: &Analysis, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("analysis_{}.csv", Local::now().format("%Y%m%d_%H%M%S")));
    write_csv(&path, &analysis_rows(analysis))?;
    Ok(path)
}

fn article_row(article: &Article) -> Vec<String> {
    vec![
        article.title.clone(),
        article.url.clone(),
        article.author.clone(),
        article.publish_date.clone(),
        article.summary.clone(),
        article.word_count.to_string(),
        article.char_count.to_string(),
        formatted_content(article),
        top_words_line(&article.word_freq, 5),
    ]
}

/// Markdown-like rendering of one article: title, optional summary line,
/// then each section under its `##` heading.
fn formatted_content(article: &Article) -> String {
    let mut out = format!("# {}\n\n", article.title);
    if !article.summary.is_empty() {
        out.push_str(&format!("Summary: {}\n\n", article.summary));
    }
    for section in &article.sections {
        if !section.heading.is_empty() {
            out.push_str(&format!("## {}\n\n", section.heading));
        }
        out.push_str(&section.content);
        out.push_str("\n\n");
    }
    out
}

/// `word(count); word(count); ...` for the per-article column.
fn top_words_line(freq: &HashMap<String, usize>, n: usize) -> String {
    top_k(freq, n)
        .iter()
        .map(|(word, count)| format!("{}({})", word, count))
        .collect::<Vec<_>>()
        .join("; ")
}

fn analysis_rows(analysis: &Analysis) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = vec![
        vec!["Metric".into(), "Value".into()],
        vec!["Total Articles".into(), analysis.total_articles.to_string()],
        vec!["Total Words".into(), analysis.total_words.to_string()],
        vec!["Total Characters".into(), analysis.total_chars.to_string()],
        vec![
            "Average Words per Article".into(),
            format!("{:.2}", analysis.average_words),
        ],
        vec!["Longest Article".into(), analysis.longest_article.clone()],
        vec!["Shortest Article".into(), analysis.shortest_article.clone()],
        vec![String::new(), String::new()],
        vec!["Top 10 Most Common Words".into(), String::new()],
    ];
    for (i, (word, count)) in top_k(&analysis.common_words, 10).into_iter().enumerate() {
        rows.push(vec![
            format!("Word {}", i + 1),
            format!("{} ({} times)", word, count),
        ]);
    }
    rows
}

/// Minimal RFC 4180 writer: fields holding commas, quotes, or newlines are
/// quoted, embedded quotes doubled.
fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut out = String::new();
    for row in rows {
        let rendered: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&rendered.join(","));
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("write {}", path.display()))
}

fn csv_field(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ── Tests ──
