use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::parser::article::Article;
use crate::parser::sections::Section;

const DB_PATH: &str = "data/blog.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            slug       TEXT NOT NULL,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            url        TEXT NOT NULL,
            slug       TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_slug ON page_data(slug);

        CREATE TABLE IF NOT EXISTS articles (
            url          TEXT PRIMARY KEY,
            title        TEXT NOT NULL,
            author       TEXT NOT NULL,
            publish_date TEXT NOT NULL,
            summary      TEXT NOT NULL,
            content      TEXT NOT NULL,
            word_count   INTEGER NOT NULL,
            char_count   INTEGER NOT NULL,
            processed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS article_sections (
            id          INTEGER PRIMARY KEY,
            article_url TEXT NOT NULL REFERENCES articles(url),
            position    INTEGER NOT NULL,
            heading     TEXT NOT NULL,
            content     TEXT NOT NULL,
            UNIQUE(article_url, position)
        );
        CREATE INDEX IF NOT EXISTS idx_sections_article ON article_sections(article_url);

        CREATE TABLE IF NOT EXISTS word_frequencies (
            article_url TEXT NOT NULL REFERENCES articles(url),
            word        TEXT NOT NULL,
            count       INTEGER NOT NULL,
            UNIQUE(article_url, word)
        );
        CREATE INDEX IF NOT EXISTS idx_word_freq_article ON word_frequencies(article_url);
        ",
    )?;
    Ok(())
}

// ── URL queue ──

pub fn insert_pages(conn: &Connection, pages: &[(String, String)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO pages (url, slug) VALUES (?1, ?2)")?;
        for (url, slug) in pages {
            count += stmt.execute(rusqlite::params![url, slug])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_unvisited(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<(i64, String, String)>> {
    let sql = match limit {
        Some(n) => format!(
            "SELECT id, url, slug FROM pages WHERE visited = 0 ORDER BY id LIMIT {}",
            n
        ),
        None => "SELECT id, url, slug FROM pages WHERE visited = 0 ORDER BY id".to_string(),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Fetching ──

pub struct FetchRow {
    pub page_id: i64,
    pub url: String,
    pub slug: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Processing ──

pub struct StoredPage {
    pub page_data_id: i64,
    pub slug: String,
    pub url: String,
    pub html: String,
}

pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<StoredPage>> {
    let sql = format!(
        "SELECT pd.id, pd.slug, pd.url, pd.html
         FROM page_data pd
         LEFT JOIN articles a ON a.url = pd.url
         WHERE pd.html IS NOT NULL AND a.url IS NULL
         ORDER BY pd.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredPage {
                page_data_id: row.get(0)?,
                slug: row.get(1)?,
                url: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Extracted articles ──

pub fn save_articles(conn: &Connection, articles: &[Article]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut a_stmt = tx.prepare(
            "INSERT OR REPLACE INTO articles
             (url, title, author, publish_date, summary, content, word_count, char_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        let mut s_del = tx.prepare("DELETE FROM article_sections WHERE article_url = ?1")?;
        let mut s_stmt = tx.prepare(
            "INSERT INTO article_sections (article_url, position, heading, content)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut w_del = tx.prepare("DELETE FROM word_frequencies WHERE article_url = ?1")?;
        let mut w_stmt = tx.prepare(
            "INSERT INTO word_frequencies (article_url, word, count) VALUES (?1, ?2, ?3)",
        )?;

        for article in articles {
            // Children first so replacing the parent row never dangles them.
            s_del.execute(rusqlite::params![article.url])?;
            w_del.execute(rusqlite::params![article.url])?;

            a_stmt.execute(rusqlite::params![
                article.url,
                article.title,
                article.author,
                article.publish_date,
                article.summary,
                article.content,
                article.word_count as i64,
                article.char_count as i64,
            ])?;

            for (position, section) in article.sections.iter().enumerate() {
                s_stmt.execute(rusqlite::params![
                    article.url,
                    position as i64,
                    section.heading,
                    section.content,
                ])?;
            }

            for (word, count) in &article.word_freq {
                w_stmt.execute(rusqlite::params![article.url, word, *count as i64])?;
            }
        }
    }
    tx.commit()?;
    Ok(())
}

/// Reassemble full articles (sections ordered by position, word frequencies
/// as a map) for reporting and export.
pub fn load_articles(conn: &Connection) -> Result<Vec<Article>> {
    let mut a_stmt = conn.prepare(
        "SELECT url, title, author, publish_date, summary, content, word_count, char_count
         FROM articles ORDER BY rowid",
    )?;
    let mut s_stmt = conn.prepare(
        "SELECT heading, content FROM article_sections
         WHERE article_url = ?1 ORDER BY position",
    )?;
    let mut w_stmt =
        conn.prepare("SELECT word, count FROM word_frequencies WHERE article_url = ?1")?;

    let shells = a_stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, i64>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut articles = Vec::with_capacity(shells.len());
    for (url, title, author, publish_date, summary, content, word_count, char_count) in shells {
        let sections = s_stmt
            .query_map([&url], |row| {
                Ok(Section {
                    heading: row.get(0)?,
                    content: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let word_freq = w_stmt
            .query_map([&url], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        articles.push(Article {
            url,
            title,
            author,
            publish_date,
            summary,
            sections,
            content,
            word_count: word_count as usize,
            char_count: char_count as usize,
            word_freq,
        });
    }
    Ok(articles)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub fetched: usize,
    pub errors: usize,
    pub processed: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let visited: usize =
        conn.query_row("SELECT COUNT(*) FROM pages WHERE visited = 1", [], |r| r.get(0))?;
    let fetched: usize = conn.query_row("SELECT COUNT(*) FROM page_data", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let processed: usize =
        conn.query_row("SELECT COUNT(*) FROM articles", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        visited,
        unvisited: total - visited,
        fetched,
        errors,
        processed,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_pages_ignores_duplicates() {
        let conn = test_conn();
        let pages = vec![
            ("https://example.com/a".to_string(), "a".to_string()),
            ("https://example.com/a".to_string(), "a".to_string()),
            ("https://example.com/b".to_string(), "b".to_string()),
        ];
        assert_eq!(insert_pages(&conn, &pages).unwrap(), 2);
        assert_eq!(fetch_unvisited(&conn, None).unwrap().len(), 2);
    }

    #[test]
    fn articles_round_trip() {
        let conn = test_conn();
        let article = Article {
            url: "https://example.com/post".into(),
            title: "Title".into(),
            author: "Author".into(),
            publish_date: "2024-01-01".into(),
            summary: "Sum".into(),
            sections: vec![
                Section { heading: "".into(), content: "lead".into() },
                Section { heading: "Next".into(), content: "body".into() },
            ],
            content: "lead\n\n## Next\n\nbody\n".into(),
            word_count: 2,
            char_count: 20,
            word_freq: HashMap::from([("lead".to_string(), 1), ("body".to_string(), 1)]),
        };
        save_articles(&conn, std::slice::from_ref(&article)).unwrap();

        let loaded = load_articles(&conn).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url, article.url);
        assert_eq!(loaded[0].sections, article.sections);
        assert_eq!(loaded[0].word_freq, article.word_freq);
        assert_eq!(loaded[0].word_count, 2);
    }

    #[test]
    fn reprocessing_replaces_children() {
        let conn = test_conn();
        let mut article = Article {
            url: "https://example.com/post".into(),
            title: "Title".into(),
            author: String::new(),
            publish_date: String::new(),
            summary: String::new(),
            sections: vec![
                Section { heading: "A".into(), content: "one".into() },
                Section { heading: "B".into(), content: "two".into() },
            ],
            content: String::new(),
            word_count: 2,
            char_count: 0,
            word_freq: HashMap::from([("one".to_string(), 1), ("two".to_string(), 1)]),
        };
        save_articles(&conn, std::slice::from_ref(&article)).unwrap();

        article.sections.truncate(1);
        article.word_freq = HashMap::from([("one".to_string(), 1)]);
        article.word_count = 1;
        save_articles(&conn, std::slice::from_ref(&article)).unwrap();

        let loaded = load_articles(&conn).unwrap();
        assert_eq!(loaded[0].sections.len(), 1);
        assert_eq!(loaded[0].word_freq.len(), 1);
    }
}
