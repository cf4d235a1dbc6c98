use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::FetchRow;

const CONCURRENCY: usize = 10;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch stats returned after completion.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch pages concurrently, saving each result to DB as it arrives. Failed
/// pages record their error and are still marked visited so the pipeline
/// moves on.
pub async fn fetch_pages_streaming(
    conn: &Connection,
    pages: Vec<(i64, String, String)>,
) -> Result<FetchStats> {
    let client = Arc::new(
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("blog_miner/", env!("CARGO_PKG_VERSION")))
            .build()?,
    );
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(CONCURRENCY * 2);

    for (page_id, url, slug) in pages {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = fetch_with_retry(&client, page_id, &url, &slug).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (page_id, url, slug, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut update_stmt = conn.prepare(
        "UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1",
    )?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }

        save_one(&mut insert_stmt, &mut update_stmt, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

/// Save a single fetch result to DB using pre-prepared statements.
fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &FetchRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.page_id, row.url, row.slug, row.html, row.status, row.error, row.latency_ms,
    ])?;
    update.execute(rusqlite::params![row.page_id])?;
    Ok(())
}

async fn fetch_with_retry(client: &Client, page_id: i64, url: &str, slug: &str) -> FetchRow {
    for attempt in 0..=MAX_RETRIES {
        let row = fetch_one(client, page_id, url, slug).await;

        if !should_retry(&row) || attempt == MAX_RETRIES {
            return row;
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Retryable status on {} (attempt {}/{}), backing off {:.1}s",
            slug,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }

    fetch_one(client, page_id, url, slug).await
}

/// Rate limits and transient upstream errors are worth another attempt;
/// anything else is recorded as-is.
fn should_retry(row: &FetchRow) -> bool {
    matches!(row.status, Some(429 | 500 | 502 | 503))
}

async fn fetch_one(client: &Client, page_id: i64, url: &str, slug: &str) -> FetchRow {
    let start = Instant::now();
    let mut row = FetchRow {
        page_id,
        url: url.to_string(),
        slug: slug.to_string(),
        html: None,
        status: None,
        error: None,
        latency_ms: None,
    };

    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            row.status = Some(status.as_u16() as i32);
            match response.text().await {
                Ok(body) if status.is_success() => row.html = Some(body),
                Ok(_) => row.error = Some(format!("HTTP {}", status.as_u16())),
                Err(e) => row.error = Some(e.to_string()),
            }
        }
        Err(e) => row.error = Some(e.to_string()),
    }

    row.latency_ms = Some(start.elapsed().as_millis() as i64);
    row
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: Option<i32>, error: Option<&str>) -> FetchRow {
        FetchRow {
            page_id: 1,
            url: "https://example.com".into(),
            slug: "example".into(),
            html: None,
            status,
            error: error.map(str::to_string),
            latency_ms: None,
        }
    }

    #[test]
    fn retries_rate_limits_and_transient_errors() {
        for status in [429, 500, 502, 503] {
            assert!(should_retry(&row(Some(status), Some("HTTP"))));
        }
    }

    #[test]
    fn does_not_retry_success_or_client_errors() {
        assert!(!should_retry(&row(Some(200), None)));
        assert!(!should_retry(&row(Some(404), Some("HTTP 404"))));
        assert!(!should_retry(&row(None, Some("connection refused"))));
    }
}
