use anyhow::{anyhow, Context, Result};
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

pub const DEFAULT_INDEX_URL: &str = "https://fly.io/blog/";

/// The index renders each post as a card whose whole surface is one
/// invisible stretched anchor.
pub const DEFAULT_LINK_SELECTOR: &str = "a.opacity-0.absolute.inset-0";

/// Fetch the blog index and return (url, slug) pairs for every article link.
pub async fn fetch_article_urls(index_url: &str, selector: &str) -> Result<Vec<(String, String)>> {
    let client = reqwest::Client::new();

    info!("Fetching blog index: {}", index_url);
    let html = client
        .get(index_url)
        .send()
        .await?
        .text()
        .await
        .context("Failed to fetch blog index")?;

    let pairs = extract_links(index_url, selector, &html)?;
    info!("Article links found: {}", pairs.len());
    Ok(pairs)
}

/// Pull article hrefs out of the index markup and absolutize them against
/// the index URL. Anchors without an href are skipped.
fn extract_links(index_url: &str, selector: &str, html: &str) -> Result<Vec<(String, String)>> {
    let base = Url::parse(index_url).context("Invalid index URL")?;
    let selector =
        Selector::parse(selector).map_err(|e| anyhow!("Invalid link selector: {}", e))?;
    let document = Html::parse_document(html);

    let mut pairs = Vec::new();
    for link in document.select(&selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(absolute) = base.join(href) else {
            continue;
        };
        let slug = slug_of(&absolute);
        pairs.push((absolute.into(), slug));
    }
    Ok(pairs)
}

fn slug_of(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("index")
        .to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
        <div class="card">
            <a class="opacity-0 absolute inset-0" href="/blog/first-post/"></a>
        </div>
        <div class="card">
            <a class="opacity-0 absolute inset-0" href="https://fly.io/blog/second-post/"></a>
        </div>
        <a href="/blog/not-a-card/">nav link</a>
        <a class="opacity-0 absolute inset-0">no href</a>
    "#;

    #[test]
    fn extracts_and_absolutizes_card_links() {
        let pairs = extract_links(DEFAULT_INDEX_URL, DEFAULT_LINK_SELECTOR, INDEX).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("https://fly.io/blog/first-post/".to_string(), "first-post".to_string()),
                ("https://fly.io/blog/second-post/".to_string(), "second-post".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_bad_selector() {
        assert!(extract_links(DEFAULT_INDEX_URL, "a[", "<a></a>").is_err());
    }

    #[test]
    fn slug_is_last_path_segment() {
        let url = Url::parse("https://fly.io/blog/some-post/").unwrap();
        assert_eq!(slug_of(&url), "some-post");
        let root = Url::parse("https://fly.io/").unwrap();
        assert_eq!(slug_of(&root), "index");
    }
}
