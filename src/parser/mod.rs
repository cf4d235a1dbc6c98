pub mod article;
pub mod elements;
pub mod sections;
pub mod text;

use crate::db::StoredPage;
use article::Article;

/// Two-pass pipeline: html → element stream → extracted article.
pub fn process_page(page: &StoredPage) -> Article {
    let (fields, stream) = elements::parse_page(&page.html);
    article::extract(&page.url, &fields, &stream)
}
