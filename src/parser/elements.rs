use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static ARTICLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("article").unwrap());
static BODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static AUTHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".author").unwrap());
static DATE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time").unwrap());
static SUMMARY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".summary").unwrap());
static STREAM_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3, p").unwrap());

/// The only element kinds the section builder understands. Anything else on
/// the page never enters the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    HeadingMajor,
    HeadingMinor,
    Paragraph,
}

impl ElementKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h2" => Some(Self::HeadingMajor),
            "h3" => Some(Self::HeadingMinor),
            "p" => Some(Self::Paragraph),
            _ => None,
        }
    }
}

/// One tagged text fragment from the page body, in document order.
#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub text: String,
}

impl Element {
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Element {
            kind,
            text: text.into(),
        }
    }
}

/// Scalar fields located by selector, raw (un-normalized) text.
#[derive(Debug, Clone, Default)]
pub struct PageFields {
    pub title: String,
    pub author: String,
    pub publish_date: String,
    pub summary: String,
}

/// Parse a stored page into its scalar fields plus the ordered stream of
/// heading/paragraph elements. Pages without an `<article>` wrapper fall
/// back to the whole body.
pub fn parse_page(html: &str) -> (PageFields, Vec<Element>) {
    let document = Html::parse_document(html);

    let fields = PageFields {
        title: first_text(&document, &TITLE_SEL),
        author: first_text(&document, &AUTHOR_SEL),
        publish_date: first_text(&document, &DATE_SEL),
        summary: first_text(&document, &SUMMARY_SEL),
    };

    let root = document
        .select(&ARTICLE_SEL)
        .next()
        .or_else(|| document.select(&BODY_SEL).next());

    let mut elements = Vec::new();
    if let Some(root) = root {
        for el in root.select(&STREAM_SEL) {
            if let Some(kind) = ElementKind::from_tag(el.value().name()) {
                elements.push(Element::new(kind, collect_text(el)));
            }
        }
    }

    (fields, elements)
}

fn first_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(collect_text)
        .unwrap_or_default()
}

fn collect_text(el: ElementRef) -> String {
    el.text().collect::<String>()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <h1>Post Title</h1>
            <span class="author">Jane Doe</span>
            <time>2024-03-01</time>
            <p class="summary">A short summary.</p>
            <article>
                <h2>First</h2>
                <p>Opening paragraph.</p>
                <blockquote>Quoted aside.</blockquote>
                <h3>Detail</h3>
                <p>Closing <em>paragraph</em>.</p>
            </article>
        </body></html>
    "#;

    #[test]
    fn scalar_fields_by_selector() {
        let (fields, _) = parse_page(PAGE);
        assert_eq!(fields.title, "Post Title");
        assert_eq!(fields.author, "Jane Doe");
        assert_eq!(fields.publish_date, "2024-03-01");
        assert_eq!(fields.summary, "A short summary.");
    }

    #[test]
    fn stream_in_document_order() {
        let (_, elements) = parse_page(PAGE);
        let kinds: Vec<ElementKind> = elements.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::HeadingMajor,
                ElementKind::Paragraph,
                ElementKind::HeadingMinor,
                ElementKind::Paragraph,
            ]
        );
        assert_eq!(elements[0].text, "First");
        assert_eq!(elements[3].text, "Closing paragraph.");
    }

    #[test]
    fn unknown_tags_never_enter_stream() {
        let (_, elements) = parse_page("<article><h4>Deep</h4><ul><li>item</li></ul></article>");
        assert!(elements.is_empty());
    }

    #[test]
    fn body_fallback_without_article() {
        let (_, elements) = parse_page("<html><body><p>Loose paragraph.</p></body></html>");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "Loose paragraph.");
    }

    #[test]
    fn empty_page_yields_empty_stream() {
        let (fields, elements) = parse_page("");
        assert!(fields.title.is_empty());
        assert!(elements.is_empty());
    }
}
