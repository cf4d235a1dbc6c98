use super::elements::{Element, ElementKind};
use super::text::normalize;

/// A titled span of article body. The heading is empty only for content
/// that precedes the first heading on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub content: String,
}

/// Fold the element stream into sections. A heading always opens a fresh
/// section, even directly after another heading; paragraphs append to the
/// open section with a blank-line separator, or open a headingless one when
/// no section exists yet. Paragraphs that normalize to nothing are skipped.
pub fn build_sections(elements: &[Element]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();

    for element in elements {
        match element.kind {
            ElementKind::HeadingMajor | ElementKind::HeadingMinor => {
                sections.push(Section {
                    heading: normalize(&element.text),
                    content: String::new(),
                });
            }
            ElementKind::Paragraph => {
                let text = normalize(&element.text);
                if text.is_empty() {
                    continue;
                }
                match sections.last_mut() {
                    Some(open) => {
                        if !open.content.is_empty() {
                            open.content.push_str("\n\n");
                        }
                        open.content.push_str(&text);
                    }
                    None => sections.push(Section {
                        heading: String::new(),
                        content: text,
                    }),
                }
            }
        }
    }

    sections
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn major(text: &str) -> Element {
        Element::new(ElementKind::HeadingMajor, text)
    }

    fn minor(text: &str) -> Element {
        Element::new(ElementKind::HeadingMinor, text)
    }

    fn para(text: &str) -> Element {
        Element::new(ElementKind::Paragraph, text)
    }

    #[test]
    fn headings_open_sections_and_paragraphs_fill_them() {
        let sections = build_sections(&[
            minor("Intro"),
            para("Hello"),
            major("Body"),
            para("World"),
            para("More"),
        ]);
        assert_eq!(
            sections,
            vec![
                Section { heading: "Intro".into(), content: "Hello".into() },
                Section { heading: "Body".into(), content: "World\n\nMore".into() },
            ]
        );
    }

    #[test]
    fn leading_paragraph_gets_headingless_section() {
        let sections = build_sections(&[para("Lead")]);
        assert_eq!(
            sections,
            vec![Section { heading: "".into(), content: "Lead".into() }]
        );
    }

    #[test]
    fn consecutive_headings_produce_empty_sections() {
        let sections = build_sections(&[major("One"), major("Two"), para("text")]);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "One");
        assert!(sections[0].content.is_empty());
        assert_eq!(sections[1].content, "text");
    }

    #[test]
    fn blank_paragraphs_are_skipped() {
        let sections = build_sections(&[major("Head"), para("  \n\t "), para("kept")]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "kept");
    }

    #[test]
    fn heading_text_is_normalized() {
        let sections = build_sections(&[major("  Spaced\t©Out  ")]);
        assert_eq!(sections[0].heading, "Spaced Out");
    }

    #[test]
    fn empty_stream_yields_no_sections() {
        assert!(build_sections(&[]).is_empty());
    }
}
