//! CSS selector queries.
//!
//! Selectors are parsed and matched by `scraper`. The arena is serialized
//! with a position attribute on every element, reparsed, and matches are
//! mapped back through that attribute, so the full selector syntax
//! (pseudo-classes, sibling combinators, `:not(..)`) works against the
//! arena without a second tree model.

use scraper::{Html, Selector};

use super::{Document, NodeId};

/// Position attribute carried only by the reparsed copy.
const POSITION_ATTR: &str = "data-deferhtml-pos";

/// Parse a selector list. Errors are rendered to text because scraper's
/// error type borrows the input.
pub fn parse_selector(input: &str) -> Result<Selector, String> {
    Selector::parse(input).map_err(|e| e.to_string())
}

impl Document {
    /// Attached elements matched by any of `selectors`, in document order.
    ///
    /// Matching follows HTML tree construction, so markup the parser would
    /// restructure is matched in its restructured shape.
    pub fn select_all(&self, selectors: &[Selector]) -> Vec<NodeId> {
        if selectors.is_empty() {
            return Vec::new();
        }
        let elements = self.elements();
        let html = Html::parse_document(&self.serialize_marked(POSITION_ATTR, &elements));

        let mut positions: Vec<usize> = selectors
            .iter()
            .flat_map(|selector| html.select(selector))
            .filter_map(|el| el.value().attr(POSITION_ATTR)?.parse().ok())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
            .into_iter()
            .filter_map(|pos| elements.get(pos).copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    fn tags(doc: &Document, selector: &str) -> Vec<String> {
        let selector = parse_selector(selector).unwrap();
        doc.select_all(&[selector])
            .into_iter()
            .map(|id| doc.outer_html(id))
            .collect()
    }

    #[test]
    fn test_descendant_and_child() {
        let doc = parse_document(
            r#"<html><head></head><body><div class="hero"><p><img src="a"></p><img src="b"></div><img src="c"></body></html>"#,
        )
        .unwrap();
        assert_eq!(tags(&doc, ".hero img"), [r#"<img src="a">"#, r#"<img src="b">"#]);
        assert_eq!(tags(&doc, ".hero > img"), [r#"<img src="b">"#]);
    }

    #[test]
    fn test_pseudo_classes_and_siblings() {
        let doc = parse_document(
            r#"<html><head></head><body><img class="lazy" src="a"><img src="b"><span></span><img src="c"></body></html>"#,
        )
        .unwrap();
        assert_eq!(tags(&doc, "img:not(.lazy)"), [r#"<img src="b">"#, r#"<img src="c">"#]);
        assert_eq!(tags(&doc, "span + img"), [r#"<img src="c">"#]);
        assert_eq!(tags(&doc, "img:first-child"), [r#"<img class="lazy" src="a">"#]);
    }

    #[test]
    fn test_lists_are_deduplicated_in_document_order() {
        let doc = parse_document(
            r#"<html><head></head><body><img id="x" src="a"><iframe src="f"></iframe></body></html>"#,
        )
        .unwrap();
        let list = [parse_selector("iframe").unwrap(), parse_selector("#x, img").unwrap()];
        let found: Vec<_> = doc
            .select_all(&list)
            .into_iter()
            .map(|id| doc.tag(id).unwrap().to_string())
            .collect();
        assert_eq!(found, ["img", "iframe"]);
        // the position attribute never reaches the arena
        assert!(!doc.serialize().contains(POSITION_ATTR));
    }

    #[test]
    fn test_detached_elements_never_match() {
        let mut doc = parse_document(
            r#"<html><head></head><body><img src="a"><img src="b"></body></html>"#,
        )
        .unwrap();
        let first = doc.find_first("img").unwrap();
        doc.detach(first);
        assert_eq!(tags(&doc, "img"), [r#"<img src="b">"#]);
    }

    #[test]
    fn test_invalid_selector() {
        assert!(parse_selector("img[").is_err());
        assert!(parse_selector("").is_err());
    }
}
