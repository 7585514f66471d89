//! Document-level fixes that are not tied to one element.

use crate::dom::{Attrs, Document, NodeData, NodeId, parse_document};
use crate::resolver::marker;
use crate::utils::html::{is_block_element, is_whitespace_sensitive};

use super::OptimizeError;

/// Structural elements resolved by [`normalize`].
#[derive(Debug, Clone, Copy)]
pub struct Skeleton {
    pub html: NodeId,
    pub head: NodeId,
    pub body: NodeId,
}

/// Ensure `<head>`, `<body>` and `<title>` exist, drop a previous loader
/// injection and mark `<html>` as not yet handled by the runtime.
pub fn normalize(doc: &mut Document) -> Result<Skeleton, OptimizeError> {
    let html = doc.html().ok_or(OptimizeError::NotADocument)?;

    for id in marker::INJECTED_IDS {
        while let Some(node) = doc.element_by_id(id) {
            doc.detach(node);
        }
    }

    if doc.head().is_none() {
        let head = doc.create_element("head");
        doc.prepend_child(html, head);
    }
    let head = doc.head().ok_or(OptimizeError::MissingStructure("head"))?;

    if doc.body().is_none() {
        let body = doc.create_element("body");
        let stray: Vec<NodeId> = doc
            .children(html)
            .iter()
            .copied()
            .filter(|&c| c != head)
            .collect();
        doc.append_child(html, body);
        for node in stray {
            doc.append_child(body, node);
        }
    }
    let body = doc.body().ok_or(OptimizeError::MissingStructure("body"))?;

    if doc.title().is_none() {
        let title = doc.create_element("title");
        doc.append_child(head, title);
    }

    if let Some(attrs) = doc.attrs_mut(html) {
        attrs.add_class(marker::NO_LOADER_CLASS);
    }

    Ok(Skeleton { html, head, body })
}

/// `<html amp>`, `<html ⚡>` or a bolt marker in the raw source.
pub fn is_amp(doc: &Document, html: NodeId) -> bool {
    doc.has_attr(html, "amp") || doc.has_attr(html, "⚡") || doc.bolt_marker
}

/// Prepend the custom splash screen to `<body>`, once.
pub fn add_splash_screen(doc: &mut Document, body: NodeId, markup: &str) {
    let markup = markup.trim();
    if markup.is_empty() {
        return;
    }
    let exists = doc
        .child_elements(body)
        .next()
        .and_then(|first| doc.attr(first, "class"))
        .is_some_and(|c| c.split_ascii_whitespace().any(|c| c == marker::SPLASH_CLASS));
    if exists {
        return;
    }

    let Ok(fragment) = parse_document(&format!("<html><body>{markup}</body></html>")) else {
        return;
    };
    let Some(source) = fragment.body() else {
        return;
    };
    let wrapper = doc.create_element_with("div", Attrs::from([("class", marker::SPLASH_CLASS)]));
    for &child in fragment.children(source) {
        let copy = doc.import(&fragment, child);
        doc.append_child(wrapper, copy);
    }
    doc.prepend_child(body, wrapper);
}

/// Add `charset`, `viewport` and compatibility metas that are missing.
///
/// They land at the top of `<head>` in that order, after an existing
/// `charset` meta.
pub fn add_missing_metas(doc: &mut Document, head: NodeId) {
    let metas = doc.elements_by_tag(&["meta"]);
    let charset = metas.iter().copied().find(|&m| doc.has_attr(m, "charset"));
    let has_meta = |name: &str, value: &str| {
        metas.iter().any(|&m| {
            doc.attr(m, name)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(value))
        })
    };
    let needs_viewport = !has_meta("name", "viewport");
    let needs_compat = !has_meta("http-equiv", "x-ua-compatible");

    let mut anchor = charset.filter(|&c| doc.parent(c) == Some(head));
    if charset.is_none() {
        let meta = doc.create_element_with("meta", Attrs::from([("charset", "utf-8")]));
        doc.prepend_child(head, meta);
        anchor = Some(meta);
    }

    let mut missing = Vec::new();
    if needs_viewport {
        missing.push(Attrs::from([
            ("name", "viewport"),
            ("content", "width=device-width,initial-scale=1"),
        ]));
    }
    if needs_compat {
        missing.push(Attrs::from([
            ("http-equiv", "X-UA-Compatible"),
            ("content", "IE=edge"),
        ]));
    }
    for attrs in missing {
        let meta = doc.create_element_with("meta", attrs);
        match anchor {
            Some(a) => doc.insert_after(a, meta),
            None => doc.prepend_child(head, meta),
        }
        anchor = Some(meta);
    }
}

/// Collapse insignificant whitespace in text nodes.
///
/// A single space survives at an edge when the neighbour on that side is
/// inline content, so words never run together.
pub fn minify_whitespace(doc: &mut Document) {
    let texts: Vec<NodeId> = doc
        .descendants(NodeId::ROOT)
        .into_iter()
        .filter(|&id| matches!(doc.data(id), NodeData::Text(_)))
        .collect();

    for id in texts {
        if inside_sensitive(doc, id) {
            continue;
        }
        let NodeData::Text(raw) = doc.data(id) else {
            continue;
        };
        let collapsed = collapse(raw);
        let keep_lead = collapsed.starts_with(' ') && inline_neighbour(doc, id, Side::Before);
        let keep_trail = collapsed.ends_with(' ') && inline_neighbour(doc, id, Side::After);

        let core = collapsed.trim();
        let value = if core.is_empty() {
            if keep_lead && keep_trail { " ".to_string() } else { String::new() }
        } else {
            let mut out = String::with_capacity(core.len() + 2);
            if keep_lead {
                out.push(' ');
            }
            out.push_str(core);
            if keep_trail {
                out.push(' ');
            }
            out
        };

        if value.is_empty() {
            doc.detach(id);
        } else if let NodeData::Text(text) = doc.data_mut(id)
            && *text != value
        {
            *text = value;
        }
    }
}

fn collapse(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn inside_sensitive(doc: &Document, id: NodeId) -> bool {
    doc.ancestors(id)
        .any(|a| doc.tag(a).is_some_and(is_whitespace_sensitive))
}

#[derive(Clone, Copy)]
enum Side {
    Before,
    After,
}

/// Whether the content next to `id` on `side` flows inline with it.
fn inline_neighbour(doc: &Document, id: NodeId, side: Side) -> bool {
    let sibling = match side {
        Side::Before => doc.prev_sibling(id),
        Side::After => doc.next_sibling(id),
    };
    match sibling {
        Some(s) => match doc.data(s) {
            NodeData::Element(e) => !is_block_element(&e.tag),
            _ => true,
        },
        None => doc
            .parent(id)
            .and_then(|p| doc.tag(p))
            .is_some_and(|tag| !is_block_element(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_creates_structure() {
        let mut doc = parse_document("<html><p>x</p></html>").unwrap();
        let sk = normalize(&mut doc).unwrap();
        assert_eq!(doc.tag(sk.head), Some("head"));
        assert_eq!(doc.parent(sk.body), Some(sk.html));
        assert!(doc.title().is_some());
        assert_eq!(
            doc.serialize(),
            r#"<html class="no-deferjs"><head><title></title></head><body><p>x</p></body></html>"#
        );
    }

    #[test]
    fn test_normalize_removes_previous_injection() {
        let mut doc = parse_document(
            r#"<html><head><script id="defer-js">x</script><style id="defer-css"></style></head><body></body></html>"#,
        )
        .unwrap();
        normalize(&mut doc).unwrap();
        assert!(doc.element_by_id("defer-js").is_none());
        assert!(doc.element_by_id("defer-css").is_none());
    }

    #[test]
    fn test_missing_metas_order() {
        let mut doc =
            parse_document(r#"<html><head><meta name="viewport" content="a"></head><body></body></html>"#)
                .unwrap();
        let sk = normalize(&mut doc).unwrap();
        add_missing_metas(&mut doc, sk.head);
        let head = doc.inner_html(sk.head);
        let charset = head.find("charset").unwrap();
        let compat = head.find("X-UA-Compatible").unwrap();
        let viewport = head.find("viewport").unwrap();
        assert!(charset < compat);
        assert_eq!(head.matches("viewport").count(), 1);
        assert!(viewport > 0);
    }

    #[test]
    fn test_missing_metas_after_existing_charset() {
        let mut doc = parse_document(
            r#"<html><head><meta charset="utf-8"><title>t</title></head><body></body></html>"#,
        )
        .unwrap();
        let sk = normalize(&mut doc).unwrap();
        add_missing_metas(&mut doc, sk.head);
        let head = doc.inner_html(sk.head);
        assert!(head.starts_with(r#"<meta charset="utf-8"><meta name="viewport""#));
        assert!(head.contains(r#"<meta http-equiv="X-UA-Compatible" content="IE=edge"><title>"#));
    }

    #[test]
    fn test_minify_whitespace() {
        let mut doc = parse_document(
            "<html><head>\n  <title> t </title>\n</head><body>\n  <p>a  <b>b</b>\n c</p>\n  <pre> x  y </pre>\n</body></html>",
        )
        .unwrap();
        minify_whitespace(&mut doc);
        assert_eq!(
            doc.serialize(),
            "<html><head><title>t</title></head><body><p>a <b>b</b> c</p><pre> x  y </pre></body></html>"
        );
    }

    #[test]
    fn test_splash_screen_once() {
        let mut doc = parse_document("<html><body><p>x</p></body></html>").unwrap();
        let sk = normalize(&mut doc).unwrap();
        add_splash_screen(&mut doc, sk.body, "<div>loading</div>");
        add_splash_screen(&mut doc, sk.body, "<div>loading</div>");
        let body = doc.inner_html(sk.body);
        assert_eq!(body.matches("defer-splash").count(), 1);
        assert!(body.starts_with(r#"<div class="defer-splash"><div>loading</div></div>"#));
    }

    #[test]
    fn test_amp_detection() {
        let doc = parse_document("<html amp><body></body></html>").unwrap();
        assert!(is_amp(&doc, doc.html().unwrap()));
        let doc = parse_document("<html><body></body></html>").unwrap();
        assert!(!is_amp(&doc, doc.html().unwrap()));
    }
}
