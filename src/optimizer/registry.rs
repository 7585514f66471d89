//! Per-document deduplication of resource hint links.
//!
//! A hint is identified by `rel|href|charset|media`. The first node
//! registered under a name wins; later nodes with the same name are detached.
//! The table must be reset between documents.

use rustc_hash::FxHashMap;

use crate::debug;
use crate::dom::{Document, NodeId};

/// `rel` values handled as resource hints.
pub const HINT_RELS: [&str; 5] = ["preconnect", "dns-prefetch", "preload", "prefetch", "modulepreload"];

pub fn is_hint_rel(rel: &str) -> bool {
    let rel = rel.trim();
    HINT_RELS.iter().any(|r| rel.eq_ignore_ascii_case(r))
}

#[derive(Debug, Default)]
pub struct PreloadRegistry {
    entries: FxHashMap<String, NodeId>,
}

impl PreloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical name of a `<link>` hint; `None` without `rel` or `href`.
    pub fn canonical_name(doc: &Document, id: NodeId) -> Option<String> {
        let rel = doc.attr(id, "rel")?.trim().to_ascii_lowercase();
        let href = doc.attr(id, "href")?.trim();
        if rel.is_empty() || href.is_empty() {
            return None;
        }
        let charset = doc.attr(id, "charset").unwrap_or_default().trim();
        let media = doc.attr(id, "media").unwrap_or_default().trim();
        Some(format!("{rel}|{href}|{charset}|{media}"))
    }

    /// Register `id` under its canonical name.
    ///
    /// Returns false (and detaches `id`) when another node already holds the
    /// name. Nodes without a name are never registered and stay in place.
    pub fn register(&mut self, doc: &mut Document, id: NodeId) -> bool {
        let Some(name) = Self::canonical_name(doc, id) else {
            return false;
        };
        match self.entries.get(&name) {
            Some(&held) if held != id => {
                debug!("registry"; "dropped duplicate hint {}", name);
                doc.detach(id);
                false
            }
            Some(_) => true,
            None => {
                self.entries.insert(name, id);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attrs;

    fn hint(doc: &mut Document, parent: NodeId, rel: &str, href: &str) -> NodeId {
        let id = doc.create_element_with("link", Attrs::from([("rel", rel), ("href", href)]));
        doc.append_child(parent, id);
        id
    }

    #[test]
    fn test_first_registration_wins() {
        let mut doc = Document::new();
        let head = doc.create_element("head");
        doc.append_child(NodeId::ROOT, head);
        let a = hint(&mut doc, head, "dns-prefetch", "https://cdn.test");
        let b = hint(&mut doc, head, "DNS-Prefetch", "https://cdn.test");

        let mut registry = PreloadRegistry::new();
        assert!(registry.register(&mut doc, a));
        assert!(registry.register(&mut doc, a));
        assert!(!registry.register(&mut doc, b));
        assert!(doc.is_attached(a));
        assert!(!doc.is_attached(b));
        assert_eq!(
            PreloadRegistry::canonical_name(&doc, b).as_deref(),
            Some("dns-prefetch|https://cdn.test||")
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_href_and_media_distinguish() {
        let mut doc = Document::new();
        let head = doc.create_element("head");
        doc.append_child(NodeId::ROOT, head);
        let a = hint(&mut doc, head, "preload", "/a.css");
        let b = hint(&mut doc, head, "preload", "/b.css");
        let c = hint(&mut doc, head, "preload", "/a.css");
        doc.set_attr(c, "media", "print");

        let mut registry = PreloadRegistry::new();
        assert!(registry.register(&mut doc, a));
        assert!(registry.register(&mut doc, b));
        assert!(registry.register(&mut doc, c));
        assert_eq!(registry.len(), 3);

        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unnamed_nodes_are_kept() {
        let mut doc = Document::new();
        let head = doc.create_element("head");
        doc.append_child(NodeId::ROOT, head);
        let a = hint(&mut doc, head, "preconnect", "");
        let mut registry = PreloadRegistry::new();
        assert!(!registry.register(&mut doc, a));
        assert!(doc.is_attached(a));
    }

    #[test]
    fn test_hint_rels() {
        assert!(is_hint_rel(" Preconnect "));
        assert!(!is_hint_rel("stylesheet"));
    }
}
