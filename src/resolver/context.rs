//! Per-document state shared by the resolvers of one optimization pass.

use super::{marker, url};
use crate::config::{LazyloadRules, Options};
use crate::dom::{Attrs, Document, NodeId};
use crate::optimizer::PreloadRegistry;

pub struct Context<'a> {
    pub doc: &'a mut Document,
    pub options: &'a Options,
    pub rules: &'a LazyloadRules,
    /// Host the document is served from; empty when unknown.
    pub site_host: &'a str,
    pub registry: PreloadRegistry,
    /// Last meta moved to the top of `<head>`.
    pub(crate) meta_anchor: Option<NodeId>,
    debug_seq: usize,
}

impl<'a> Context<'a> {
    pub fn new(
        doc: &'a mut Document,
        options: &'a Options,
        rules: &'a LazyloadRules,
        site_host: &'a str,
    ) -> Self {
        Self {
            doc,
            options,
            rules,
            site_host,
            registry: PreloadRegistry::new(),
            meta_anchor: None,
            debug_seq: 0,
        }
    }

    pub fn is_external(&self, value: &str) -> bool {
        url::is_external(value, self.site_host)
    }

    /// Host matches the third-party table (and `defer_third_party` is on).
    pub fn is_third_party(&self, value: &str) -> bool {
        url::host(value).is_some_and(|h| self.options.defer_third_party.matches_host(&h))
    }

    /// Create a detached `<link rel=... href=...>` hint.
    pub fn create_hint(&mut self, rel: &str, href: &str, extra: &[(&str, &str)]) -> NodeId {
        let mut attrs = Attrs::from([("rel", rel), ("href", href)]);
        for (name, value) in extra {
            attrs.set(name, *value);
        }
        let id = self.doc.create_element_with("link", attrs);
        self.doc.mark_optimized(id);
        id
    }

    /// Register a hint and place it right before `<title>`.
    ///
    /// Duplicates are dropped. Returns whether the node stayed in the tree.
    pub fn place_hint(&mut self, id: NodeId) -> bool {
        if !self.registry.register(self.doc, id) {
            return false;
        }
        match (self.doc.title(), self.doc.head()) {
            (Some(title), _) if self.doc.is_attached(title) => self.doc.insert_before(title, id),
            (_, Some(head)) => self.doc.append_child(head, id),
            _ => return false,
        }
        true
    }

    pub(crate) fn next_debug_id(&mut self) -> usize {
        self.debug_seq += 1;
        self.debug_seq
    }

    /// Element bears the injected-loader id.
    pub fn is_injected(&self, id: NodeId) -> bool {
        self.doc
            .attr(id, "id")
            .is_some_and(|v| marker::INJECTED_IDS.contains(&v))
    }
}
