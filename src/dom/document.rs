//! Arena-backed mutable document tree.
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`]. Detaching a node
//! only unlinks it from its parent; the slot stays allocated until the
//! document is dropped, so ids collected before a mutation stay valid.
//!
//! # Cached accessors
//!
//! `html()`, `head()`, `body()` and `title()` memoize the first element they
//! find. The optimizer creates missing structure before the first lookup and
//! never replaces these four elements afterwards, so the cache cannot go stale
//! within one document's lifetime.

use std::cell::OnceCell;

use super::Attrs;

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Document root (holds doctype-level children such as `<html>`).
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tagged element payload.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Attrs,
    /// Set once an optimization pass processed the element.
    pub optimized: bool,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Root,
    Element(ElementData),
    /// Raw text as found in the source (entities not decoded).
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A parsed HTML document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    pub(crate) doctype: Option<String>,
    /// Raw source carried a `⚡` marker on the `<html>` tag.
    pub(crate) bolt_marker: bool,
    /// Set once the whole document went through the optimizer.
    pub optimized: bool,
    html: OnceCell<NodeId>,
    head: OnceCell<NodeId>,
    body: OnceCell<NodeId>,
    title: OnceCell<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
            doctype: None,
            bolt_marker: false,
            optimized: false,
            html: OnceCell::new(),
            head: OnceCell::new(),
            body: OnceCell::new(),
            title: OnceCell::new(),
        }
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    // =========================================================================
    // Node creation
    // =========================================================================

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_with(tag, Attrs::new())
    }

    pub fn create_element_with(&mut self, tag: &str, attrs: Attrs) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs,
            optimized: false,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    /// Copy a subtree into new, detached nodes.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.nodes[id.0].data.clone();
        let copy = self.push(data);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Copy a subtree of `other` into new, detached nodes of this document.
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.push(other.nodes[id.0].data.clone());
        for &child in &other.nodes[id.0].children {
            let child_copy = self.import(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // =========================================================================
    // Tree navigation
    // =========================================================================

    #[inline]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    #[inline]
    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0].data
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let pos = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, pos))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.index_in_parent(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.index_in_parent(id)?;
        pos.checked_sub(1).map(|p| self.children(parent)[p])
    }

    /// Ancestors from the parent up to (and including) the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// True when the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == NodeId::ROOT || self.ancestors(id).any(|a| a == NodeId::ROOT)
    }

    /// All descendants of `id` in document order (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Attached elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(NodeId::ROOT)
            .into_iter()
            .filter(|&id| self.element(id).is_some())
            .collect()
    }

    /// Attached elements whose tag is one of `tags`, in document order.
    pub fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(NodeId::ROOT)
            .into_iter()
            .filter(|&id| self.tag(id).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// First attached element with the given tag.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(NodeId::ROOT)
            .into_iter()
            .find(|&id| self.tag(id) == Some(tag))
    }

    /// Attached element carrying `id="<value>"`.
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(NodeId::ROOT)
            .into_iter()
            .find(|&id| self.attr(id, "id") == Some(value))
    }

    // =========================================================================
    // Element access
    // =========================================================================

    #[inline]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    #[inline]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attrs.get(name))
    }

    #[inline]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.attrs.has(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(e) = self.element_mut(id) {
            e.attrs.set(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.attrs.remove(name))
    }

    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Attrs> {
        self.element_mut(id).map(|e| &mut e.attrs)
    }

    pub fn is_optimized(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.optimized)
    }

    /// Mark an element and all its descendant elements as optimized.
    pub fn mark_optimized(&mut self, id: NodeId) {
        let mut targets = self.descendants(id);
        targets.push(id);
        for node in targets {
            if let Some(e) = self.element_mut(node) {
                e.optimized = true;
            }
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeData::Text(t) = self.data(node) {
                out.push_str(t);
            }
        }
        out
    }

    /// Replace all children with a single text node (none for empty text).
    pub fn set_text_content(&mut self, id: NodeId, text: impl Into<String>) {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        let text = text.into();
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Unlink a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some((parent, pos)) = self.index_in_parent(id) {
            self.nodes[parent.0].children.remove(pos);
        }
        self.nodes[id.0].parent = None;
    }

    fn would_cycle(&self, parent: NodeId, child: NodeId) -> bool {
        parent == child || self.ancestors(parent).any(|a| a == child)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.would_cycle(parent, child) {
            return;
        }
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        if self.would_cycle(parent, child) {
            return;
        }
        self.detach(child);
        self.nodes[parent.0].children.insert(0, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `node` right before `reference`. No-op if `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if self.would_cycle(parent, node) {
            return;
        }
        self.detach(node);
        if let Some((parent, pos)) = self.index_in_parent(reference) {
            self.nodes[parent.0].children.insert(pos, node);
            self.nodes[node.0].parent = Some(parent);
        }
    }

    /// Insert `node` right after `reference`. No-op if `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if self.would_cycle(parent, node) {
            return;
        }
        self.detach(node);
        if let Some((parent, pos)) = self.index_in_parent(reference) {
            self.nodes[parent.0].children.insert(pos + 1, node);
            self.nodes[node.0].parent = Some(parent);
        }
    }

    // =========================================================================
    // Cached structural lookups
    // =========================================================================

    fn cached(&self, cell: &OnceCell<NodeId>, tag: &str) -> Option<NodeId> {
        if let Some(&id) = cell.get() {
            return Some(id);
        }
        let found = self.find_first(tag)?;
        let _ = cell.set(found);
        Some(found)
    }

    /// The `<html>` element.
    pub fn html(&self) -> Option<NodeId> {
        self.cached(&self.html, "html")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.cached(&self.head, "head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.cached(&self.body, "body")
    }

    pub fn title(&self) -> Option<NodeId> {
        self.cached(&self.title, "title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.append_child(NodeId::ROOT, html);
        doc.append_child(html, head);
        doc.append_child(html, body);
        (doc, html, head, body)
    }

    #[test]
    fn test_append_and_detach() {
        let (mut doc, _, head, body) = skeleton();
        let img = doc.create_element("img");
        doc.append_child(body, img);
        assert!(doc.is_attached(img));
        assert_eq!(doc.parent(img), Some(body));

        doc.detach(img);
        assert!(!doc.is_attached(img));
        assert!(doc.children(body).is_empty());

        doc.append_child(head, img);
        assert_eq!(doc.children(head), &[img]);
    }

    #[test]
    fn test_insert_before_and_after() {
        let (mut doc, _, _, body) = skeleton();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(body, b);
        doc.insert_before(b, a);
        doc.insert_after(b, c);
        assert_eq!(doc.children(body), &[a, b, c]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.prev_sibling(a), None);

        // moving an attached node keeps a single copy
        doc.insert_after(c, a);
        assert_eq!(doc.children(body), &[b, c, a]);
    }

    #[test]
    fn test_no_cycles() {
        let (mut doc, html, _, body) = skeleton();
        doc.append_child(body, html);
        assert_eq!(doc.parent(html), Some(NodeId::ROOT));
    }

    #[test]
    fn test_deep_clone_is_detached_copy() {
        let (mut doc, _, _, body) = skeleton();
        let picture = doc.create_element("picture");
        let img = doc.create_element_with("img", Attrs::from([("src", "a.jpg")]));
        doc.append_child(picture, img);
        doc.append_child(body, picture);

        let copy = doc.deep_clone(picture);
        assert!(!doc.is_attached(copy));
        let copy_img = doc.children(copy)[0];
        doc.set_attr(copy_img, "src", "b.jpg");
        assert_eq!(doc.attr(img, "src"), Some("a.jpg"));
    }

    #[test]
    fn test_cached_lookups() {
        let (doc, html, head, body) = skeleton();
        assert_eq!(doc.html(), Some(html));
        assert_eq!(doc.head(), Some(head));
        assert_eq!(doc.body(), Some(body));
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_text_content() {
        let (mut doc, _, _, body) = skeleton();
        let p = doc.create_element("p");
        doc.append_child(body, p);
        doc.set_text_content(p, "hello");
        assert_eq!(doc.text_content(p), "hello");
        doc.set_text_content(p, "");
        assert!(doc.children(p).is_empty());
    }

    #[test]
    fn test_import_from_other_document() {
        let (mut other, _, _, body) = skeleton();
        let p = other.create_element("p");
        let text = other.create_text("splash");
        other.append_child(p, text);
        other.append_child(body, p);

        let (mut doc, _, _, target) = skeleton();
        let copy = doc.import(&other, p);
        assert!(!doc.is_attached(copy));
        doc.append_child(target, copy);
        assert_eq!(doc.tag(copy), Some("p"));
        assert_eq!(doc.text_content(copy), "splash");
    }
}
