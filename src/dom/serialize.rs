//! Document serialization back to markup.

use rustc_hash::FxHashMap;

use super::{Document, NodeData, NodeId};
use crate::utils::html::{escape_attr, escape_comment, is_void_element};

/// Extra attribute written on selected elements, `attr="<position>"`.
type Marks<'a> = Option<(&'a str, &'a FxHashMap<NodeId, usize>)>;

impl Document {
    /// Serialize the whole document, doctype included.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.len_hint());
        if let Some(doctype) = self.doctype() {
            out.push_str(doctype);
        }
        for &child in self.children(NodeId::ROOT) {
            self.write_node(child, &mut out, None);
        }
        out
    }

    /// Like [`serialize`](Self::serialize), but every node in `ids` carries
    /// `attr` set to its position in `ids`.
    pub(super) fn serialize_marked(&self, attr: &str, ids: &[NodeId]) -> String {
        let positions: FxHashMap<NodeId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let mut out = String::with_capacity(self.len_hint());
        for &child in self.children(NodeId::ROOT) {
            self.write_node(child, &mut out, Some((attr, &positions)));
        }
        out
    }

    /// Markup of a node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out, None);
        out
    }

    /// Markup of a node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out, None);
        }
        out
    }

    fn len_hint(&self) -> usize {
        self.children(NodeId::ROOT).len() * 1024
    }

    fn write_node(&self, id: NodeId, out: &mut String, marks: Marks<'_>) {
        match self.data(id) {
            NodeData::Root => {
                for &child in self.children(id) {
                    self.write_node(child, out, marks);
                }
            }
            NodeData::Element(elem) => {
                out.push('<');
                out.push_str(&elem.tag);
                for (name, value) in elem.attrs.iter() {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attr(value));
                        out.push('"');
                    }
                }
                if let Some((attr, positions)) = marks
                    && let Some(pos) = positions.get(&id)
                {
                    out.push_str(&format!(" {attr}=\"{pos}\""));
                }
                out.push('>');

                if is_void_element(&elem.tag) {
                    return;
                }

                for &child in self.children(id) {
                    self.write_node(child, out, marks);
                }

                out.push_str("</");
                out.push_str(&elem.tag);
                out.push('>');
            }
            // Text keeps its source escaping, raw text elements included.
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(&escape_comment(text));
                out.push_str("-->");
            }
        }
    }
}
